use std::path::PathBuf;

use bigdecimal::BigDecimal;

use crate::aliases::DbPool;

/// State shared by every handler. Built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub tax_rate: BigDecimal,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(db_pool: DbPool, tax_rate: BigDecimal, upload_dir: PathBuf) -> Self {
        Self {
            db_pool,
            tax_rate,
            upload_dir,
        }
    }
}
