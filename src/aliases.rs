use diesel_async::{AsyncPgConnection, pooled_connection::bb8};

pub type DieselError = diesel::result::Error;

/// Pool of async Postgres connections shared through `AppState`.
pub type DbPool = bb8::Pool<AsyncPgConnection>;
