use std::path::Path;

use anyhow::Context;
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
};

/// Multipart field that carries the image.
pub const IMAGE_FIELD: &str = "image";
const IMAGES_DIR: &str = "images";

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(upload_image))
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadImageForm {
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadImageRes {
    /// Path to store as an item's `image_path`.
    pub filepath: String,
}

/// Store an item image under the upload directory.
#[utoipa::path(
    post,
    path = "/upload",
    tags = ["Uploads"],
    request_body(content = UploadImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = StdResponse<UploadImageRes, String>),
        (status = 400, description = "No image in the form")
    )
)]
async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let extension = field.file_name().map(image_extension).unwrap_or_default();
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(AppError::BadRequest("image is empty".into()));
        }

        let dir = state.upload_dir.join(IMAGES_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = dir.join(format!("{}{}", nanos, extension));
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(path = %path.display(), bytes = data.len(), "Stored uploaded image");

        return Ok(StdResponse {
            data: Some(UploadImageRes {
                filepath: path.to_string_lossy().into_owned(),
            }),
            message: Some("Uploaded image successfully"),
        });
    }

    Err(AppError::BadRequest(format!(
        "{} field is required",
        IMAGE_FIELD
    )))
}

/// Extension of the client's file name, lowercased with a leading dot. Only
/// short alphanumeric extensions are kept so the stored name stays inside
/// the images directory.
fn image_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_simple_extensions() {
        assert_eq!(image_extension("margherita.PNG"), ".png");
        assert_eq!(image_extension("photo.final.jpeg"), ".jpeg");
    }

    #[test]
    fn drops_missing_or_odd_extensions() {
        assert_eq!(image_extension("README"), "");
        assert_eq!(image_extension("evil.p/ng"), "");
        assert_eq!(image_extension("archive.tar gz"), "");
        assert_eq!(image_extension("x.verylongextension"), "");
    }
}
