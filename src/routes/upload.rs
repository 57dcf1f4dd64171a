use axum::{
    extract::{multipart::MultipartRejection, Multipart},
    routing::post,
    Router,
    Json,
    http::Method,
};
use bytes::Bytes;
use crate::{
    error::AppError,
    models::SheetResult,
    services::excel::ExcelProcessor,
};
use tower_http::cors::{CorsLayer, Any};

/// Multipart field carrying the workbook.
const FILE_FIELD: &str = "file";

pub fn routes() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/upload", post(upload_file))
        .layer(cors)
}

struct UploadedFile {
    file_name: String,
    data: Bytes,
}

/// Pulls the first `file` part that carries a filename; other parts are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let is_file = field.name() == Some(FILE_FIELD) && field.file_name().is_some();
        if !is_file {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        return Ok(Some(UploadedFile { file_name, data }));
    }

    Ok(None)
}

async fn upload_file(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<SheetResult>>, AppError> {
    let start = std::time::Instant::now();

    // Non-multipart requests simply have no file.
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!("Upload is not multipart: {}", rejection);
        AppError::MissingFile
    })?;

    let upload = read_upload(multipart).await?.ok_or(AppError::MissingFile)?;
    tracing::info!(
        "Received file {} ({}KB)",
        upload.file_name,
        upload.data.len() / 1024
    );

    let data = tokio::task::spawn_blocking(move || ExcelProcessor.process_file(upload.data)).await??;

    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!(
            "Processed data: {}",
            serde_json::to_string_pretty(&data).unwrap_or_default()
        );
    }
    tracing::info!("Upload processed in {:?}", start.elapsed());

    Ok(Json(data))
}
