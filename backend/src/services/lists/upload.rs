use crate::error::ApiError;
use crate::pipeline::UploadError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::responses::UploadReport;
use futures_util::StreamExt;

/// `POST /api/lists/upload`
pub(crate) async fn process(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let (filename, bytes) = read_file_field(&state, payload).await?;

    let uploads = state.uploads.clone();
    let outcome = web::block(move || uploads.upload_and_distribute(&filename, &bytes)).await??;

    Ok(HttpResponse::Ok().json(UploadReport {
        message: "File uploaded and distributed successfully".to_string(),
        total_records: outcome.total_records,
        distributed_records: outcome.distributed_records,
        batch_id: outcome.batch_id.into(),
    }))
}

/// Streams the `file` part into memory, rejecting it as soon as its
/// extension or its running size is unacceptable. Other parts are drained.
async fn read_file_field(
    state: &AppState,
    mut payload: Multipart,
) -> Result<(String, Vec<u8>), ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") if upload.is_none() => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                state.uploads.check_format(&filename)?;

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk =
                        chunk.map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;
                    state.uploads.check_size(bytes.len() + chunk.len())?;
                    bytes.extend_from_slice(&chunk);
                }
                upload = Some((filename, bytes));
            }
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;
                }
            }
        }
    }

    upload.ok_or_else(|| UploadError::MissingFile.into())
}
