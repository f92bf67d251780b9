//! File handlers: multipart upload into the object store and streamed fetch

use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;

use super::multipart::{FormField, MultipartForm};
use crate::error::{AppError, Result};
use crate::http::body::BoxError;
use crate::http::response::OCTET_STREAM;
use crate::http::{build_stream_response, build_text_response, json_response, ResponseBody};
use crate::logger;
use crate::storage::ObjectStore;

/// Form field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

pub const FILE_NOT_FOUND_MESSAGE: &str = "Archivo no encontrado";

#[derive(Debug, Serialize)]
struct UploadResponse {
    ok: bool,
    name: String,
}

/// `POST /upload`
///
/// The first part named `file` decides the outcome; parts before it are skipped.
pub async fn upload_file<B>(req: Request<B>, objects: &dyn ObjectStore) -> Result<Response<ResponseBody>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();
    let mut form = MultipartForm::from_request(&parts.headers, body)?;

    while let Some(field) = form.next_field().await? {
        if field.name() != FILE_FIELD {
            continue;
        }

        return match field {
            FormField::File {
                file_name,
                content_type,
                body,
                ..
            } if !file_name.is_empty() => {
                let size = objects.put(&file_name, content_type, body).await?;
                logger::log_info(&format!("[Upload] Stored '{file_name}' ({size} bytes)"));
                Ok(json_response(
                    StatusCode::OK,
                    &UploadResponse {
                        ok: true,
                        name: file_name,
                    },
                ))
            }
            _ => Err(AppError::InvalidUpload),
        };
    }

    Err(AppError::InvalidUpload)
}

/// `GET /files/<key>`; `key` is used verbatim
pub async fn fetch_file(key: &str, objects: &dyn ObjectStore) -> Result<Response<ResponseBody>> {
    match objects.get(key).await? {
        Some(object) => {
            let content_type = object
                .metadata
                .content_type
                .as_deref()
                .unwrap_or(OCTET_STREAM);
            Ok(build_stream_response(content_type, object.body))
        }
        None => Ok(build_text_response(
            StatusCode::NOT_FOUND,
            FILE_NOT_FOUND_MESSAGE,
        )),
    }
}
