//! Multipart form parsing
//!
//! Every part of a `multipart/form-data` body is either a plain text field or
//! a file part (one that carries a `filename`). Handlers match on
//! [`FormField`] instead of probing the value type.

use futures::TryStreamExt;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_TYPE};

use crate::error::Result;
use crate::http::body::{data_stream, BoxError};
use crate::storage::ByteStream;

pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        body: ByteStream,
    },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

impl std::fmt::Debug for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            Self::File {
                name,
                file_name,
                content_type,
                ..
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("content_type", content_type)
                .finish_non_exhaustive(),
        }
    }
}

/// Streaming reader over the parts of a multipart request body
pub struct MultipartForm {
    inner: multer::Multipart<'static>,
}

impl MultipartForm {
    /// Fails when `Content-Type` is missing, not multipart, or has no boundary
    pub fn from_request<B>(headers: &HeaderMap, body: B) -> Result<Self>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let boundary = multer::parse_boundary(content_type)?;
        Ok(Self {
            inner: multer::Multipart::new(data_stream(body), boundary),
        })
    }

    /// Next part of the form. A file part must be consumed (or dropped) before
    /// the following call.
    pub async fn next_field(&mut self) -> Result<Option<FormField>> {
        let Some(field) = self.inner.next_field().await? else {
            return Ok(None);
        };

        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(ToString::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(ToString::to_string);
                Ok(Some(FormField::File {
                    name,
                    file_name,
                    content_type,
                    body: Box::pin(field.map_err(std::io::Error::other)),
                }))
            }
            None => {
                let value = field.text().await?;
                Ok(Some(FormField::Text { name, value }))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use http_body_util::Full;
    use hyper::header::HeaderValue;

    pub(crate) const BOUNDARY: &str = "X-BLOG-BOUNDARY";

    /// Build a multipart body; `(name, Some((file_name, content_type)), data)` makes a file part
    pub(crate) fn multipart_body(parts: &[(&str, Option<(&str, Option<&str>)>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((file_name, content_type)) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                        )
                        .as_bytes(),
                    );
                    if let Some(ct) = content_type {
                        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
                    }
                }
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub(crate) fn multipart_content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    fn form(body: Vec<u8>) -> MultipartForm {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&multipart_content_type()).unwrap(),
        );
        MultipartForm::from_request(&headers, Full::new(Bytes::from(body))).unwrap()
    }

    #[tokio::test]
    async fn test_text_and_file_parts() {
        let body = multipart_body(&[
            ("caption", None, b"hello"),
            ("file", Some(("a.png", Some("image/png"))), b"\x89PNG"),
        ]);
        let mut form = form(body);

        match form.next_field().await.unwrap() {
            Some(FormField::Text { name, value }) => {
                assert_eq!(name, "caption");
                assert_eq!(value, "hello");
            }
            other => panic!("expected text field, got {other:?}"),
        }

        match form.next_field().await.unwrap() {
            Some(FormField::File {
                name,
                file_name,
                content_type,
                body,
            }) => {
                assert_eq!(name, "file");
                assert_eq!(file_name, "a.png");
                assert_eq!(content_type.as_deref(), Some("image/png"));
                let chunks: Vec<Bytes> = body.try_collect().await.unwrap();
                assert_eq!(chunks.concat(), b"\x89PNG");
            }
            other => panic!("expected file field, got {other:?}"),
        }

        assert!(form.next_field().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unread_file_part_is_skipped() {
        let body = multipart_body(&[
            ("other", Some(("skip.bin", None)), b"ignored bytes"),
            ("file", None, b"just text"),
        ]);
        let mut form = form(body);

        let first = form.next_field().await.unwrap().unwrap();
        assert_eq!(first.name(), "other");
        drop(first);

        let second = form.next_field().await.unwrap().unwrap();
        assert!(matches!(second, FormField::Text { ref value, .. } if value == "just text"));
    }

    #[test]
    fn test_rejects_non_multipart_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let result = MultipartForm::from_request(&headers, Full::new(Bytes::new()));
        assert!(matches!(result, Err(AppError::Multipart(_))));

        let result = MultipartForm::from_request(&HeaderMap::new(), Full::new(Bytes::new()));
        assert!(matches!(result, Err(AppError::Multipart(_))));
    }
}
