//! Post handlers: list and create

use chrono::{SecondsFormat, Utc};
use hyper::body::{Body, Bytes};
use hyper::{Response, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::http::body::{read_json, BoxError};
use crate::http::{json_response, ResponseBody};
use crate::storage::{NewPost, PostRepository};

/// JSON body of `POST /posts`
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl CreatePostRequest {
    /// Both fields must be present and not blank
    pub fn validate(self) -> Result<(String, String)> {
        let title = required("title", self.title)?;
        let content = required("content", self.content)?;
        Ok((title, content))
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

/// `GET /posts`
pub async fn list_posts(posts: &dyn PostRepository) -> Result<Response<ResponseBody>> {
    let posts = posts.list_posts().await?;
    Ok(json_response(StatusCode::OK, &posts))
}

/// `POST /posts`
pub async fn create_post<B>(body: B, posts: &dyn PostRepository) -> Result<Response<ResponseBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let request: CreatePostRequest = read_json(body).await?;
    let (title, content) = request.validate()?;

    posts
        .create_post(NewPost {
            title,
            content,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
        .await?;

    Ok(json_response(StatusCode::OK, &serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: Option<&str>, content: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            title: title.map(ToString::to_string),
            content: content.map(ToString::to_string),
        }
    }

    #[test]
    fn test_validate_accepts_filled_fields() {
        let (title, content) = request(Some("Hola"), Some("Primer post")).validate().unwrap();
        assert_eq!(title, "Hola");
        assert_eq!(content, "Primer post");
    }

    #[test]
    fn test_validate_rejects_missing_or_blank() {
        let err = request(None, Some("x")).validate().unwrap_err();
        assert_eq!(err.message(), "title is required");

        let err = request(Some("x"), Some("   ")).validate().unwrap_err();
        assert_eq!(err.message(), "content is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_null_fields_deserialize_as_missing() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title": null, "content": "x"}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
