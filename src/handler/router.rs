//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: CORS resolution, preflight,
//! body-size guard, route matching, and failure wrapping.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, ORIGIN};
use hyper::{Method, Request, Response};

use super::{files, posts};
use crate::config::AppState;
use crate::error::Result;
use crate::http::body::BoxError;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};

/// Path prefix for object fetches; the remainder is the object key
pub const FILES_PREFIX: &str = "/files/";

/// Routes, matched in this order
#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    ListPosts,
    CreatePost,
    UploadFile,
    FetchFile(&'a str),
    NotFound,
}

/// Resolve the dispatch table. File routes only exist when the object store is enabled.
pub fn resolve_route<'a>(method: &Method, path: &'a str, files_enabled: bool) -> Route<'a> {
    match (method, path) {
        (&Method::GET, "/posts") => Route::ListPosts,
        (&Method::POST, "/posts") => Route::CreatePost,
        (&Method::POST, "/upload") if files_enabled => Route::UploadFile,
        (&Method::GET, _) if files_enabled => path
            .strip_prefix(FILES_PREFIX)
            .map_or(Route::NotFound, Route::FetchFile),
        _ => Route::NotFound,
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> std::result::Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let mut entry = state.config.logging.access_log.then(|| {
        AccessLogEntry::from_request(
            peer_addr,
            req.method(),
            req.uri(),
            req.version(),
            req.headers(),
        )
    });

    let cors = state.cors.headers_for(req.headers().get(ORIGIN));

    let mut response = if req.method() == Method::OPTIONS {
        http::build_no_content_response()
    } else if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        resp
    } else {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        match route_request(req, &state).await {
            Ok(resp) => resp,
            Err(e) => {
                logger::log_error(&format!("{method} {path} failed: {e}"));
                http::build_error_response(&e)
            }
        }
    };

    cors.apply(response.headers_mut());

    if let Some(entry) = entry.as_mut() {
        entry.finish(
            response.status().as_u16(),
            response.body().size_hint().exact(),
            started.elapsed(),
        );
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<ResponseBody>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Dispatch to the matching handler
async fn route_request<B>(req: Request<B>, state: &AppState) -> Result<Response<ResponseBody>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let objects = state.objects.as_deref();
    let path = req.uri().path().to_string();

    match (resolve_route(req.method(), &path, objects.is_some()), objects) {
        (Route::ListPosts, _) => posts::list_posts(state.posts.as_ref()).await,
        (Route::CreatePost, _) => posts::create_post(req.into_body(), state.posts.as_ref()).await,
        (Route::UploadFile, Some(objects)) => files::upload_file(req, objects).await,
        (Route::FetchFile(key), Some(objects)) => files::fetch_file(key, objects).await,
        _ => Ok(http::build_404_response()),
    }
}
