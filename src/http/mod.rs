//! HTTP protocol layer module
//!
//! CORS policy, request body helpers and response builders, decoupled from
//! the blog handlers.

pub mod body;
pub mod cors;
pub mod response;

// Re-export commonly used types
pub use cors::CorsPolicy;
pub use response::{
    build_404_response, build_413_response, build_error_response, build_no_content_response,
    build_stream_response, build_text_response, json_response, ResponseBody,
};
