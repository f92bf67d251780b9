//! Request handler module
//!
//! Route dispatch plus the posts and file handlers behind it.

pub mod files;
pub mod multipart;
pub mod posts;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
