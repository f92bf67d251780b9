//! Storage collaborators
//!
//! The router only sees two narrow traits: [`PostRepository`] for the posts
//! table and [`ObjectStore`] for named binary objects.

pub mod objects;
pub mod posts;

use std::pin::Pin;

use futures::Stream;
use hyper::body::Bytes;

pub use objects::{FilesystemObjectStore, ObjectStore};
pub use posts::{NewPost, Post, PostRepository, SqlitePostRepository};

/// Owned stream of object bytes, used for both uploads and downloads
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;
