use std::sync::Arc;

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// RFC 3339 timestamp taken when the post was created
    pub date: String,
}

/// Row to insert; the store assigns `id`
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub date: String,
}

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, newest (highest id) first
    async fn list_posts(&self) -> Result<Vec<Post>>;

    /// Insert a post and return its id
    async fn create_post(&self, post: NewPost) -> Result<i64>;
}

const CREATE_POSTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    date TEXT NOT NULL
)";

#[derive(Debug)]
pub struct SqlitePostRepository {
    pool: Arc<SqlitePool>,
}

impl SqlitePostRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Create the posts table if it is missing. No versioning, no migrations.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_POSTS_TABLE)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostRepository for SqlitePostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT id, title, content, date FROM posts ORDER BY id DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(posts)
    }

    async fn create_post(&self, post: NewPost) -> Result<i64> {
        let result = sqlx::query("INSERT INTO posts (title, content, date) VALUES (?, ?, ?)")
            .bind(post.title)
            .bind(post.content)
            .bind(post.date)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.last_insert_rowid())
    }
}
