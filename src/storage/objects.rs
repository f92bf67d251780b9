use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::{self, AsyncWriteExt, BufWriter};
use tokio_util::io::{ReaderStream, StreamReader};

use super::ByteStream;
use crate::error::Result;
use crate::logger;

/// Metadata kept next to every stored object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Key the object was stored under
    pub key: String,
    /// Data file holding the current version, relative to the store root
    pub data_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub uploaded_at: String,
}

pub struct StoredObject {
    pub metadata: ObjectMetadata,
    pub body: ByteStream,
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object. Returns bytes written.
    async fn put(&self, key: &str, content_type: Option<String>, body: ByteStream) -> Result<u64>;

    /// Fetch the object stored under exactly `key`
    async fn get(&self, key: &str) -> Result<Option<StoredObject>>;
}

const METADATA_EXTENSION: &str = "meta.toml";
const DATA_EXTENSION: &str = "data";

/// Objects as flat files under a root directory.
///
/// Every key maps to a fixed-length SHA-256 object id, so file names stay
/// short whatever the key and no key can address a path outside the root.
/// Each upload writes a fresh `<id>.<version>.data` file; the
/// `<id>.meta.toml` sidecar names the current one and renaming it into
/// place is the single commit point of a `put`.
pub struct FilesystemObjectStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FilesystemObjectStore {
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    fn object_id(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn metadata_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{METADATA_EXTENSION}"))
    }

    /// Suffix unique to this process and write: `<millis>-<pid>-<n>`
    fn unique_suffix(&self) -> String {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{}-{n}",
            Utc::now().timestamp_millis(),
            std::process::id()
        )
    }

    /// Unique sibling path for an in-progress write
    fn tmp_path(&self, target: &Path) -> PathBuf {
        let mut name = target.as_os_str().to_owned();
        name.push(format!(".{}.part", self.unique_suffix()));
        PathBuf::from(name)
    }

    async fn read_metadata(&self, id: &str) -> Result<Option<ObjectMetadata>> {
        match fs::read_to_string(self.metadata_path(id)).await {
            Ok(text) => Ok(Some(toml::from_str(&text)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy the body into `data_path`, then write the sidecar to `tmp_metadata`
    /// and rename it into place
    async fn write_version(
        &self,
        body: ByteStream,
        data_path: &Path,
        tmp_metadata: &Path,
        metadata_path: &Path,
        mut metadata: ObjectMetadata,
    ) -> Result<u64> {
        let mut reader = StreamReader::new(body);
        let mut writer = BufWriter::new(File::create(data_path).await?);
        let size = io::copy(&mut reader, &mut writer).await?;
        writer.flush().await?;
        writer.get_ref().sync_all().await?;

        metadata.size = size;
        fs::write(tmp_metadata, toml::to_string(&metadata)?).await?;
        fs::rename(tmp_metadata, metadata_path).await?;
        Ok(size)
    }
}

#[async_trait::async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, key: &str, content_type: Option<String>, body: ByteStream) -> Result<u64> {
        if key.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "object key is empty").into());
        }
        let id = Self::object_id(key);
        let data_file = format!("{id}.{}.{DATA_EXTENSION}", self.unique_suffix());
        let data_path = self.root.join(&data_file);
        let metadata_path = self.metadata_path(&id);
        let tmp_metadata = self.tmp_path(&metadata_path);

        let previous = self.read_metadata(&id).await.ok().flatten();
        let metadata = ObjectMetadata {
            key: key.to_string(),
            data_file,
            content_type,
            size: 0,
            uploaded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let size = match self
            .write_version(body, &data_path, &tmp_metadata, &metadata_path, metadata)
            .await
        {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&data_path).await;
                let _ = fs::remove_file(&tmp_metadata).await;
                return Err(e);
            }
        };

        if let Some(previous) = previous.filter(|p| !p.data_file.is_empty()) {
            if let Err(e) = fs::remove_file(self.root.join(&previous.data_file)).await {
                if e.kind() != io::ErrorKind::NotFound {
                    logger::log_warning(&format!(
                        "Failed to remove replaced object data '{}': {e}",
                        previous.data_file
                    ));
                }
            }
        }
        Ok(size)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        if key.is_empty() {
            return Ok(None);
        }
        let id = Self::object_id(key);

        // A concurrent put may delete the data file named by the sidecar we
        // just read; the second pass sees the replacement.
        for _ in 0..2 {
            let Some(metadata) = self.read_metadata(&id).await? else {
                return Ok(None);
            };
            if metadata.key != key {
                return Ok(None);
            }
            match File::open(self.root.join(&metadata.data_file)).await {
                Ok(file) => {
                    return Ok(Some(StoredObject {
                        metadata,
                        body: Box::pin(ReaderStream::new(file)),
                    }))
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}
