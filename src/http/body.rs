//! Request body helpers
//!
//! Handlers are generic over the request body so the router can be driven by
//! `hyper::body::Incoming` in production and by in-memory bodies in tests.

use futures::{Stream, TryStreamExt};
use http_body_util::{BodyExt, BodyStream};
use hyper::body::{Body, Bytes};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

/// Error bound shared by every body the router accepts
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Collect the whole body and deserialize it as JSON
pub async fn read_json<B, T>(body: B) -> Result<T>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
    T: DeserializeOwned,
{
    let bytes = body
        .collect()
        .await
        .map_err(|e| AppError::Body(Into::<BoxError>::into(e).to_string()))?
        .to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

/// Turn a body into a stream of data chunks, dropping trailers
pub fn data_stream<B>(body: B) -> impl Stream<Item = std::result::Result<Bytes, BoxError>> + Send + 'static
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    TryStreamExt::map_err(BodyStream::new(body), |e| -> BoxError { e.into() })
        .try_filter_map(|frame| async move { Ok(frame.into_data().ok()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        title: String,
    }

    #[tokio::test]
    async fn test_read_json() {
        let body = Full::new(Bytes::from_static(br#"{"title":"hola"}"#));
        let sample: Sample = read_json(body).await.unwrap();
        assert_eq!(sample.title, "hola");
    }

    #[tokio::test]
    async fn test_read_json_malformed() {
        let body = Full::new(Bytes::from_static(b"{not json"));
        let err = read_json::<_, Sample>(body).await.unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }

    #[tokio::test]
    async fn test_data_stream_yields_chunks() {
        let body = Full::new(Bytes::from_static(b"chunk"));
        let chunks: Vec<Bytes> = data_stream(body).try_collect().await.unwrap();
        assert_eq!(chunks, vec![Bytes::from_static(b"chunk")]);
    }
}
