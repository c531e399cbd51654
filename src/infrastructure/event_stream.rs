// Chunked streaming of store events
use crate::application::dashboard_store::StoreEvent;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Create a chunked event streaming response
///
/// Uncompressed chunks are newline-delimited JSON. Compressed chunks are Brotli
/// frames, each prefixed with its length as a big-endian u32.
pub fn chunked_event_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = StoreEvent> + Send + 'static,
{
    let byte_stream = stream.then(move |event| async move { serialize_chunk(event, compress).await });

    // Content-Encoding is deliberately absent: frames are compressed one by one
    let content_type = if compress {
        "application/octet-stream"
    } else {
        "application/x-ndjson"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single event to a chunk
async fn serialize_chunk(event: StoreEvent, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&event)?;

    if !compress {
        let mut chunk = BytesMut::with_capacity(json.len() + 1);
        chunk.put_slice(&json);
        chunk.put_u8(b'\n');
        return Ok(chunk.freeze());
    }

    let payload = brotli_compress(json).await?;
    let length = payload.len() as u32;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream every event from `rx` until the store goes away; lagging subscribers skip ahead
pub fn stream_from_receiver(rx: broadcast::Receiver<StoreEvent>, compress: bool) -> impl IntoResponse {
    let events = BroadcastStream::new(rx);
    let stream = async_stream::stream! {
        futures::pin_mut!(events);
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => yield event,
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} events", missed);
                }
            }
        }
    };

    match chunked_event_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::bufread::BrotliDecoder;
    use tokio::io::AsyncReadExt;

    fn deleted(id: &str) -> StoreEvent {
        StoreEvent::PolygonDeleted { id: id.to_string() }
    }

    #[tokio::test]
    async fn test_plain_chunk_is_json_line() {
        let chunk = serialize_chunk(deleted("p1"), false).await.unwrap();
        assert_eq!(&chunk[..], b"{\"type\":\"polygonDeleted\",\"id\":\"p1\"}\n");
    }

    #[tokio::test]
    async fn test_compressed_chunk_is_length_prefixed() {
        let chunk = serialize_chunk(deleted("p1"), true).await.unwrap();
        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(length, chunk.len() - 4);

        let mut decoder = BrotliDecoder::new(std::io::Cursor::new(chunk[4..].to_vec()));
        let mut plain = String::new();
        decoder.read_to_string(&mut plain).await.unwrap();
        assert_eq!(plain, r#"{"type":"polygonDeleted","id":"p1"}"#);
    }

    #[tokio::test]
    async fn test_stream_ends_when_store_is_dropped() {
        let (tx, rx) = broadcast::channel(8);
        tx.send(deleted("a")).unwrap();
        tx.send(deleted("b")).unwrap();
        drop(tx);

        let response = stream_from_receiver(rx, false).into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-ndjson");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.contains("polygonDeleted")));
    }
}
