// src/plugins/payload.rs — Values threaded through a hook chain
//
// Text and request payloads are plain data. Audio is a lazy byte stream:
// hooks stack layers (or wrap the whole stream) and the source is only
// taken on the first poll of the final stream. While the executor runs a
// chain the source is sealed, so a hook that reads it gets an error item
// and the source stays in place for the pre-hook snapshot.

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};

use crate::core::types::TtsRequest;
use crate::infra::errors::BridgeError;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BridgeError>> + Send>>;

type Layer = Arc<dyn Fn(ByteStream) -> ByteStream + Send + Sync>;

struct Source {
    stream: Mutex<Option<ByteStream>>,
    seals: AtomicUsize,
}

enum Take {
    Ready(ByteStream),
    Sealed,
    Consumed,
}

impl Source {
    fn take(&self) -> Take {
        if self.seals.load(Ordering::SeqCst) > 0 {
            return Take::Sealed;
        }
        match self.stream.lock().ok().and_then(|mut s| s.take()) {
            Some(stream) => Take::Ready(stream),
            None => Take::Consumed,
        }
    }
}

/// Refuses reads of one audio source until dropped.
pub(crate) struct SealGuard(Arc<Source>);

impl Drop for SealGuard {
    fn drop(&mut self) {
        self.0.seals.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A lazily evaluated audio byte stream plus the hook layers wrapped around it.
#[derive(Clone)]
pub struct AudioStream {
    source: Arc<Source>,
    layers: Vec<Layer>,
}

impl AudioStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BridgeError>> + Send + 'static,
    {
        Self {
            source: Arc::new(Source {
                stream: Mutex::new(Some(Box::pin(stream))),
                seals: AtomicUsize::new(0),
            }),
            layers: Vec::new(),
        }
    }

    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::new(futures::stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Wrap the stream. The layer runs when the stream is taken, not now.
    pub fn layer<F>(mut self, f: F) -> Self
    where
        F: Fn(ByteStream) -> ByteStream + Send + Sync + 'static,
    {
        self.layers.push(Arc::new(f));
        self
    }

    /// Rewrite every chunk.
    pub fn map_chunks<F>(self, f: F) -> Self
    where
        F: Fn(Bytes) -> Bytes + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.layer(move |inner| {
            let f = Arc::clone(&f);
            Box::pin(inner.map_ok(move |chunk| f(chunk)))
        })
    }

    /// Observe every chunk without changing it.
    pub fn inspect_chunks<F>(self, f: F) -> Self
    where
        F: Fn(&Bytes) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.layer(move |inner| {
            let f = Arc::clone(&f);
            Box::pin(inner.inspect_ok(move |chunk| f(chunk)))
        })
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_consumed(&self) -> bool {
        self.source
            .stream
            .lock()
            .map(|s| s.is_none())
            .unwrap_or(true)
    }

    pub(crate) fn seal(&self) -> SealGuard {
        self.source.seals.fetch_add(1, Ordering::SeqCst);
        SealGuard(Arc::clone(&self.source))
    }

    /// The stream with every layer applied, in order.
    ///
    /// Nothing is taken until the first poll. The source can be taken once;
    /// clones share it. Dropping the returned stream drops the source.
    pub fn into_stream(self) -> ByteStream {
        let source = self.source;
        let base: ByteStream = Box::pin(async_stream::stream! {
            match source.take() {
                Take::Ready(mut inner) => {
                    while let Some(item) = inner.next().await {
                        yield item;
                    }
                }
                Take::Sealed => {
                    yield Err(BridgeError::Other(anyhow::anyhow!(
                        "audio stream cannot be read while hooks are running"
                    )));
                }
                Take::Consumed => {
                    tracing::warn!("Audio stream already consumed; yielding nothing");
                }
            }
        });
        self.layers
            .iter()
            .fold(base, |stream, layer| layer(stream))
    }

    /// Drain the stream into memory. Test and tooling helper; the request
    /// path never calls this.
    pub async fn collect_chunks(self) -> Vec<Result<Bytes, BridgeError>> {
        self.into_stream().collect().await
    }
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("layers", &self.layers.len())
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Payload variants, one per kind of extension point.
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    Request(TtsRequest),
    Audio(AudioStream),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    Request,
    Audio,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Request => "request",
            Self::Audio => "audio",
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Text(_) => PayloadKind::Text,
            Self::Request(_) => PayloadKind::Request,
            Self::Audio(_) => PayloadKind::Audio,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_request(self) -> Option<TtsRequest> {
        match self {
            Self::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_audio(self) -> Option<AudioStream> {
        match self {
            Self::Audio(a) => Some(a),
            _ => None,
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<TtsRequest> for Payload {
    fn from(request: TtsRequest) -> Self {
        Self::Request(request)
    }
}

impl From<AudioStream> for Payload {
    fn from(audio: AudioStream) -> Self {
        Self::Audio(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn chunks(parts: &[&'static str]) -> Vec<Bytes> {
        parts.iter().map(|p| Bytes::from_static(p.as_bytes())).collect()
    }

    #[tokio::test]
    async fn test_layers_apply_in_order() {
        let audio = AudioStream::from_chunks(chunks(&["a", "b"]))
            .map_chunks(|b| Bytes::from(format!("{}1", String::from_utf8_lossy(&b))))
            .map_chunks(|b| Bytes::from(format!("{}2", String::from_utf8_lossy(&b))));
        assert_eq!(audio.layer_count(), 2);

        let out: Vec<Bytes> = audio
            .collect_chunks()
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(out, chunks(&["a12", "b12"]));
    }

    #[tokio::test]
    async fn test_layers_are_lazy() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let audio = AudioStream::from_chunks(chunks(&["x", "y", "z"]))
            .inspect_chunks(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        let mut stream = audio.into_stream();
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        stream.next().await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_source() {
        let audio = AudioStream::from_chunks(chunks(&["only"]));
        let snapshot = audio.clone();
        let wrapped = audio.map_chunks(|_| Bytes::from_static(b"changed"));

        // Dropping the wrapped copy and taking the snapshot yields the raw chunk
        drop(wrapped);
        assert!(!snapshot.is_consumed());
        let out = snapshot.clone().collect_chunks().await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), &Bytes::from_static(b"only"));

        // Source can only be taken once
        assert!(snapshot.is_consumed());
        assert!(snapshot.collect_chunks().await.is_empty());
    }

    #[tokio::test]
    async fn test_into_stream_defers_taking_the_source() {
        let audio = AudioStream::from_chunks(chunks(&["a"]));
        let snapshot = audio.clone();

        drop(audio.into_stream());
        assert!(!snapshot.is_consumed());
        assert_eq!(snapshot.collect_chunks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sealed_source_refuses_reads() {
        let audio = AudioStream::from_chunks(chunks(&["a", "b"]));
        let snapshot = audio.clone();

        let guard = snapshot.seal();
        let out = audio.collect_chunks().await;
        assert_eq!(out.len(), 1);
        assert!(out[0].is_err());
        assert!(!snapshot.is_consumed());

        drop(guard);
        assert_eq!(snapshot.collect_chunks().await.len(), 2);
    }

    /// Sets its flag when dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dropping_consumer_stops_pulling_and_releases_source() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));

        let counter = Arc::clone(&pulled);
        let flag = DropFlag(Arc::clone(&dropped));
        let source = futures::stream::iter(0..1000).map(move |i: u32| {
            let _held = &flag;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(i.to_string()))
        });
        let audio = AudioStream::new(source).map_chunks(|b| b);

        let mut stream = audio.into_stream();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"0"));
        assert!(!dropped.load(Ordering::SeqCst));

        // Caller disconnects mid-stream
        drop(stream);
        assert_eq!(pulled.load(Ordering::SeqCst), 1);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_payload_kind() {
        assert_eq!(Payload::Text("x".into()).kind(), PayloadKind::Text);
        assert_eq!(
            Payload::Audio(AudioStream::from_chunks(Vec::new())).kind(),
            PayloadKind::Audio
        );
        assert_eq!(PayloadKind::Request.to_string(), "request");
        assert!(Payload::Text("x".into()).into_request().is_none());
    }
}
