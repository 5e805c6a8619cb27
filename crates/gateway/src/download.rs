//! Installer downloads, forwarded as they arrive.

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use vitrine_upstream::{AssetStream, ByteStream};

/// An opened download: response metadata and the byte stream to forward.
pub struct Download {
    filename: String,
    content_length: Option<u64>,
    body: TransferStream,
}

impl Download {
    /// Prefer the size from the release metadata; fall back to whatever
    /// length upstream announced. Zero counts as unknown.
    pub fn new(filename: impl Into<String>, metadata_size: u64, stream: AssetStream) -> Self {
        let filename = filename.into();
        let content_length = Some(metadata_size)
            .filter(|&size| size > 0)
            .or(stream.content_length.filter(|&size| size > 0));
        Self {
            body: TransferStream::new(stream.body, filename.clone(), content_length),
            filename,
            content_length,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Known length of the body; `None` means the transfer is chunked.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// `Content-Disposition` value naming the file for the client.
    pub fn content_disposition(&self) -> String {
        let safe: String = self
            .filename
            .chars()
            .map(|c| match c {
                '"' | '\\' => '_',
                c if c.is_ascii_graphic() || c == ' ' => c,
                _ => '_',
            })
            .collect();
        format!("attachment; filename=\"{safe}\"")
    }

    pub fn into_body(self) -> TransferStream {
        self.body
    }
}

pin_project! {
    /// The forwarded asset body.
    ///
    /// Upstream failures surface as [`io::Error`]s, which ends the response
    /// early. Dropping the stream before it finishes (client went away)
    /// drops the upstream read with it.
    pub struct TransferStream {
        #[pin]
        inner: ByteStream,
        meter: TransferMeter,
    }
}

impl TransferStream {
    fn new(inner: ByteStream, filename: String, expected: Option<u64>) -> Self {
        Self {
            inner,
            meter: TransferMeter {
                filename,
                expected,
                forwarded: 0,
                finished: false,
            },
        }
    }

    /// Bytes forwarded so far.
    pub fn forwarded(&self) -> u64 {
        self.meter.forwarded
    }
}

impl Stream for TransferStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.meter.forwarded += chunk.len() as u64;
                // A sized response is not polled again once its length is met.
                if this.meter.expected.is_some_and(|expected| this.meter.forwarded >= expected) {
                    this.meter.complete();
                }
                Poll::Ready(Some(Ok(chunk)))
            },
            Some(Err(err)) => {
                this.meter.finished = true;
                tracing::warn!(
                    filename = %this.meter.filename,
                    forwarded = this.meter.forwarded,
                    error = ?err,
                    "Download interrupted upstream"
                );
                Poll::Ready(Some(Err(io::Error::other((*err).to_string()))))
            },
            None => {
                this.meter.complete();
                Poll::Ready(None)
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

struct TransferMeter {
    filename: String,
    expected: Option<u64>,
    forwarded: u64,
    finished: bool,
}

impl TransferMeter {
    fn complete(&mut self) {
        if !self.finished {
            self.finished = true;
            tracing::info!(filename = %self.filename, forwarded = self.forwarded, "Download complete");
        }
    }
}

impl Drop for TransferMeter {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!(
                filename = %self.filename,
                forwarded = self.forwarded,
                expected = ?self.expected,
                "Download abandoned by client"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, TryStreamExt, stream};
    use rstest::rstest;
    use vitrine_upstream::error::ErrorKind as UpstreamErrorKind;

    fn asset_stream(parts: Vec<vitrine_upstream::error::Result<Bytes>>, announced: Option<u64>) -> AssetStream {
        AssetStream::new(stream::iter(parts), announced)
    }

    #[rstest]
    #[case(100, Some(90), Some(100))]
    #[case(0, Some(90), Some(90))]
    #[case(0, Some(0), None)]
    #[case(0, None, None)]
    fn test_content_length(#[case] metadata: u64, #[case] announced: Option<u64>, #[case] expected: Option<u64>) {
        let download = Download::new("setup.exe", metadata, asset_stream(vec![], announced));
        assert_eq!(download.content_length(), expected);
    }

    #[rstest]
    #[case("setup.exe", "attachment; filename=\"setup.exe\"")]
    #[case("my setup.exe", "attachment; filename=\"my setup.exe\"")]
    #[case("a\"b.exe", "attachment; filename=\"a_b.exe\"")]
    #[case("ünï.exe", "attachment; filename=\"_n_.exe\"")]
    #[case("line\r\nbreak.exe", "attachment; filename=\"line__break.exe\"")]
    fn test_content_disposition(#[case] filename: &str, #[case] expected: &str) {
        let download = Download::new(filename, 0, asset_stream(vec![], None));
        assert_eq!(download.content_disposition(), expected);
        assert_eq!(download.filename(), filename);
    }

    #[tokio::test]
    async fn test_forwards_bytes() {
        let parts = vec![Ok(Bytes::from_static(b"MZ")), Ok(Bytes::from_static(b"\x90\x00"))];
        let mut body = Download::new("setup.exe", 4, asset_stream(parts, None)).into_body();
        let mut received = Vec::new();
        while let Some(chunk) = body.try_next().await.unwrap() {
            received.extend_from_slice(&chunk);
        }
        assert_eq!(received, b"MZ\x90\x00");
        assert_eq!(body.forwarded(), 4);
    }

    fn two_chunks() -> Vec<vitrine_upstream::error::Result<Bytes>> {
        vec![
            Ok(Bytes::from(vec![0u8; vitrine_upstream::CHUNK_SIZE])),
            Ok(Bytes::from_static(&[1u8; 10])),
        ]
    }

    #[tokio::test]
    async fn test_sized_body_complete_without_final_poll() {
        let expected = vitrine_upstream::CHUNK_SIZE as u64 + 10;
        let mut body = Download::new("setup.exe", expected, asset_stream(two_chunks(), None)).into_body();
        body.next().await.unwrap().unwrap();
        assert!(!body.meter.finished);
        assert_eq!(body.next().await.unwrap().unwrap().len(), 10);
        // Hyper stops here for a sized response; the end of stream is never polled.
        assert!(body.meter.finished);
        assert_eq!(body.forwarded(), expected);
    }

    #[tokio::test]
    async fn test_partial_body_is_not_complete() {
        let expected = vitrine_upstream::CHUNK_SIZE as u64 + 10;
        let mut body = Download::new("setup.exe", expected, asset_stream(two_chunks(), None)).into_body();
        body.next().await.unwrap().unwrap();
        assert!(!body.meter.finished);
        assert_eq!(body.forwarded(), vitrine_upstream::CHUNK_SIZE as u64);
    }

    #[tokio::test]
    async fn test_unsized_body_completes_at_end_of_stream() {
        let mut body = Download::new("setup.exe", 0, asset_stream(two_chunks(), None)).into_body();
        body.next().await.unwrap().unwrap();
        body.next().await.unwrap().unwrap();
        assert!(!body.meter.finished);
        assert!(body.next().await.is_none());
        assert!(body.meter.finished);
    }

    #[tokio::test]
    async fn test_upstream_failure_ends_body() {
        let parts = vec![
            Ok(Bytes::from(vec![0u8; vitrine_upstream::CHUNK_SIZE])),
            Err(exn::Exn::from(UpstreamErrorKind::Interrupted)),
        ];
        let mut body = Download::new("setup.exe", 0, asset_stream(parts, None)).into_body();
        assert_eq!(body.next().await.unwrap().unwrap().len(), vitrine_upstream::CHUNK_SIZE);
        let err = body.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(body.next().await.is_none());
    }
}
