use bytes::{Bytes, BytesMut};
use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

pin_project! {
    /// Re-slices a fallible stream of byte chunks into chunks of a fixed size.
    ///
    /// Every chunk yielded is exactly `size` bytes long, except the last one
    /// which carries whatever remains when the inner stream ends. Chunks are
    /// yielded as soon as enough bytes have arrived, so the adapter never holds
    /// more than `size` bytes plus one inner chunk in memory.
    ///
    /// An error from the inner stream is passed through immediately and ends
    /// the stream; bytes buffered at that point are discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::{TryStreamExt, stream};
    /// use vitrine_asyncutils::Rechunk;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let inner = stream::iter([Ok::<_, std::io::Error>(&b"abcde"[..]), Ok(&b"fgh"[..])]);
    /// let chunks: Vec<_> = Rechunk::new(inner, 3).try_collect().await.unwrap();
    /// assert_eq!(chunks, vec![&b"abc"[..], &b"def"[..], &b"gh"[..]]);
    /// # }
    /// ```
    #[must_use = "streams do nothing unless polled"]
    pub struct Rechunk<S> {
        #[pin]
        inner: S,
        size: usize,
        buffer: BytesMut,
        done: bool,
    }
}

impl<S> Rechunk<S> {
    /// Wrap `inner`, yielding chunks of `size` bytes. A `size` of zero is
    /// treated as one.
    pub fn new(inner: S, size: usize) -> Self {
        let size = size.max(1);
        Self {
            inner,
            size,
            buffer: BytesMut::with_capacity(size),
            done: false,
        }
    }
}

impl<S, B, E> Stream for Rechunk<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if this.buffer.len() >= *this.size {
                return Poll::Ready(Some(Ok(this.buffer.split_to(*this.size).freeze())));
            }
            if *this.done {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                return Poll::Ready(Some(Ok(this.buffer.split().freeze())));
            }
            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    *this.done = true;
                    this.buffer.clear();
                    return Poll::Ready(Some(Err(e)));
                },
                None => *this.done = true,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            let remaining = self.buffer.len().div_ceil(self.size);
            return (remaining, Some(remaining));
        }
        (0, None)
    }
}
