//! Incremental frame extraction.

use std::iter::FusedIterator;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::{
    DEFAULT_MAX_FRAME_LENGTH,
    Frame,
    FrameError,
    LENGTH_PREFIX_SIZE,
    clamp_frame_length,
};

/// Stateless length-prefixed codec.
///
/// Usable directly with [`tokio_util::codec::Framed`]. [`FrameDecoder`] wraps
/// it with an owned buffer for callers that receive raw chunks.
#[derive(Clone, Copy, Debug)]
pub struct FrameCodec {
    max_frame_length: usize,
}

impl FrameCodec {
    /// Create a codec accepting bodies up to `max_frame_length` bytes.
    ///
    /// The value is clamped to
    /// [`MIN_FRAME_LENGTH`](super::MIN_FRAME_LENGTH)..=[`MAX_FRAME_LENGTH`](super::MAX_FRAME_LENGTH).
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: clamp_frame_length(max_frame_length),
        }
    }

    /// Maximum body length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }
}

impl Default for FrameCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_FRAME_LENGTH) }
}

fn peek_length(src: &[u8]) -> Option<usize> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = src.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
    // Network byte order.
    usize::try_from(u32::from_be_bytes(prefix)).ok()
}

fn parse_body(body: Bytes) -> Result<Frame, FrameError> {
    let Some((&ctx_len, rest)) = body.split_first() else {
        return Err(FrameError::MalformedHeader {
            reason: "empty frame body",
        });
    };
    let ctx_len = usize::from(ctx_len);
    let Some(context) = rest.get(..ctx_len) else {
        return Err(FrameError::MalformedHeader {
            reason: "context length exceeds frame body",
        });
    };
    let context = std::str::from_utf8(context)
        .map_err(|_| FrameError::MalformedHeader {
            reason: "context is not valid UTF-8",
        })?
        .to_owned();
    Ok(Frame::new(context, body.slice(1 + ctx_len..)))
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(len) = peek_length(src) else {
            return Ok(None);
        };
        if len > self.max_frame_length {
            src.clear();
            return Err(FrameError::TooLarge {
                size: len,
                max: self.max_frame_length,
            });
        }
        let needed = LENGTH_PREFIX_SIZE + len;
        if src.len() < needed {
            src.reserve(needed - src.len());
            return Ok(None);
        }
        src.advance(LENGTH_PREFIX_SIZE);
        parse_body(src.split_to(len).freeze()).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => Err(FrameError::TruncatedAtEof {
                bytes_received: src.len(),
                expected: peek_length(src),
            }),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&item, self.max_frame_length, dst)
    }
}

impl Encoder<&Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(item, self.max_frame_length, dst)
    }
}

fn encode_frame(frame: &Frame, max: usize, dst: &mut BytesMut) -> Result<(), FrameError> {
    let ctx_len = u8::try_from(frame.context().len()).map_err(|_| FrameError::ContextTooLong {
        len: frame.context().len(),
    })?;
    let body_len = frame.body_len();
    let prefix = u32::try_from(body_len)
        .ok()
        .filter(|_| body_len <= max)
        .ok_or(FrameError::TooLarge {
            size: body_len,
            max,
        })?;
    dst.reserve(LENGTH_PREFIX_SIZE + body_len);
    dst.put_u32(prefix);
    dst.put_u8(ctx_len);
    dst.extend_from_slice(frame.context().as_bytes());
    dst.extend_from_slice(frame.payload());
    Ok(())
}

/// Buffering frame decoder fed with raw socket chunks.
///
/// Bytes that do not yet form a complete frame are retained between calls,
/// so the frames produced are independent of how the stream was chunked.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use mbrc::frame::{Frame, FrameDecoder};
///
/// let mut decoder = FrameDecoder::default();
/// let mut wire = BytesMut::new();
/// decoder
///     .encode(&Frame::new("ping", &b""[..]), &mut wire)
///     .expect("encode ping");
///
/// let (head, tail) = wire.split_at(3);
/// assert_eq!(decoder.feed(head).count(), 0);
/// let frames: Vec<_> = decoder.feed(tail).collect();
/// assert_eq!(frames.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    codec: FrameCodec,
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create a decoder accepting bodies up to `max_frame_length` bytes.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            codec: FrameCodec::new(max_frame_length),
            buf: BytesMut::new(),
        }
    }

    /// Maximum body length accepted by this decoder.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.codec.max_frame_length() }

    /// Number of bytes held back waiting for the rest of a frame.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buf.len() }

    /// Discard any partially received frame.
    pub fn reset(&mut self) { self.buf.clear(); }

    /// Append `bytes` and return the frames that are now complete.
    ///
    /// Frames are decoded lazily as the iterator is advanced. Frames left
    /// unconsumed when the iterator is dropped are produced by the next call.
    /// After [`FrameError::TooLarge`] the iterator ends and the buffer is
    /// empty.
    pub fn feed(&mut self, bytes: &[u8]) -> Frames<'_> {
        self.buf.extend_from_slice(bytes);
        Frames {
            decoder: self,
            done: false,
        }
    }

    /// Encode `frame` onto `dst` using this decoder's limits.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ContextTooLong`] or [`FrameError::TooLarge`] when
    /// the frame cannot be represented.
    pub fn encode(&self, frame: &Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(frame, self.codec.max_frame_length(), dst)
    }
}

/// Lazy sequence of frames produced by [`FrameDecoder::feed`].
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let FrameDecoder { codec, buf } = &mut *self.decoder;
        match codec.decode(buf) {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = err.is_fatal();
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Frames<'_> {}
