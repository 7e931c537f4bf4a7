//! Length-framed messages: `marker: u32le | total_len: u32le | payload`.
//!
//! `total_len` counts the 8-byte header. Several frames may arrive in one
//! read and a frame may be split across reads.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::BackendError;

pub const HEADER_LEN: usize = 8;
pub const MARKER_PROTOBUF: u32 = 0x2323_2300;
pub const MARKER_NATIVE: u32 = 0x2323_2301;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub marker: u32,
    pub payload: Bytes,
}

pub fn encode_frame(marker: u32, payload: &[u8]) -> Result<Bytes, BackendError> {
    let total = u32::try_from(HEADER_LEN + payload.len())
        .map_err(|_| BackendError::Length(u32::MAX))?;
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u32_le(marker);
    buf.put_u32_le(total);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Accumulates raw reads and splits them into frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, BackendError> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }
        let mut header = &self.buf[..HEADER_LEN];
        let marker = header.get_u32_le();
        let total = header.get_u32_le();
        if marker != MARKER_PROTOBUF && marker != MARKER_NATIVE {
            return Err(BackendError::Marker(marker));
        }
        if (total as usize) < HEADER_LEN {
            return Err(BackendError::Length(total));
        }
        if self.buf.len() < total as usize {
            return Ok(None);
        }
        let mut frame = self.buf.split_to(total as usize);
        frame.advance(HEADER_LEN);
        Ok(Some(Frame {
            marker,
            payload: frame.freeze(),
        }))
    }

    /// Every complete frame currently buffered.
    pub fn drain(&mut self) -> Result<Vec<Frame>, BackendError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_little_endian_and_inclusive() {
        let frame = encode_frame(MARKER_PROTOBUF, b"abc").unwrap();
        assert_eq!(&frame[..4], &[0x00, 0x23, 0x23, 0x23]);
        assert_eq!(&frame[4..8], &[11, 0, 0, 0]);
        assert_eq!(&frame[8..], b"abc");
    }

    #[test]
    fn demultiplexes_several_frames_in_one_read() {
        let mut data = encode_frame(MARKER_PROTOBUF, b"one").unwrap().to_vec();
        data.extend_from_slice(&encode_frame(MARKER_NATIVE, b"").unwrap());
        data.extend_from_slice(&encode_frame(MARKER_PROTOBUF, b"three").unwrap());

        let mut decoder = FrameDecoder::new();
        decoder.extend(&data);
        let frames = decoder.drain().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0].payload[..], b"one");
        assert_eq!(frames[1].marker, MARKER_NATIVE);
        assert!(frames[1].payload.is_empty());
        assert_eq!(&frames[2].payload[..], b"three");
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn split_frame_waits_for_rest() {
        let data = encode_frame(MARKER_PROTOBUF, b"payload").unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.extend(&data[..5]);
        assert!(decoder.next_frame().unwrap().is_none());
        decoder.extend(&data[5..10]);
        assert!(decoder.next_frame().unwrap().is_none());
        decoder.extend(&data[10..]);
        assert_eq!(&decoder.next_frame().unwrap().unwrap().payload[..], b"payload");
    }

    #[test]
    fn bad_header_is_rejected() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[1, 2, 3, 4, 16, 0, 0, 0]);
        assert!(matches!(decoder.next_frame(), Err(BackendError::Marker(_))));

        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0x00, 0x23, 0x23, 0x23, 4, 0, 0, 0]);
        assert!(matches!(decoder.next_frame(), Err(BackendError::Length(4))));
    }
}
