//! Decode/encode cursors over a single message.
//!
//! [`MessageIn`] is built by the pump loop once a complete frame is buffered
//! and handed to the matching handler; it never outlives the dispatch cycle.
//! [`MessageOut`] builds one outgoing frame and is appended atomically to the
//! connection's outbound buffer, so partial messages are never interleaved.
//!
//! Every read and write takes a short field label. The label has no wire
//! effect; it feeds `tracing` at TRACE level so a packet can be replayed
//! field-by-field when debugging a server quirk.

use tracing::{trace, warn};

use crate::buffer::{ByteOrder, WireBuffer};
use crate::error::NetError;

/// Decode cursor over one inbound message's payload.
///
/// The slice covers the full frame including its header; the cursor starts
/// just past the header, positioned at the first payload field.
pub struct MessageIn<'a> {
    data: &'a [u8],
    pos: usize,
    id: u16,
    version: u32,
    order: ByteOrder,
}

macro_rules! msg_read {
    ($name:ident, $ty:ty) => {
        /// Read a fixed-width integer field and advance past it.
        pub fn $name(&mut self, label: &'static str) -> Result<$ty, NetError> {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            let bytes = self.take(WIDTH)?;
            let mut raw = [0u8; WIDTH];
            raw.copy_from_slice(bytes);
            let value = match self.order {
                ByteOrder::LittleEndian => <$ty>::from_le_bytes(raw),
                ByteOrder::BigEndian => <$ty>::from_be_bytes(raw),
            };
            trace!(id = self.id, field = label, value = %value, "read");
            Ok(value)
        }
    };
}

impl<'a> MessageIn<'a> {
    /// Wrap a complete frame. `header_len` is the number of leading bytes
    /// (type id plus any length prefix) the cursor should start past.
    pub fn new(id: u16, frame: &'a [u8], header_len: usize, version: u32, order: ByteOrder) -> Self {
        Self {
            data: frame,
            pos: header_len.min(frame.len()),
            id,
            version,
            order,
        }
    }

    /// Message type id.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Total on-wire length of the frame, header included.
    pub fn length(&self) -> usize {
        self.data.len()
    }

    /// Negotiated protocol version of the owning connection. Layout
    /// branches compare this with `>=` against a named epoch constant.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Bytes left past the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current cursor position inside the frame.
    pub fn tell(&self) -> usize {
        self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], NetError> {
        let remaining = self.remaining();
        if remaining < count {
            return Err(NetError::BufferUnderrun {
                needed: count,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += count;
        Ok(&self.data[start..self.pos])
    }

    msg_read!(read_u8, u8);
    msg_read!(read_u16, u16);
    msg_read!(read_u32, u32);
    msg_read!(read_u64, u64);
    msg_read!(read_i8, i8);
    msg_read!(read_i16, i16);
    msg_read!(read_i32, i32);
    msg_read!(read_i64, i64);

    /// Read exactly `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize, label: &'static str) -> Result<&'a [u8], NetError> {
        let bytes = self.take(count)?;
        trace!(id = self.id, field = label, len = count, "read bytes");
        Ok(bytes)
    }

    /// Read a fixed-size character field and trim trailing NUL padding.
    pub fn read_string(&mut self, fixed_len: usize, label: &'static str) -> Result<String, NetError> {
        let bytes = self.take(fixed_len)?;
        let live = match bytes.iter().position(|&b| b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        let value = String::from_utf8_lossy(live).into_owned();
        trace!(id = self.id, field = label, value = %value, "read string");
        Ok(value)
    }

    /// Read all bytes from the cursor to the end of the frame as text.
    /// Variable-length chat payloads fill the rest of their frame.
    pub fn read_rest_string(&mut self, label: &'static str) -> Result<String, NetError> {
        let len = self.remaining();
        self.read_string(len, label)
    }

    /// Advance past `count` bytes without interpreting them.
    pub fn skip(&mut self, count: usize, label: &'static str) -> Result<(), NetError> {
        self.take(count)?;
        trace!(id = self.id, field = label, len = count, "skip");
        Ok(())
    }
}

/// Header layout of an outgoing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePrefix {
    /// `[id]`: fixed-length message, length implied by the catalog.
    IdOnly,
    /// `[id][len]`: Vael-style variable-length message; `len` counts the
    /// whole frame including the 4 header bytes.
    IdThenLength,
    /// `[len][id]`: Solmara framing; every message is length-prefixed and
    /// `len` counts the whole frame including the 4 header bytes.
    LengthThenId,
}

/// Encode cursor for one outgoing message.
pub struct MessageOut {
    buf: WireBuffer,
    id: u16,
    len_slot: Option<usize>,
}

macro_rules! msg_write {
    ($name:ident, $inner:ident, $ty:ty) => {
        /// Append a fixed-width integer field.
        pub fn $name(&mut self, value: $ty, label: &'static str) -> &mut Self {
            trace!(id = self.id, field = label, value = %value, "write");
            self.buf.$inner(value);
            self
        }
    };
}

impl MessageOut {
    /// Start a frame with the given header layout.
    pub fn new(id: u16, order: ByteOrder, prefix: FramePrefix) -> Self {
        let mut buf = WireBuffer::new(order);
        let len_slot = match prefix {
            FramePrefix::IdOnly => {
                buf.write_u16(id);
                None
            }
            FramePrefix::IdThenLength => {
                buf.write_u16(id);
                let slot = buf.len();
                buf.write_u16(0);
                Some(slot)
            }
            FramePrefix::LengthThenId => {
                let slot = buf.len();
                buf.write_u16(0);
                buf.write_u16(id);
                Some(slot)
            }
        };
        Self { buf, id, len_slot }
    }

    /// Message type id.
    pub fn id(&self) -> u16 {
        self.id
    }

    msg_write!(write_u8, write_u8, u8);
    msg_write!(write_u16, write_u16, u16);
    msg_write!(write_u32, write_u32, u32);
    msg_write!(write_u64, write_u64, u64);
    msg_write!(write_i8, write_i8, i8);
    msg_write!(write_i16, write_i16, i16);
    msg_write!(write_i32, write_i32, i32);
    msg_write!(write_i64, write_i64, i64);

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8], label: &'static str) -> &mut Self {
        trace!(id = self.id, field = label, len = bytes.len(), "write bytes");
        self.buf.write_bytes(bytes);
        self
    }

    /// Append a fixed-size NUL-padded character field, truncating long
    /// values.
    pub fn write_string(&mut self, value: &str, fixed_len: usize, label: &'static str) -> &mut Self {
        trace!(id = self.id, field = label, value = %value, "write string");
        self.buf.write_string(value, fixed_len);
        self
    }

    /// Append a variable text field filling the rest of the frame.
    pub fn write_rest_string(&mut self, value: &str, label: &'static str) -> &mut Self {
        trace!(id = self.id, field = label, value = %value, "write string");
        self.buf.write_bytes(value.as_bytes());
        self
    }

    /// Finalize the frame, patching the length prefix if the layout carries
    /// one, and return the bytes to append to the outbound buffer.
    ///
    /// A frame too long for the 16-bit length word gets a saturated prefix
    /// rather than a wrapped one; the server will reject it, but the stream
    /// stays diagnosable. Callers keep payloads within the frame cap.
    pub fn finish(mut self) -> Vec<u8> {
        if let Some(slot) = self.len_slot {
            let total = self.buf.len();
            if total > usize::from(u16::MAX) {
                warn!(id = self.id, len = total, "frame overflows its length word");
            }
            self.buf.patch_u16(slot, total.min(usize::from(u16::MAX)) as u16);
        }
        self.buf.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The canonical example: 2-byte LE id 0x00B0 with a fixed 6-byte name
    // field at offset 2.
    #[test]
    fn fixed_frame_layout() {
        let mut out = MessageOut::new(0x00B0, ByteOrder::LittleEndian, FramePrefix::IdOnly);
        out.write_string("Alice", 6, "name");
        let bytes = out.finish();
        assert_eq!(bytes, [0xB0, 0x00, b'A', b'l', b'i', b'c', b'e', 0x00]);

        let mut msg = MessageIn::new(0x00B0, &bytes, 2, 0, ByteOrder::LittleEndian);
        assert_eq!(msg.id(), 0x00B0);
        assert_eq!(msg.length(), 8);
        assert_eq!(msg.read_string(6, "name").unwrap(), "Alice");
        assert_eq!(msg.remaining(), 0);
    }

    #[test]
    fn variable_frame_patches_total_length() {
        let mut out = MessageOut::new(0x008C, ByteOrder::LittleEndian, FramePrefix::IdThenLength);
        out.write_rest_string("hello", "chat text");
        let bytes = out.finish();
        assert_eq!(bytes.len(), 9);
        assert_eq!(&bytes[0..2], &[0x8C, 0x00]);
        // Declared length counts the whole frame.
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 9);
        assert_eq!(&bytes[4..], b"hello");
    }

    #[test]
    fn length_first_frame_layout() {
        let mut out = MessageOut::new(0x0041, ByteOrder::BigEndian, FramePrefix::LengthThenId);
        out.write_u32(7, "being id");
        let bytes = out.finish();
        assert_eq!(bytes.len(), 8);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 8);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 0x0041);
    }

    #[test]
    fn oversized_frame_saturates_the_length_word() {
        let mut out = MessageOut::new(0x008C, ByteOrder::LittleEndian, FramePrefix::IdThenLength);
        let long = "x".repeat(70_000);
        out.write_rest_string(&long, "chat text");
        let bytes = out.finish();
        // 70_004 & 0xFFFF would declare 4_468; the prefix saturates instead.
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), u16::MAX);
    }

    #[test]
    fn payload_underrun_is_reported() {
        let bytes = [0xB0, 0x00, b'A'];
        let mut msg = MessageIn::new(0x00B0, &bytes, 2, 0, ByteOrder::LittleEndian);
        let err = msg.read_string(6, "name").unwrap_err();
        assert!(matches!(err, NetError::BufferUnderrun { .. }));
    }

    #[test]
    fn version_is_visible_to_decoders() {
        let bytes = [0x78, 0x00];
        let msg = MessageIn::new(0x0078, &bytes, 2, 20240215, ByteOrder::LittleEndian);
        assert!(msg.version() >= 20240215);
    }
}
