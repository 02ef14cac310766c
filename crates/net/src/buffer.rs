//! Growable byte buffer with cursor-based typed reads and writes.
//!
//! One `WireBuffer` sits on each side of a connection: the inbound buffer
//! accumulates bytes as they arrive from the transport, the outbound buffer
//! accumulates encoded messages until the next flush. Reads fail with
//! [`NetError::BufferUnderrun`] instead of panicking so the pump loop can
//! treat a short read as "message not fully received".

use crate::error::NetError;

/// On-wire byte order of a protocol family.
///
/// The two Vael-derived families are little-endian; Solmara uses network
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first.
    LittleEndian,
    /// Most significant byte first.
    BigEndian,
}

/// Byte buffer with an explicit read cursor.
#[derive(Debug, Clone)]
pub struct WireBuffer {
    data: Vec<u8>,
    pos: usize,
    order: ByteOrder,
}

macro_rules! read_int {
    ($name:ident, $ty:ty) => {
        /// Read a fixed-width integer at the cursor and advance past it.
        pub fn $name(&mut self) -> Result<$ty, NetError> {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            let bytes = self.take(WIDTH)?;
            let mut raw = [0u8; WIDTH];
            raw.copy_from_slice(bytes);
            Ok(match self.order {
                ByteOrder::LittleEndian => <$ty>::from_le_bytes(raw),
                ByteOrder::BigEndian => <$ty>::from_be_bytes(raw),
            })
        }
    };
}

macro_rules! write_int {
    ($name:ident, $ty:ty) => {
        /// Append a fixed-width integer in the buffer's byte order.
        pub fn $name(&mut self, value: $ty) {
            let raw = match self.order {
                ByteOrder::LittleEndian => value.to_le_bytes(),
                ByteOrder::BigEndian => value.to_be_bytes(),
            };
            self.data.extend_from_slice(&raw);
        }
    };
}

impl WireBuffer {
    /// New empty buffer.
    pub fn new(order: ByteOrder) -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
            order,
        }
    }

    /// Buffer pre-seeded with `data`, cursor at the start.
    pub fn from_vec(data: Vec<u8>, order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
        }
    }

    /// Byte order this buffer encodes with.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Current read cursor.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Move the read cursor. Clamped to the written length.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Bytes buffered past the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// All bytes past the cursor, without consuming them.
    pub fn unread(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Entire written contents, independent of the cursor.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Drop everything before the cursor and rebase it to zero.
    ///
    /// Called after dispatching so the inbound buffer does not grow without
    /// bound across a session.
    pub fn compact(&mut self) {
        if self.pos > 0 {
            self.data.drain(..self.pos);
            self.pos = 0;
        }
    }

    /// Discard all contents and reset the cursor.
    pub fn clear(&mut self) {
        self.data.clear();
        self.pos = 0;
    }

    /// Advance the cursor by `count` without interpreting the bytes.
    pub fn skip(&mut self, count: usize) -> Result<(), NetError> {
        self.take(count).map(|_| ())
    }

    fn take(&mut self, count: usize) -> Result<&[u8], NetError> {
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

    read_int!(read_u8, u8);
    read_int!(read_u16, u16);
    read_int!(read_u32, u32);
    read_int!(read_u64, u64);
    read_int!(read_i8, i8);
    read_int!(read_i16, i16);
    read_int!(read_i32, i32);
    read_int!(read_i64, i64);

    write_int!(write_u8, u8);
    write_int!(write_u16, u16);
    write_int!(write_u32, u32);
    write_int!(write_u64, u64);
    write_int!(write_i8, i8);
    write_int!(write_i16, i16);
    write_int!(write_i32, i32);
    write_int!(write_i64, i64);

    /// Read exactly `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, NetError> {
        self.take(count).map(<[u8]>::to_vec)
    }

    /// Read a fixed-size character field and trim trailing NUL padding.
    ///
    /// Invalid UTF-8 in the live portion is replaced rather than rejected;
    /// legacy servers ship unvalidated name bytes.
    pub fn read_string(&mut self, fixed_len: usize) -> Result<String, NetError> {
        let bytes = self.take(fixed_len)?;
        let live = match bytes.iter().position(|&b| b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        Ok(String::from_utf8_lossy(live).into_owned())
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Append a fixed-size, NUL-padded character field.
    ///
    /// A value longer than `fixed_len` is truncated, not rejected: the wire
    /// formats use fixed-size name fields and the servers do the same.
    pub fn write_string(&mut self, value: &str, fixed_len: usize) {
        let bytes = value.as_bytes();
        let copy = bytes.len().min(fixed_len);
        self.data.extend_from_slice(&bytes[..copy]);
        self.data.resize(self.data.len() + (fixed_len - copy), 0);
    }

    /// Overwrite previously written bytes at `at` with a u16 in the
    /// buffer's byte order. Used to patch length-prefix slots.
    pub fn patch_u16(&mut self, at: usize, value: u16) {
        let raw = match self.order {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        self.data[at..at + 2].copy_from_slice(&raw);
    }

    /// Total bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the buffer, returning the written bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
