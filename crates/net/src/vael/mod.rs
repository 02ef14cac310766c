//! Shared base for the two Vael-derived families.
//!
//! Vaelora and Vaelheim forked from the same server software: they share the
//! little-endian u16-id framing, the bit-packed map coordinates, and most
//! handler logic, with each fork layering its own catalog on top. Everything
//! here is written against the catalog lookup a fork supplies, never against
//! a concrete fork.

pub mod chat;
pub mod coords;
pub mod handlers;
pub mod npc;
#[allow(missing_docs)]
pub mod protocol;
pub mod session;

use crate::buffer::ByteOrder;
use crate::error::NetError;
use crate::family::{FrameDecision, FrameInfo, MAX_FRAME_LEN, PacketLength, header_u16};

/// Frame layout shared by the Vael forks: `[u16 id]`, then for
/// variable-length types a `[u16 len]` counting the whole frame.
///
/// `lookup` is the fork's catalog; `None` means the id has no length rule,
/// which is unrecoverable (see the module-level skip policy).
pub fn next_frame(
    buffered: &[u8],
    version: u32,
    lookup: impl Fn(u16, u32) -> Option<PacketLength>,
) -> Result<FrameDecision, NetError> {
    if buffered.len() < 2 {
        return Ok(FrameDecision::Incomplete);
    }
    let id = header_u16(buffered, 0, ByteOrder::LittleEndian);
    match lookup(id, version) {
        None => Err(NetError::MalformedMessage { id, length: 0 }),
        Some(PacketLength::Fixed(total_len)) => {
            if total_len < 2 {
                return Err(NetError::MalformedMessage {
                    id,
                    length: total_len,
                });
            }
            if buffered.len() < total_len {
                return Ok(FrameDecision::Incomplete);
            }
            Ok(FrameDecision::Frame(FrameInfo {
                id,
                header_len: 2,
                total_len,
            }))
        }
        Some(PacketLength::Variable) => {
            if buffered.len() < 4 {
                return Ok(FrameDecision::Incomplete);
            }
            let total_len = header_u16(buffered, 2, ByteOrder::LittleEndian) as usize;
            if total_len < 4 {
                return Err(NetError::MalformedMessage {
                    id,
                    length: total_len,
                });
            }
            let info = FrameInfo {
                id,
                header_len: 4,
                total_len,
            };
            if total_len > MAX_FRAME_LEN {
                return Ok(FrameDecision::Malformed(info));
            }
            if buffered.len() < total_len {
                return Ok(FrameDecision::Incomplete);
            }
            Ok(FrameDecision::Frame(info))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(id: u16, _version: u32) -> Option<PacketLength> {
        match id {
            0x0080 => Some(PacketLength::Fixed(7)),
            0x008E => Some(PacketLength::Variable),
            _ => None,
        }
    }

    #[test]
    fn fixed_frames_wait_for_full_length() {
        assert_eq!(
            next_frame(&[0x80, 0x00, 1, 2, 3], 0, catalog).unwrap(),
            FrameDecision::Incomplete
        );
        assert_eq!(
            next_frame(&[0x80, 0x00, 1, 2, 3, 4, 5], 0, catalog).unwrap(),
            FrameDecision::Frame(FrameInfo {
                id: 0x0080,
                header_len: 2,
                total_len: 7
            })
        );
    }

    #[test]
    fn variable_frames_read_their_length_word() {
        // Declared total 6: header 4 + 2 payload bytes.
        let frame = [0x8E, 0x00, 0x06, 0x00, b'h', b'i'];
        assert_eq!(
            next_frame(&frame[..5], 0, catalog).unwrap(),
            FrameDecision::Incomplete
        );
        assert_eq!(
            next_frame(&frame, 0, catalog).unwrap(),
            FrameDecision::Frame(FrameInfo {
                id: 0x008E,
                header_len: 4,
                total_len: 6
            })
        );
    }

    #[test]
    fn length_below_header_is_fatal() {
        let frame = [0x8E, 0x00, 0x02, 0x00];
        assert!(matches!(
            next_frame(&frame, 0, catalog),
            Err(NetError::MalformedMessage { id: 0x008E, length: 2 })
        ));
    }

    #[test]
    fn catalogless_id_is_fatal() {
        assert!(matches!(
            next_frame(&[0xFF, 0x7F], 0, catalog),
            Err(NetError::MalformedMessage { id: 0x7FFF, .. })
        ));
    }

    #[test]
    fn oversized_variable_length_is_skippable_malformed() {
        let declared = (MAX_FRAME_LEN + 1) as u16;
        let mut frame = vec![0x8E, 0x00];
        frame.extend_from_slice(&declared.to_le_bytes());
        match next_frame(&frame, 0, catalog).unwrap() {
            FrameDecision::Malformed(info) => assert_eq!(info.total_len, MAX_FRAME_LEN + 1),
            other => panic!("expected malformed, got {other:?}"),
        }
    }
}
