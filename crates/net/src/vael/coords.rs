//! Bit-packed map coordinates used by the Vael wire format.
//!
//! Positions are 10-bit x/y pairs packed into 3 bytes; the move variant
//! packs source and destination into 5 bytes.

use crate::envelope::{MessageIn, MessageOut};
use crate::error::NetError;

/// A decoded map position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coords {
    /// Tile x.
    pub x: u16,
    /// Tile y.
    pub y: u16,
}

/// Decode a 3-byte packed position: `x` in bits 0..10, `y` in bits 10..20.
pub fn read_coords(msg: &mut MessageIn<'_>, label: &'static str) -> Result<Coords, NetError> {
    let raw = msg.read_bytes(3, label)?;
    let x = u16::from(raw[0]) | (u16::from(raw[1] & 0x03) << 8);
    let y = (u16::from(raw[1]) >> 2) | (u16::from(raw[2] & 0x0F) << 6);
    Ok(Coords { x, y })
}

/// Decode a 5-byte packed move: source position, destination position, with
/// the destination sharing the middle byte.
pub fn read_move_coords(
    msg: &mut MessageIn<'_>,
    label: &'static str,
) -> Result<(Coords, Coords), NetError> {
    let raw = msg.read_bytes(5, label)?;
    let sx = u16::from(raw[0]) | (u16::from(raw[1] & 0x03) << 8);
    let sy = (u16::from(raw[1]) >> 2) | (u16::from(raw[2] & 0x0F) << 6);
    let dx = (u16::from(raw[2]) >> 4) | (u16::from(raw[3] & 0x3F) << 4);
    let dy = (u16::from(raw[3]) >> 6) | (u16::from(raw[4]) << 2);
    Ok((Coords { x: sx, y: sy }, Coords { x: dx, y: dy }))
}

/// Encode a 3-byte packed position with a direction nibble in the top bits,
/// the layout of the walk request.
pub fn write_coords(out: &mut MessageOut, coords: Coords, direction: u8, label: &'static str) {
    let packed = [
        (coords.x & 0xFF) as u8,
        (((coords.x >> 8) & 0x03) as u8) | ((coords.y & 0x3F) as u8) << 2,
        (((coords.y >> 6) & 0x0F) as u8) | (direction & 0x0F) << 4,
    ];
    out.write_bytes(&packed, label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteOrder;
    use crate::envelope::FramePrefix;

    fn decode3(bytes: [u8; 3]) -> Coords {
        let mut frame = vec![0x00, 0x00];
        frame.extend_from_slice(&bytes);
        let mut msg = MessageIn::new(0, &frame, 2, 0, ByteOrder::LittleEndian);
        read_coords(&mut msg, "pos").unwrap()
    }

    #[test]
    fn position_roundtrips_through_packing() {
        for (x, y) in [(0u16, 0u16), (511, 300), (1023, 1023), (123, 45)] {
            let mut out = MessageOut::new(0x0085, ByteOrder::LittleEndian, FramePrefix::IdOnly);
            write_coords(&mut out, Coords { x, y }, 0, "dest");
            let bytes = out.finish();
            let decoded = decode3([bytes[2], bytes[3], bytes[4]]);
            assert_eq!(decoded, Coords { x, y });
        }
    }

    #[test]
    fn direction_nibble_does_not_disturb_position() {
        let mut out = MessageOut::new(0x0085, ByteOrder::LittleEndian, FramePrefix::IdOnly);
        write_coords(&mut out, Coords { x: 700, y: 900 }, 0x0D, "dest");
        let bytes = out.finish();
        assert_eq!(bytes[4] >> 4, 0x0D);
        let decoded = decode3([bytes[2], bytes[3], bytes[4]]);
        assert_eq!(decoded, Coords { x: 700, y: 900 });
    }

    #[test]
    fn move_coords_unpack_both_endpoints() {
        // Pack (3, 7) -> (10, 2) by hand per the bit layout.
        let sx = 3u16;
        let sy = 7u16;
        let dx = 10u16;
        let dy = 2u16;
        let raw = [
            (sx & 0xFF) as u8,
            (((sx >> 8) & 0x03) | ((sy & 0x3F) << 2)) as u8,
            ((((sy >> 6) & 0x0F) | ((dx & 0x0F) << 4)) & 0xFF) as u8,
            (((dx >> 4) & 0x3F) as u8) | (((dy & 0x03) << 6) as u8),
            ((dy >> 2) & 0xFF) as u8,
        ];
        let mut frame = vec![0x7B, 0x00];
        frame.extend_from_slice(&raw);
        let mut msg = MessageIn::new(0x007B, &frame, 2, 0, ByteOrder::LittleEndian);
        let (src, dst) = read_move_coords(&mut msg, "path").unwrap();
        assert_eq!(src, Coords { x: sx, y: sy });
        assert_eq!(dst, Coords { x: dx, y: dy });
    }

    #[test]
    fn short_payload_underruns() {
        let frame = [0x7B, 0x00, 0x01];
        let mut msg = MessageIn::new(0x007B, &frame, 2, 0, ByteOrder::LittleEndian);
        assert!(matches!(
            read_move_coords(&mut msg, "path"),
            Err(NetError::BufferUnderrun { .. })
        ));
    }
}
