//! Fuzz-style property tests for the wire codec and the three framers.
//!
//! The framers sit directly on untrusted socket bytes, so the core property
//! is that arbitrary input never panics and never produces a frame larger
//! than what is buffered.

use proptest::prelude::*;
use riftmere_net::solmara::SolmaraProtocol;
use riftmere_net::vaelheim::VaelheimProtocol;
use riftmere_net::vaelora::VaeloraProtocol;
use riftmere_net::{
    ByteOrder, FrameDecision, FramePrefix, MessageIn, MessageOut, ProtocolFamily, WireBuffer,
};

fn families() -> [&'static dyn ProtocolFamily; 3] {
    [&VaeloraProtocol, &VaelheimProtocol, &SolmaraProtocol]
}

proptest! {
    /// Arbitrary bytes never crash a framer, and a produced frame never
    /// claims more bytes than are buffered.
    #[test]
    fn arbitrary_bytes_dont_crash_framers(
        bytes in prop::collection::vec(any::<u8>(), 0..512),
        version in any::<u32>(),
    ) {
        for family in families() {
            if let Ok(FrameDecision::Frame(info)) = family.next_frame(&bytes, version) {
                prop_assert!(info.total_len <= bytes.len());
                prop_assert!(info.header_len <= info.total_len);
            }
        }
    }

    /// Every strict prefix of a valid variable-length frame defers; the
    /// full frame parses with the declared length.
    #[test]
    fn truncated_frames_defer_instead_of_failing(
        text in "[a-zA-Z0-9 ]{0,80}",
    ) {
        let mut out = MessageOut::new(0x008E, ByteOrder::LittleEndian, FramePrefix::IdThenLength);
        out.write_rest_string(&text, "chat text");
        let frame = out.finish();

        for cut in 0..frame.len() {
            prop_assert_eq!(
                VaeloraProtocol.next_frame(&frame[..cut], 0).unwrap(),
                FrameDecision::Incomplete,
                "cut at {}", cut
            );
        }
        match VaeloraProtocol.next_frame(&frame, 0).unwrap() {
            FrameDecision::Frame(info) => prop_assert_eq!(info.total_len, frame.len()),
            other => return Err(TestCaseError::fail(format!("expected frame, got {other:?}"))),
        }
    }

    /// Typed reads round-trip through the buffer in both byte orders.
    #[test]
    fn integer_fields_roundtrip(
        a in any::<u16>(),
        b in any::<u32>(),
        c in any::<i64>(),
        big_endian in any::<bool>(),
    ) {
        let order = if big_endian { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
        let mut buf = WireBuffer::new(order);
        buf.write_u16(a);
        buf.write_u32(b);
        buf.write_i64(c);
        prop_assert_eq!(buf.read_u16().unwrap(), a);
        prop_assert_eq!(buf.read_u32().unwrap(), b);
        prop_assert_eq!(buf.read_i64().unwrap(), c);
    }

    /// A failed read leaves the cursor where it was, so the dispatch loop
    /// can realign off the declared frame length.
    #[test]
    fn underrun_does_not_move_the_cursor(
        payload in prop::collection::vec(any::<u8>(), 0..7),
    ) {
        let mut frame = vec![0x01, 0x00];
        frame.extend_from_slice(&payload);
        let mut msg = MessageIn::new(0x0001, &frame, 2, 0, ByteOrder::LittleEndian);
        let before = msg.tell();
        prop_assert!(msg.read_u64("field").is_err());
        prop_assert_eq!(msg.tell(), before);
    }

    /// Fixed-width strings truncate and NUL-pad on write, and decode back
    /// to the written prefix.
    #[test]
    fn fixed_strings_roundtrip_their_prefix(
        name in "[a-zA-Z]{0,30}",
    ) {
        let mut out = MessageOut::new(0x0096, ByteOrder::LittleEndian, FramePrefix::IdThenLength);
        out.write_string(&name, 24, "addressee");
        let bytes = out.finish();
        prop_assert_eq!(bytes.len(), 28);

        let mut msg = MessageIn::new(0x0096, &bytes, 4, 0, ByteOrder::LittleEndian);
        let decoded = msg.read_string(24, "addressee").unwrap();
        let expected: String = name.chars().take(24).collect();
        prop_assert_eq!(decoded, expected);
    }

    /// The length-first framer agrees with the encoder for any payload.
    #[test]
    fn solmara_frames_roundtrip(
        payload in prop::collection::vec(any::<u8>(), 0..200),
        id in any::<u16>(),
    ) {
        let mut out = MessageOut::new(id, ByteOrder::BigEndian, FramePrefix::LengthThenId);
        out.write_bytes(&payload, "payload");
        let frame = out.finish();

        match SolmaraProtocol.next_frame(&frame, 0).unwrap() {
            FrameDecision::Frame(info) => {
                prop_assert_eq!(info.id, id);
                prop_assert_eq!(info.total_len, frame.len());
            }
            other => return Err(TestCaseError::fail(format!("expected frame, got {other:?}"))),
        }
    }
}
