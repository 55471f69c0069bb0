//! Property tests for frame assembly under arbitrary line fragmentation.

use premaid_protocol::{Frame, FrameAssembler, TelemetryPage, TELEMETRY_LENGTH};
use proptest::prelude::*;

fn telemetry_hex(first_id: u8, raw: &[i16]) -> String {
    let mut bytes = vec![TELEMETRY_LENGTH, 0x01, 0x00];
    for (slot, value) in raw.iter().enumerate() {
        bytes.push(first_id + slot as u8);
        bytes.push(0x80);
        bytes.extend_from_slice(&value.to_le_bytes());
        bytes.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0; 6]);
    }
    bytes.push(0x5A);
    hex::encode_upper(bytes)
}

/// Split `text` at the given cut points (sorted, deduplicated, in range).
fn split_at_cuts(text: &str, cuts: &[usize]) -> Vec<String> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (text.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut pieces = Vec::new();
    let mut start = 0;
    for cut in cuts {
        pieces.push(text[start..cut].to_string());
        start = cut;
    }
    pieces.push(text[start..].to_string());
    pieces
}

fn assemble_all(pieces: &[String]) -> Vec<Frame> {
    let mut assembler = FrameAssembler::new();
    let mut frames = Vec::new();
    for piece in pieces {
        if let Some(frame) = assembler.feed(piece) {
            frames.push(frame);
        }
    }
    // Drain anything left by the one-frame-per-feed rule.
    while let Some(frame) = assembler.feed("") {
        frames.push(frame);
    }
    frames
}

proptest! {
    #[test]
    fn fragmented_frame_matches_whole(
        raw in proptest::collection::vec(any::<i16>(), 16),
        cuts in proptest::collection::vec(any::<usize>(), 0..64),
    ) {
        let text = telemetry_hex(0x00, &raw);
        let whole = Frame::from_hex(&text).unwrap();

        let frames = assemble_all(&split_at_cuts(&text, &cuts));
        prop_assert_eq!(frames.len(), 1);
        prop_assert_eq!(&frames[0], &whole);

        let page = TelemetryPage::decode(&frames[0]).unwrap();
        let decoded: Vec<i16> = page.samples().iter().map(|s| s.raw).collect();
        prop_assert_eq!(decoded, raw);
    }

    #[test]
    fn back_to_back_frames_survive_fragmentation(
        cuts in proptest::collection::vec(any::<usize>(), 0..64),
    ) {
        let low = telemetry_hex(0x00, &[1; 16]);
        let high = telemetry_hex(0x10, &[2; 16]);
        let text = format!("{}{}", low, high);

        let frames = assemble_all(&split_at_cuts(&text, &cuts));
        prop_assert_eq!(frames.len(), 2);
        prop_assert_eq!(&frames[0], &Frame::from_hex(&low).unwrap());
        prop_assert_eq!(&frames[1], &Frame::from_hex(&high).unwrap());
    }
}

#[test]
fn one_character_at_a_time() {
    let text = telemetry_hex(0x10, &[-1; 16]);
    let mut assembler = FrameAssembler::new();

    let mut frames = Vec::new();
    for ch in text.chars() {
        if let Some(frame) = assembler.feed(&ch.to_string()) {
            frames.push(frame);
        }
    }

    assert_eq!(frames, vec![Frame::from_hex(&text).unwrap()]);
    assert_eq!(assembler.buffered_len(), 0);
}

#[test]
fn zero_length_byte_then_recovery() {
    let text = telemetry_hex(0x00, &[42; 16]);
    let mut assembler = FrameAssembler::new();

    // A corrupt length byte discards everything behind it, including a
    // partial frame that followed.
    assert!(assembler.feed(&format!("00{}", &text[..100])).is_none());
    assert_eq!(assembler.buffered_len(), 0);
    assert_eq!(assembler.desync_count(), 1);

    let frame = assembler.feed(&text).expect("frame after resync");
    let page = TelemetryPage::decode(&frame).unwrap();
    assert!(page.samples().iter().all(|s| s.raw == 42));
}
