//! Property tests for the frame decoder

use dragoonplot::codec::{DataFrame, Event, FrameDecoder, LabelEntry, LabelFrame};
use proptest::prelude::*;
use std::time::Duration;

fn decode_all(chunks: &[&[u8]]) -> Vec<Event> {
    let mut decoder = FrameDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.feed(chunk, Duration::ZERO));
    }
    events.extend(decoder.close());
    events
}

fn split_at_points<'a>(bytes: &'a [u8], points: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = points.iter().map(|p| p % (bytes.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(&bytes[start..cut]);
        start = cut;
    }
    chunks.push(&bytes[start..]);
    chunks
}

prop_compose! {
    fn arb_data_frame()(values in prop::collection::vec(any::<i16>(), 1..=32)) -> DataFrame {
        DataFrame::new(values).unwrap()
    }
}

prop_compose! {
    fn arb_label_frame()(
        entries in prop::collection::vec((0u8..32, "[A-Za-z0-9_]{1,16}"), 1..=8)
    ) -> LabelFrame {
        LabelFrame::new(
            entries
                .into_iter()
                .map(|(channel, name)| LabelEntry::new(channel, name))
                .collect(),
        )
        .unwrap()
    }
}

/// Bytes that can never start a frame
fn arb_garbage() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("frame marker", |b| *b != 0xAA && *b != 0xAB), 0..64)
}

proptest! {
    #[test]
    fn prop_chunking_transparency(
        bytes in prop::collection::vec(any::<u8>(), 0..512),
        points in prop::collection::vec(any::<usize>(), 0..16),
    ) {
        let whole = decode_all(&[&bytes]);
        let chunked = decode_all(&split_at_points(&bytes, &points));
        prop_assert_eq!(whole, chunked);
    }

    #[test]
    fn prop_chunking_transparency_framed(
        frames in prop::collection::vec(arb_data_frame(), 1..8),
        text in "[a-z ]{0,20}\r\n",
        points in prop::collection::vec(any::<usize>(), 0..16),
    ) {
        let mut bytes = Vec::new();
        for frame in &frames {
            frame.encode_into(&mut bytes);
        }
        bytes.extend_from_slice(text.as_bytes());

        let whole = decode_all(&[&bytes]);
        let chunked = decode_all(&split_at_points(&bytes, &points));
        prop_assert_eq!(&whole, &chunked);

        let decoded: Vec<_> = whole
            .iter()
            .filter_map(|e| match e {
                Event::Data(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect();
        prop_assert_eq!(decoded, frames);
    }

    #[test]
    fn prop_resync_progress(garbage in arb_garbage(), frame in arb_data_frame()) {
        let mut bytes = garbage;
        frame.encode_into(&mut bytes);

        let events = decode_all(&[&bytes]);
        prop_assert!(events.contains(&Event::Data(frame)));
    }

    #[test]
    fn prop_resync_after_invalid_count(
        bad_count in prop_oneof![Just(0u8), 33u8..=255],
        frame in arb_data_frame(),
    ) {
        // A rejected header must not swallow the frame that follows it
        let mut bytes = vec![0xAA, bad_count];
        frame.encode_into(&mut bytes);

        let events = decode_all(&[&bytes]);
        prop_assert!(matches!(events[0], Event::Resync(_)));
        prop_assert!(events.contains(&Event::Data(frame)));
    }

    #[test]
    fn prop_data_frame_round_trip(frame in arb_data_frame()) {
        let mut bytes = Vec::new();
        frame.encode_into(&mut bytes);
        prop_assert_eq!(bytes.len(), 2 + frame.values().len() * 2);

        let events = decode_all(&[&bytes]);
        prop_assert_eq!(events, vec![Event::Data(frame)]);
    }

    #[test]
    fn prop_label_frame_round_trip(frame in arb_label_frame()) {
        let mut bytes = Vec::new();
        frame.encode_into(&mut bytes);

        let events = decode_all(&[&bytes]);
        prop_assert_eq!(events, vec![Event::Label(frame)]);
    }
}
