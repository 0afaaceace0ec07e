//! Unit tests for frame extraction.

use bytes::{BufMut, BytesMut};
use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    prop_assert_eq,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rstest::rstest;
use tokio_util::codec::Decoder;

use super::*;

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

fn wire(frames: &[Frame]) -> Vec<u8> {
    let decoder = FrameDecoder::default();
    let mut out = BytesMut::new();
    for frame in frames {
        decoder.encode(frame, &mut out).expect("encode frame");
    }
    out.to_vec()
}

fn collect(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Frame> {
    decoder
        .feed(bytes)
        .map(|res| res.expect("frame should decode"))
        .collect()
}

fn frame_strategy() -> impl Strategy<Value = Frame> {
    ("[a-z]{0,16}", vec(any::<u8>(), 0..200))
        .prop_map(|(context, payload)| Frame::new(context, payload))
}

#[test]
fn encodes_prefix_in_network_order() {
    let bytes = wire(&[Frame::new("ping", &b"{}"[..])]);
    assert_eq!(&bytes[..4], &[0, 0, 0, 7]);
    assert_eq!(bytes[4], 4);
    assert_eq!(&bytes[5..9], b"ping");
    assert_eq!(&bytes[9..], b"{}");
}

#[test]
fn frame_split_across_chunks_is_produced_once_after_completion() {
    let bytes = wire(&[Frame::new("playervolume", &b"55"[..])]);
    let mut decoder = FrameDecoder::default();

    assert!(collect(&mut decoder, &bytes[..7]).is_empty());
    assert_eq!(decoder.buffered_len(), 7);

    let frames = collect(&mut decoder, &bytes[7..]);
    assert_eq!(frames, vec![Frame::new("playervolume", &b"55"[..])]);
    assert_eq!(decoder.buffered_len(), 0);
}

#[test]
fn back_to_back_frames_keep_arrival_order() {
    let expected = vec![
        Frame::new("playerstate", &b"\"playing\""[..]),
        Frame::new("playermute", &b"true"[..]),
    ];
    let mut decoder = FrameDecoder::default();
    assert_eq!(collect(&mut decoder, &wire(&expected)), expected);
}

#[test]
fn unconsumed_frames_carry_over_to_next_feed() {
    let expected = vec![Frame::new("ping", &b""[..]), Frame::new("pong", &b""[..])];
    let mut decoder = FrameDecoder::default();
    let first = decoder.feed(&wire(&expected)).next();
    assert_eq!(first.map(Result::unwrap), Some(expected[0].clone()));

    assert_eq!(collect(&mut decoder, &[]), expected[1..].to_vec());
}

#[rstest]
#[case(65)]
#[case(4096)]
#[case(u32::MAX as usize)]
fn oversized_declaration_discards_buffer(#[case] declared: usize) {
    let mut decoder = FrameDecoder::new(64);
    let mut bytes = BytesMut::new();
    bytes.put_u32(u32::try_from(declared).expect("declared length fits u32"));
    bytes.extend_from_slice(&[0xAA; 32]);

    let results: Vec<_> = decoder.feed(&bytes).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(FrameError::TooLarge { size, max: 64 }) if size == declared
    ));
    assert_eq!(decoder.buffered_len(), 0);
}

#[test]
fn decoder_recovers_after_oversized_frame() {
    let mut decoder = FrameDecoder::new(64);
    let mut bytes = BytesMut::new();
    bytes.put_u32(1000);
    assert!(decoder.feed(&bytes).next().is_some_and(|r| r.is_err()));

    let ping = Frame::new("ping", &b""[..]);
    assert_eq!(collect(&mut decoder, &wire(&[ping.clone()])), vec![ping]);
}

#[rstest]
#[case::empty_body(vec![0, 0, 0, 0])]
#[case::context_overrun(vec![0, 0, 0, 2, 9, b'a'])]
#[case::bad_utf8(vec![0, 0, 0, 3, 2, 0xC3, 0x28])]
fn malformed_header_skips_only_that_frame(#[case] bad: Vec<u8>) {
    let ping = Frame::new("ping", &b""[..]);
    let mut bytes = bad;
    bytes.extend(wire(&[ping.clone()]));

    let mut decoder = FrameDecoder::default();
    let results: Vec<_> = decoder.feed(&bytes).collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0],
        Err(FrameError::MalformedHeader { .. })
    ));
    assert_eq!(results[1].as_ref().expect("ping decodes"), &ping);
}

#[test]
fn encode_rejects_long_context() {
    let frame = Frame::new("x".repeat(256), &b""[..]);
    let err = FrameDecoder::default()
        .encode(&frame, &mut BytesMut::new())
        .expect_err("context longer than 255 bytes");
    assert!(matches!(err, FrameError::ContextTooLong { len: 256 }));
}

#[test]
fn encode_rejects_body_over_limit() {
    let frame = Frame::new("nowplayingcover", vec![0u8; 128]);
    let err = FrameDecoder::new(64)
        .encode(&frame, &mut BytesMut::new())
        .expect_err("body larger than limit");
    assert!(matches!(err, FrameError::TooLarge { max: 64, .. }));
}

#[rstest]
#[case(0, MIN_FRAME_LENGTH)]
#[case(1024, 1024)]
#[case(usize::MAX, MAX_FRAME_LENGTH)]
fn max_frame_length_is_clamped(#[case] requested: usize, #[case] expected: usize) {
    assert_eq!(FrameDecoder::new(requested).max_frame_length(), expected);
}

#[rstest]
#[case::mid_header(vec![0, 0], None)]
#[case::mid_body(vec![0, 0, 0, 9, 4, b'p'], Some(9))]
fn eof_with_partial_frame_is_reported(#[case] bytes: Vec<u8>, #[case] expected: Option<usize>) {
    let mut codec = FrameCodec::default();
    let mut buf = BytesMut::from(&bytes[..]);
    let err = codec.decode_eof(&mut buf).expect_err("partial frame at EOF");
    assert!(matches!(
        err,
        FrameError::TruncatedAtEof { bytes_received, expected: e }
            if bytes_received == bytes.len() && e == expected
    ));
}

#[test]
fn clean_eof_yields_nothing() {
    let mut codec = FrameCodec::default();
    assert!(matches!(codec.decode_eof(&mut BytesMut::new()), Ok(None)));
}

#[test]
fn chunk_boundaries_do_not_change_decoded_frames() {
    let mut runner = deterministic_runner(128);
    let strategy = (vec(frame_strategy(), 1..8), vec(1usize..24, 1..32));

    runner
        .run(&strategy, |(frames, cuts)| {
            let bytes = wire(&frames);

            let mut whole = FrameDecoder::default();
            let at_once = whole
                .feed(&bytes)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?;

            let mut chunked = FrameDecoder::default();
            let mut pieces = Vec::new();
            let mut rest = &bytes[..];
            for cut in cuts.iter().cycle() {
                if rest.is_empty() {
                    break;
                }
                let (head, tail) = rest.split_at((*cut).min(rest.len()));
                for frame in chunked.feed(head) {
                    pieces.push(
                        frame.map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?,
                    );
                }
                rest = tail;
            }

            prop_assert_eq!(&at_once, &frames);
            prop_assert_eq!(&pieces, &frames);
            prop_assert_eq!(chunked.buffered_len(), 0);
            Ok(())
        })
        .expect("chunked decoding should match whole-stream decoding");
}
