//! Behavior every format shares through the session interface.
//!
//! Each test runs against all formats: results must not depend on buffer
//! splits, buffer errors must leave the session usable, and data errors must
//! end it.

use mscomp::{
    CompressionLevel, ErrorKind, Flush, Format, Mode, MsCompError, Session, Status, StreamIo,
    compress_to_vec, decompress_to_vec, start,
};
use proptest::prelude::*;

fn pump(session: &mut Session, data: &[u8], in_step: usize, out_step: usize) -> Vec<u8> {
    let mut output = Vec::new();
    let mut out = vec![0u8; out_step];
    let mut pos = 0;

    loop {
        let end = (pos + in_step).min(data.len());
        let flush = if end == data.len() {
            Flush::Finish
        } else {
            Flush::None
        };
        let (consumed, produced, status) = session
            .process(&data[pos..end], &mut out, flush)
            .expect("stream step failed");
        pos += consumed;
        output.extend_from_slice(&out[..produced]);
        if status == Status::StreamEnd {
            break;
        }
    }

    session
        .end(&mut StreamIo::new(&[], &mut []))
        .expect("end failed");
    output
}

fn corpus(size: usize) -> Vec<u8> {
    let text = b"It was the best of times, it was the worst of times, it was the age of \
                 wisdom, it was the age of foolishness, it was the epoch of belief. ";
    let mut data: Vec<u8> = text.iter().copied().cycle().take(size).collect();
    for (i, b) in data.iter_mut().enumerate().step_by(97) {
        *b = (i % 251) as u8;
    }
    data
}

// ============================================================================
// Buffer protocol
// ============================================================================

#[test]
fn test_ten_ten_five_every_format() {
    let data = b"0123456789abcdefghijklmno";
    for format in Format::ALL {
        let packed = compress_to_vec(format, CompressionLevel::DEFAULT, data).unwrap();
        let mut session = start(Mode::Decompress, format);
        let mut out = [0u8; 10];
        let mut pos = 0;
        let mut produced = Vec::new();

        let steps = [
            (10, Status::Ok, 10),
            (10, Status::Ok, 20),
            (5, Status::StreamEnd, 25),
        ];
        for (expected, status, total_out) in steps {
            let (consumed, n, s) = session
                .process(&packed[pos..], &mut out, Flush::Finish)
                .unwrap();
            pos += consumed;
            produced.extend_from_slice(&out[..n]);
            assert_eq!((n, s), (expected, status), "{}", format);
            assert_eq!(session.total_out(), total_out, "{}", format);
            assert_eq!(session.total_in(), pos as u64, "{}", format);
        }
        assert_eq!(produced, data);
        assert_eq!(pos, packed.len(), "{}", format);
    }
}

#[test]
fn test_one_byte_windows() {
    let data = corpus(20_000);
    for format in Format::ALL {
        let packed = compress_to_vec(format, CompressionLevel::DEFAULT, &data).unwrap();

        let mut encoder = start(Mode::Compress, format);
        assert_eq!(pump(&mut encoder, &data, 1, 1), packed, "{}", format);

        let mut decoder = start(Mode::Decompress, format);
        assert_eq!(pump(&mut decoder, &packed, 1, 1), data, "{}", format);
    }
}

#[test]
fn test_totals_track_bytes() {
    let data = corpus(5_000);
    for format in Format::ALL {
        let mut session = start(Mode::Compress, format);
        let packed = pump(&mut session, &data, 333, 77);
        assert_eq!(session.total_in(), data.len() as u64);
        assert_eq!(session.total_out(), packed.len() as u64);
    }
}

// ============================================================================
// Error kinds
// ============================================================================

#[test]
fn test_end_needs_room_and_keeps_session() {
    let data = corpus(3_000);
    for format in Format::ALL {
        let mut session = start(Mode::Compress, format);
        let mut out = [0u8; 5];
        let (consumed, _, _) = session.process(&data, &mut out, Flush::None).unwrap();

        let mut io = StreamIo::new(&[], &mut []);
        match session.end(&mut io) {
            // Nothing staged: the stored format has nothing to flush.
            Ok(()) => assert_eq!(format, Format::None),
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::Buffer, "{}", format);
                assert!(!session.is_ended());
                let mut big = vec![0u8; 8192];
                let mut io = StreamIo::new(&[], &mut big);
                session.end(&mut io).unwrap();
            }
        }
        assert!(session.is_ended());
        assert!(consumed > 0);
    }
}

#[test]
fn test_zero_output_is_buffer_error() {
    for format in [Format::Lznt1, Format::Xpress] {
        let packed = compress_to_vec(format, CompressionLevel::DEFAULT, b"abcabcabc").unwrap();
        let mut session = start(Mode::Decompress, format);
        let mut out = [0u8; 4];
        session.process(&packed, &mut out, Flush::Finish).unwrap();

        let err = session.process(&[], &mut [], Flush::Finish).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Buffer, "{}", format);

        // Same call with room succeeds.
        let (_, n, status) = session.process(&[], &mut out, Flush::Finish).unwrap();
        assert_eq!((n, status), (4, Status::Ok));
    }
}

#[test]
fn test_distance_past_output_is_data_error() {
    let streams: [(Format, &[u8]); 2] = [
        (Format::Lznt1, &[0x03, 0xB0, 0x02, b'A', 0x00, 0x10]),
        (Format::Xpress, &[0xFF, 0xFF, 0xFF, 0x7F, b'A', 0x08, 0x00]),
    ];
    for (format, stream) in streams {
        let err = decompress_to_vec(format, stream).unwrap_err();
        assert!(
            matches!(err, MsCompError::InvalidDistance { distance: 2, history_size: 1 }),
            "{}: {}",
            format,
            err
        );
        assert_eq!(err.kind(), ErrorKind::Data);
    }
}

#[test]
fn test_data_error_is_terminal() {
    let mut session = start(Mode::Decompress, Format::Xpress);
    let mut out = [0u8; 32];
    let bad = [0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00];
    assert_eq!(
        session.process(&bad, &mut out, Flush::None).unwrap_err().kind(),
        ErrorKind::Data
    );
    assert_eq!(
        session.process(&[], &mut out, Flush::Finish).unwrap_err().kind(),
        ErrorKind::Arg
    );
}

#[test]
fn test_argument_errors_leave_state_alone() {
    let data = corpus(100);
    for format in Format::ALL {
        let mut session = start(Mode::Compress, format);
        let mut out = [0u8; 4];
        let mut io = StreamIo::new(&data, &mut out);
        let err = session.inflate(&mut io).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arg);
        assert_eq!((io.consumed(), io.produced()), (0, 0));
        assert_eq!(session.total_in(), 0);

        assert_eq!(
            session.expect(Mode::Compress, Format::Xpress).is_ok(),
            format == Format::Xpress
        );
    }
}

#[test]
fn test_calls_after_end_are_argument_errors() {
    for format in Format::ALL {
        let mut session = start(Mode::Compress, format);
        let mut out = vec![0u8; 64];
        let (_, _, status) = session.process(b"abc", &mut out, Flush::Finish).unwrap();
        assert_eq!(status, Status::StreamEnd);

        let err = session.process(b"more", &mut out, Flush::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arg);

        session.end(&mut StreamIo::new(&[], &mut [])).unwrap();
        let err = session.end(&mut StreamIo::new(&[], &mut [])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arg);
    }
}

// ============================================================================
// Properties
// ============================================================================

fn format_strategy() -> impl Strategy<Value = Format> {
    prop_oneof![Just(Format::None), Just(Format::Lznt1), Just(Format::Xpress)]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_chunking_never_changes_output(
        format in format_strategy(),
        size in 0usize..30_000,
        in_step in 1usize..3_000,
        out_step in 1usize..3_000,
    ) {
        let data = corpus(size);
        let packed = compress_to_vec(format, CompressionLevel::DEFAULT, &data).unwrap();

        let mut encoder = start(Mode::Compress, format);
        prop_assert_eq!(&pump(&mut encoder, &data, in_step, out_step), &packed);

        let mut decoder = start(Mode::Decompress, format);
        prop_assert_eq!(pump(&mut decoder, &packed, in_step, out_step), data);
    }

    #[test]
    fn prop_roundtrip_any_bytes(
        format in format_strategy(),
        level in 0u8..=9,
        data in prop::collection::vec(any::<u8>(), 0..20_000),
    ) {
        let packed = compress_to_vec(format, CompressionLevel::new(level), &data).unwrap();
        prop_assert_eq!(decompress_to_vec(format, &packed).unwrap(), data);
    }

    #[test]
    fn prop_garbage_never_panics(
        format in format_strategy(),
        data in prop::collection::vec(any::<u8>(), 0..2_000),
    ) {
        if let Err(e) = decompress_to_vec(format, &data) {
            prop_assert_eq!(e.kind(), ErrorKind::Data);
        }
    }
}
