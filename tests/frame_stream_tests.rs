use rand::Rng;
use vicemon::constants::BROADCAST_REQUEST_ID;
use vicemon::frame::{FrameCodec, FrameDecodeError, FrameStreamDecoder, MalformedFrame, RawResponse};

fn sample_stream() -> (Vec<u8>, Vec<(u32, u8, Vec<u8>)>) {
    let frames = vec![
        (1, 0x81, vec![]),
        (2, 0x85, vec![3, 12, 1, b'3', b'.', b'1', b'2', 0]),
        (BROADCAST_REQUEST_ID, 0x62, vec![0x00, 0xc0]),
        (3, 0x01, {
            let mut body = vec![0x00, 0x01];
            body.extend((0..=255u8).collect::<Vec<_>>());
            body
        }),
        (4, 0x02, vec![]),
    ];

    let mut bytes = Vec::new();
    for (id, kind, body) in &frames {
        bytes.extend(FrameCodec::encode_response(*id, *kind, 0, body));
    }

    (bytes, frames)
}

fn summarize(responses: &[RawResponse]) -> Vec<(u32, u8, Vec<u8>)> {
    responses
        .iter()
        .map(|r| (r.request_id(), r.response_type(), r.body.clone()))
        .collect()
}

#[test]
fn decoder_emits_all_frames_from_one_chunk() {
    let (bytes, expected) = sample_stream();
    let mut decoder = FrameStreamDecoder::new();

    let decoded: Vec<RawResponse> = decoder
        .read_bytes(&bytes)
        .map(|result| result.expect("valid frame"))
        .collect();

    assert_eq!(summarize(&decoded), expected);
    assert_eq!(decoder.buffered_len(), 0);
}

#[test]
fn decoder_reassembles_random_chunk_sizes() {
    let (bytes, expected) = sample_stream();
    let mut rng = rand::rng();

    for _ in 0..50 {
        let mut decoder = FrameStreamDecoder::new();
        let mut decoded = Vec::new();
        let mut offset = 0;

        while offset < bytes.len() {
            let len = rng.random_range(1..=17).min(bytes.len() - offset);
            for result in decoder.read_bytes(&bytes[offset..offset + len]) {
                decoded.push(result.expect("valid frame"));
            }
            offset += len;
        }

        assert_eq!(summarize(&decoded), expected);
    }
}

#[test]
fn decoder_holds_partial_frame_until_complete() {
    let frame = FrameCodec::encode_response(7, 0x85, 0, &[3, 12, 1, b'x', 0]);
    let (head, tail) = frame.split_at(frame.len() - 1);

    let mut decoder = FrameStreamDecoder::new();
    assert_eq!(decoder.read_bytes(head).count(), 0);
    assert_eq!(decoder.buffered_len(), head.len());

    let decoded: Vec<_> = decoder.read_bytes(tail).collect();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].as_ref().unwrap().request_id(), 7);
}

#[test]
fn bad_start_marker_faults_the_stream() {
    let good = FrameCodec::encode_response(1, 0x81, 0, &[]);
    let mut bad = FrameCodec::encode_response(2, 0x81, 0, &[]);
    bad[0] = 0x00;

    let mut bytes = good.clone();
    bytes.extend(&bad);
    bytes.extend(&good);

    let mut decoder = FrameStreamDecoder::new();
    let results: Vec<_> = decoder.read_bytes(&bytes).collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1],
        Err(FrameDecodeError::MalformedFrame(
            MalformedFrame::BadStartMarker(0x00)
        ))
    );
    assert!(decoder.is_faulted());

    // No resynchronization: even a well-formed frame is refused afterwards.
    let after: Vec<_> = decoder.read_bytes(&good).collect();
    assert_eq!(after, vec![Err(FrameDecodeError::MalformedFrame(MalformedFrame::StreamFaulted))]);
}
