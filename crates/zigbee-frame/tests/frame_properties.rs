//! Wire-level properties of the frame codec.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use zigbee_frame::{
    needs_escape, ApiFrame, FrameCodec, FrameError, ESCAPE, ESCAPE_XOR, FRAME_HEADER_LEN,
    START_DELIMITER,
};

fn decode_one(bytes: &[u8]) -> Result<Option<zigbee_frame::Frame>, FrameError> {
    let mut codec = FrameCodec::new();
    codec.push(bytes);
    codec.decode()
}

#[test]
fn test_round_trip_random_payloads() {
    let mut rng = StdRng::seed_from_u64(0x7E7D);
    for len in (0..600).chain([4096, 20_000, 65_534]) {
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let frame_type: u8 = rng.gen();

        let encoded = FrameCodec::encode(frame_type, &payload).unwrap();
        let frame = decode_one(&encoded).unwrap().expect("complete frame");

        assert_eq!(frame.frame_type, frame_type);
        assert_eq!(frame.payload, payload, "payload length {}", len);
    }
}

#[test]
fn test_every_frame_type_round_trips() {
    for frame_type in 0..=255u8 {
        let encoded = FrameCodec::encode(frame_type, b"\x7e\x7d\x11\x13").unwrap();
        let frame = decode_one(&encoded).unwrap().unwrap();
        assert_eq!(frame.frame_type, frame_type);
        assert_eq!(frame.payload, b"\x7e\x7d\x11\x13");
    }
}

#[test]
fn test_each_reserved_byte_escaped_once() {
    for reserved in [0x7E, 0x7D, 0x11, 0x13] {
        let payload = [0x01, reserved, 0x02];
        let encoded = FrameCodec::encode(0x10, &payload).unwrap();

        // Only the one reserved payload byte gets a prefix
        let body = &encoded[FRAME_HEADER_LEN..];
        assert!(!needs_escape(*body.last().unwrap()));
        assert_eq!(body.iter().filter(|&&b| b == ESCAPE).count(), 1);
        let at = body.iter().position(|&b| b == ESCAPE).unwrap();
        assert_eq!(body[at + 1], reserved ^ ESCAPE_XOR);

        // No raw delimiter after the first byte
        assert!(!encoded[1..].contains(&START_DELIMITER));

        let frame = decode_one(&encoded).unwrap().unwrap();
        assert_eq!(frame.payload, payload);
    }
}

#[test]
fn test_single_bit_flip_fails_checksum() {
    let mut rng = StdRng::seed_from_u64(42);
    let payload: Vec<u8> = (0..48).map(|_| rng.gen()).collect();
    let encoded = FrameCodec::encode(0x91, &payload).unwrap();

    for pos in FRAME_HEADER_LEN..encoded.len() {
        if encoded[pos] == ESCAPE {
            continue;
        }
        for bit in 0..8 {
            let mut mutated = encoded.clone();
            mutated[pos] ^= 1 << bit;
            if matches!(mutated[pos], START_DELIMITER | ESCAPE) {
                continue;
            }
            match decode_one(&mutated) {
                Err(FrameError::ChecksumMismatch { .. }) => {}
                other => panic!("pos {} bit {}: expected checksum error, got {:?}", pos, bit, other),
            }
        }
    }
}

#[test]
fn test_stream_of_frames_in_arrival_order() {
    let payloads: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i; i as usize + 1]).collect();
    let mut stream = vec![0x00, 0x13, 0x55];
    for payload in &payloads {
        stream.extend(FrameCodec::encode(0x90, payload).unwrap());
    }

    // Feed in awkward chunk sizes
    let mut codec = FrameCodec::new();
    let mut decoded = Vec::new();
    for chunk in stream.chunks(7) {
        codec.push(chunk);
        while let Some(frame) = codec.decode().unwrap() {
            decoded.push(frame.payload);
        }
    }
    assert_eq!(decoded, payloads);
}

#[test]
fn test_hub_version_request_frame() {
    // Hub asking a device for its version info
    let expected: &[u8] = b"~\x00\x17}1\x00\x00}3\xa2\x00@\xa2;\tRK\x02\x02\x00\xf6\xc2\x16\x00\x00}1\x00\xfc\x97";

    let frame = decode_one(expected).unwrap().unwrap();
    let api = ApiFrame::decode(&frame).unwrap();
    assert_eq!(api.id(), "tx_explicit");
    match &api {
        ApiFrame::TxExplicit(tx) => {
            assert_eq!(tx.dest_addr_long.to_string(), "00:13:a2:00:40:a2:3b:09");
            assert_eq!(tx.dest_addr.as_bytes(), b"RK");
            assert_eq!(tx.cluster, 0x00F6);
            assert_eq!(tx.data, b"\x11\x00\xfc");
        }
        other => panic!("Expected TxExplicit, got {:?}", other),
    }
    assert_eq!(api.encode().unwrap(), expected);
}
