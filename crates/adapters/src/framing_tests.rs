// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Sample {
    channel: u64,
    body: String,
}

#[tokio::test]
async fn write_then_read_frame_roundtrips() {
    let value = Sample {
        channel: 7,
        body: "hello".to_string(),
    };
    let (mut client, mut server) = tokio::io::duplex(256);

    write_message(&mut client, &value, std::time::Duration::from_secs(1))
        .await
        .unwrap();
    let decoded: Sample = read_message(&mut server, std::time::Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(decoded, value);
}

#[tokio::test]
async fn read_frame_on_empty_stream_reports_connection_closed() {
    let (client, mut server) = tokio::io::duplex(64);
    drop(client);

    let err = read_frame(&mut server).await.unwrap_err();
    assert!(matches!(err, FrameError::ConnectionClosed));
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected_before_allocating() {
    let (mut client, mut server) = tokio::io::duplex(64);
    let too_big = (MAX_FRAME_SIZE as u32) + 1;
    client.write_all(&too_big.to_be_bytes()).await.unwrap();

    let err = read_frame(&mut server).await.unwrap_err();
    assert!(matches!(err, FrameError::TooLarge { .. }));
}

#[tokio::test]
async fn read_message_times_out_when_peer_sends_nothing() {
    let (_client, mut server) = tokio::io::duplex(64);
    let err = read_message::<Sample, _>(&mut server, std::time::Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, FrameError::Timeout));
}

#[test]
fn encode_decode_roundtrips_without_framing() {
    let value = Sample {
        channel: 1,
        body: "x".repeat(1000),
    };
    let bytes = encode(&value).unwrap();
    let decoded: Sample = decode(&bytes).unwrap();
    assert_eq!(decoded, value);
}
