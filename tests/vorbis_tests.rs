//! End-to-end recording through libvorbis

mod common;

use std::f32::consts::TAU;
use std::io::Cursor;
use std::sync::Arc;

use common::{next, observe, Observed};
use ogg::reading::PacketReader;
use vorbis_recorder::application::{MediaRecorder, RecorderOptions};
use vorbis_recorder::domain::audio::Blob;
use vorbis_recorder::domain::recording::Quality;
use vorbis_recorder::infrastructure::ManualStream;

/// Every packet of the first logical stream in `data`
fn packets(data: &[u8]) -> Vec<ogg::Packet> {
    let mut reader = PacketReader::new(Cursor::new(data.to_vec()));
    let mut packets = Vec::new();
    while let Some(packet) = reader.read_packet().expect("valid ogg stream") {
        packets.push(packet);
    }
    packets
}

async fn record(stream: Arc<ManualStream>, options: RecorderOptions, blocks: &[Vec<Vec<f32>>]) -> Blob {
    let recorder = MediaRecorder::new(stream.clone(), options).unwrap();
    let mut events = observe(&recorder);

    recorder.start(None).unwrap();
    assert_eq!(next(&mut events).await, Observed::Start);

    for block in blocks {
        let channels: Vec<&[f32]> = block.iter().map(Vec::as_slice).collect();
        assert!(stream.process(&channels));
    }
    recorder.stop().unwrap();

    let blob = match next(&mut events).await {
        Observed::Data(blob) => blob,
        other => panic!("expected dataavailable, got {other:?}"),
    };
    assert_eq!(next(&mut events).await, Observed::Stop);
    blob
}

#[tokio::test]
async fn silent_mono_session_is_valid_ogg_vorbis() {
    let stream = Arc::new(ManualStream::new(1, 48_000));
    let silence = vec![vec![0.0f32; 4096]];
    let blob = record(stream, RecorderOptions::default(), &[silence.clone(), silence.clone(), silence]).await;

    assert_eq!(blob.mime_type().as_str(), "audio/ogg");
    assert!(blob.data().starts_with(b"OggS"));

    let packets = packets(blob.data());
    assert!(packets.len() > 3, "headers plus audio expected");
    assert!(packets[0].data.starts_with(b"\x01vorbis"));
    assert!(packets[1].data.starts_with(b"\x03vorbis"));
    assert!(packets[2].data.starts_with(b"\x05vorbis"));
    assert!(packets[0].first_in_stream());
    assert!(packets.last().unwrap().last_in_stream());
}

#[tokio::test]
async fn stereo_tone_keeps_stream_parameters() {
    let stream = Arc::new(ManualStream::new(2, 44_100));
    let blocks: Vec<Vec<Vec<f32>>> = (0..5)
        .map(|b| {
            let left: Vec<f32> = (0..2048)
                .map(|i| 0.5 * (TAU * 440.0 * (b * 2048 + i) as f32 / 44_100.0).sin())
                .collect();
            let right = left.iter().map(|s| -s).collect();
            vec![left, right]
        })
        .collect();

    let options = RecorderOptions::default().with_quality(Quality::new(0.5).unwrap());
    let blob = record(stream, options, &blocks).await;

    let packets = packets(blob.data());
    let ident = &packets[0].data;
    // Identification header: channels at byte 11, sample rate at 12..16
    assert_eq!(ident[11], 2);
    assert_eq!(u32::from_le_bytes([ident[12], ident[13], ident[14], ident[15]]), 44_100);

    let serials: Vec<u32> = packets.iter().map(|p| p.stream_serial()).collect();
    assert!(serials.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(packets.last().unwrap().absgp_page(), 5 * 2048);
}

#[tokio::test]
async fn empty_session_still_produces_headers() {
    let stream = Arc::new(ManualStream::new(1, 48_000));
    let blob = record(stream, RecorderOptions::default(), &[]).await;

    let packets = packets(blob.data());
    assert!(packets.len() >= 3);
    assert!(packets[0].data.starts_with(b"\x01vorbis"));
}
