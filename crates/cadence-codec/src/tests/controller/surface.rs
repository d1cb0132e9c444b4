use std::sync::Arc;
use std::time::Duration;

use cadence_codec_core::channel::Surface;
use cadence_codec_core::status::Status;

use crate::config::CodecConfig;
use crate::events::CodecEvent;

use super::harness::{
    ChannelOp, RecordingChannel, TestComponent, TestStore, audio_decoder_format, bench, bench_with,
};

#[test]
fn create_input_surface_wires_producer() {
    let bench = bench(Arc::new(TestComponent::new("c2.test.codec")));
    bench.controller.initiate_create_input_surface();
    bench.wait_for_event(|event| matches!(event, CodecEvent::InputSurfaceCreated { .. }));

    let created = bench
        .recorded()
        .into_iter()
        .find_map(|event| match event {
            CodecEvent::InputSurfaceCreated {
                input_format,
                output_format,
                producer,
            } => Some((input_format, output_format, producer)),
            _ => None,
        })
        .expect("no creation event recorded");
    // Before configure both formats are still empty.
    assert!(created.0.is_empty());
    assert!(created.1.is_empty());
    assert_ne!(created.2.token(), 0);
    assert_eq!(bench.channel.ops(), vec![ChannelOp::SetGraphicBufferSource]);
}

#[test]
fn create_input_surface_echoes_configured_formats() {
    let bench = bench(Arc::new(TestComponent::new("c2.test.codec")));
    bench.allocate();
    bench.configure(audio_decoder_format());

    bench.controller.initiate_create_input_surface();
    bench.wait_for_event(|event| matches!(event, CodecEvent::InputSurfaceCreated { .. }));

    let created = bench
        .recorded()
        .into_iter()
        .find_map(|event| match event {
            CodecEvent::InputSurfaceCreated {
                input_format,
                output_format,
                ..
            } => Some((input_format, output_format)),
            _ => None,
        })
        .expect("no creation event recorded");
    assert_eq!(created.0.find_str("mime"), Some("audio/mp4a-latm"));
    assert_eq!(created.1.find_str("mime"), Some("audio/raw"));
}

#[test]
fn rejected_graphic_buffer_source_fails_creation() {
    let component = Arc::new(TestComponent::new("c2.test.codec"));
    let store = TestStore::new(Arc::clone(&component));
    let bench = bench_with(
        component,
        store,
        RecordingChannel::new().reject_graphic_buffer_source(),
        CodecConfig::default(),
        Duration::from_secs(60),
    );

    bench.controller.initiate_create_input_surface();
    bench.wait_for_event(|event| {
        matches!(
            event,
            CodecEvent::InputSurfaceCreationFailed {
                status: Status::Unknown,
            }
        )
    });
    assert!(bench.channel.ops().is_empty());
}

#[test]
fn persistent_input_surface_is_declined() {
    let bench = bench(Arc::new(TestComponent::new("c2.test.codec")));
    bench.controller.initiate_set_input_surface(Surface::new(9));
    bench.wait_for_event(|event| {
        matches!(
            event,
            CodecEvent::InputSurfaceDeclined {
                status: Status::Unsupported,
            }
        )
    });
    assert!(bench.channel.ops().is_empty());
}
