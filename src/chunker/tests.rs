// silence-chunker - chunk an audio stream by silence (Tests)
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

#[cfg(test)]
use super::*;

#[cfg(test)]
use gst::prelude::*;

#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
#[test]
fn defaults() {
    gst::init().unwrap();

    let chunker = Chunker::builder().build();

    assert_eq!(chunker.property::<String>("input"), INPUT_MIC);
    assert_eq!(chunker.property::<Option<String>>("output"), None);
    assert_eq!(chunker.property::<Option<String>>("muxer"), None);
    assert_eq!(chunker.property::<i32>("rate"), DEFAULT_RATE);
    assert_eq!(
        chunker.property::<u64>("maximum-chunk-time"),
        DEFAULT_MAXIMUM_CHUNK_TIME.nseconds()
    );
    assert_eq!(
        chunker.property::<u64>("minimum-silence-time"),
        DEFAULT_MINIMUM_SILENCE_TIME.nseconds()
    );
    assert_eq!(
        chunker.property::<u64>("silence-hysteresis"),
        DEFAULT_SILENCE_HYSTERESIS
    );
    assert_eq!(
        chunker.property::<i32>("silence-threshold"),
        DEFAULT_SILENCE_THRESHOLD
    );
    assert!(!chunker.is_playing());
}

#[cfg(test)]
#[test]
fn new_sets_construct_properties() {
    gst::init().unwrap();

    let chunker = Chunker::new("sample.wav", "chunks/%02d.wav", "wavenc");

    assert_eq!(chunker.property::<String>("input"), "sample.wav");
    assert_eq!(
        chunker.property::<Option<String>>("output").as_deref(),
        Some("chunks/%02d.wav")
    );
    assert_eq!(
        chunker.property::<Option<String>>("muxer").as_deref(),
        Some("wavenc")
    );
}

#[cfg(test)]
#[test]
fn builder_overrides() {
    gst::init().unwrap();

    let chunker = Chunker::builder()
        .input("speech.ogg")
        .output("out/%05d.wav")
        .muxer("wavenc")
        .rate(8_000)
        .maximum_chunk_time(gst::ClockTime::from_seconds(2))
        .minimum_silence_time(gst::ClockTime::from_mseconds(250))
        .silence_hysteresis(960)
        .silence_threshold(-40)
        .build();

    assert_eq!(chunker.property::<String>("input"), "speech.ogg");
    assert_eq!(
        chunker.property::<Option<String>>("output").as_deref(),
        Some("out/%05d.wav")
    );
    assert_eq!(
        chunker.property::<Option<String>>("muxer").as_deref(),
        Some("wavenc")
    );
    assert_eq!(chunker.property::<i32>("rate"), 8_000);
    assert_eq!(
        chunker.property::<u64>("maximum-chunk-time"),
        gst::ClockTime::from_seconds(2).nseconds()
    );
    assert_eq!(
        chunker.property::<u64>("minimum-silence-time"),
        gst::ClockTime::from_mseconds(250).nseconds()
    );
    assert_eq!(chunker.property::<u64>("silence-hysteresis"), 960);
    assert_eq!(chunker.property::<i32>("silence-threshold"), -40);
}

// Without a custom sink, output and muxer are mandatory, so the pipeline can
// never be built and play() must refuse to start.
#[cfg(test)]
#[test]
fn play_refuses_without_output_and_muxer() {
    gst::init().unwrap();

    let chunker = Chunker::builder().input("sample.wav").build();

    assert!(chunker.play().is_err());
    assert!(!chunker.is_playing());
}

#[cfg(test)]
#[test]
fn stop_always_notifies_playing() {
    gst::init().unwrap();

    let chunker = Chunker::builder().build();

    let notified = Arc::new(AtomicBool::new(false));
    let notified_clone = notified.clone();
    chunker.connect_playing_notify(move |chunker| {
        assert!(!chunker.is_playing());
        notified_clone.store(true, Ordering::SeqCst);
    });

    // Never played, but waiters must still wake up.
    chunker.stop();

    assert!(notified.load(Ordering::SeqCst));
    assert!(!chunker.is_playing());
}

#[cfg(test)]
#[test]
fn chunked_signal_reaches_handlers() {
    gst::init().unwrap();

    let chunker = Chunker::builder().build();

    let chunks = Arc::new(AtomicUsize::new(0));
    let chunks_clone = chunks.clone();
    chunker.connect_chunked(move |_| {
        chunks_clone.fetch_add(1, Ordering::SeqCst);
    });

    chunker.emit_by_name::<()>("chunked", &[]);
    chunker.emit_by_name::<()>("chunked", &[]);

    assert_eq!(chunks.load(Ordering::SeqCst), 2);
}
