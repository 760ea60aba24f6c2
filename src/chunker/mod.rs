// silence-chunker - chunk an audio stream by silence
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

mod chunker;
mod tests;

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;

/// Input value selecting the microphone instead of a file.
pub const INPUT_MIC: &str = "mic";

/// Default sample rate of chunked audio.
pub const DEFAULT_RATE: i32 = 44_100;

/// A chunk is cut at this duration even if no silence was detected.
pub const DEFAULT_MAXIMUM_CHUNK_TIME: gst::ClockTime = gst::ClockTime::from_seconds(7);

/// How long the signal must stay below the threshold to count as silence.
pub const DEFAULT_MINIMUM_SILENCE_TIME: gst::ClockTime = gst::ClockTime::from_mseconds(500);

/// Hysteresis of the silence detector, in samples.
pub const DEFAULT_SILENCE_HYSTERESIS: u64 = 480;

/// Silence threshold in dB.
pub const DEFAULT_SILENCE_THRESHOLD: i32 = -60;

glib::wrapper! {
    /// Chunks an audio stream by silence.
    ///
    /// The stream is read from a file (decoded as needed), from the
    /// microphone when the input is [`INPUT_MIC`], or from a custom source
    /// element. Whenever a silence is detected, or the maximum chunk duration
    /// is exceeded, the current chunk is finished and the next one started.
    /// Chunks are written to sequential files derived from the printf-style
    /// `output` pattern (e.g. `out/%02d.wav`) by the `muxer` element, unless
    /// a custom sink element is given.
    ///
    /// Processing is asynchronous: [`Chunker::play`] returns immediately and
    /// completion is signalled through the `playing` property (see
    /// [`Chunker::is_playing`] and [`Chunker::connect_playing_notify`]).
    pub struct Chunker(ObjectSubclass<chunker::Chunker>);
}

unsafe impl Send for Chunker {}
unsafe impl Sync for Chunker {}

impl Chunker {
    /// Creates a chunker reading from `input`, writing chunks to the
    /// printf-style `output` pattern with the `muxer` element (e.g. `wavenc`).
    pub fn new(input: &str, output: &str, muxer: &str) -> Chunker {
        glib::Object::builder()
            .property("input", input)
            .property("output", output)
            .property("muxer", muxer)
            .build()
    }

    pub fn builder() -> ChunkerBuilder {
        ChunkerBuilder::default()
    }

    /// Starts processing. Returns an error if the pipeline could not be
    /// built or refuses to start; runtime failures are reported through the
    /// `playing` property instead.
    pub fn play(&self) -> Result<(), glib::BoolError> {
        self.imp().play()
    }

    pub fn pause(&self) -> Result<(), glib::BoolError> {
        self.imp().pause()
    }

    /// Stops processing and drives the pipeline back to its initial state.
    /// Always notifies `playing`, even if playback never started.
    pub fn stop(&self) {
        self.imp().stop()
    }

    /// Whether the pipeline is currently playing. Flips to `false` once the
    /// whole input has been chunked, on error, or after [`Chunker::stop`].
    pub fn is_playing(&self) -> bool {
        self.property("playing")
    }

    /// Connects a handler invoked every time a silence boundary finishes a
    /// chunk. The handler runs on a pipeline thread.
    pub fn connect_chunked<F>(&self, f: F) -> glib::SignalHandlerId
    where
        F: Fn(&Self) + Send + Sync + 'static,
    {
        self.connect("chunked", false, move |values| {
            let chunker = values[0]
                .get::<Chunker>()
                .expect("chunked signal without instance");
            f(&chunker);
            None
        })
    }

    /// Connects a handler invoked whenever the `playing` property changes.
    /// The handler runs on a pipeline thread.
    pub fn connect_playing_notify<F>(&self, f: F) -> glib::SignalHandlerId
    where
        F: Fn(&Self) + Send + Sync + 'static,
    {
        self.connect_notify(Some("playing"), move |chunker, _pspec| f(chunker))
    }
}

/// Builder for [`Chunker`] exposing the tuning knobs that
/// [`Chunker::new`] leaves at their defaults.
#[derive(Default)]
#[must_use = "The builder must be built to be used"]
pub struct ChunkerBuilder {
    input: Option<String>,
    output: Option<String>,
    muxer: Option<String>,
    src: Option<gst::Element>,
    sink: Option<gst::Element>,
    rate: Option<i32>,
    maximum_chunk_time: Option<gst::ClockTime>,
    minimum_silence_time: Option<gst::ClockTime>,
    silence_hysteresis: Option<u64>,
    silence_threshold: Option<i32>,
}

impl ChunkerBuilder {
    pub fn input(mut self, input: &str) -> Self {
        self.input = Some(input.to_string());
        self
    }

    pub fn output(mut self, output: &str) -> Self {
        self.output = Some(output.to_string());
        self
    }

    pub fn muxer(mut self, muxer: &str) -> Self {
        self.muxer = Some(muxer.to_string());
        self
    }

    /// Custom source element used instead of the file or microphone input.
    pub fn src(mut self, src: &impl IsA<gst::Element>) -> Self {
        self.src = Some(src.clone().upcast());
        self
    }

    /// Custom sink element replacing the chunk-file writer. With a custom
    /// sink, `output` and `muxer` are not required.
    pub fn sink(mut self, sink: &impl IsA<gst::Element>) -> Self {
        self.sink = Some(sink.clone().upcast());
        self
    }

    pub fn rate(mut self, rate: i32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn maximum_chunk_time(mut self, maximum_chunk_time: gst::ClockTime) -> Self {
        self.maximum_chunk_time = Some(maximum_chunk_time);
        self
    }

    pub fn minimum_silence_time(mut self, minimum_silence_time: gst::ClockTime) -> Self {
        self.minimum_silence_time = Some(minimum_silence_time);
        self
    }

    pub fn silence_hysteresis(mut self, silence_hysteresis: u64) -> Self {
        self.silence_hysteresis = Some(silence_hysteresis);
        self
    }

    pub fn silence_threshold(mut self, silence_threshold: i32) -> Self {
        self.silence_threshold = Some(silence_threshold);
        self
    }

    pub fn build(self) -> Chunker {
        let mut builder = glib::Object::builder::<Chunker>();

        if let Some(input) = self.input {
            builder = builder.property("input", input);
        }
        if let Some(output) = self.output {
            builder = builder.property("output", output);
        }
        if let Some(muxer) = self.muxer {
            builder = builder.property("muxer", muxer);
        }
        if let Some(src) = self.src {
            builder = builder.property("src", src);
        }
        if let Some(sink) = self.sink {
            builder = builder.property("sink", sink);
        }
        if let Some(rate) = self.rate {
            builder = builder.property("rate", rate);
        }
        if let Some(maximum_chunk_time) = self.maximum_chunk_time {
            builder = builder.property("maximum-chunk-time", maximum_chunk_time.nseconds());
        }
        if let Some(minimum_silence_time) = self.minimum_silence_time {
            builder = builder.property("minimum-silence-time", minimum_silence_time.nseconds());
        }
        if let Some(silence_hysteresis) = self.silence_hysteresis {
            builder = builder.property("silence-hysteresis", silence_hysteresis);
        }
        if let Some(silence_threshold) = self.silence_threshold {
            builder = builder.property("silence-threshold", silence_threshold);
        }

        builder.build()
    }
}
