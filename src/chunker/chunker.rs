// silence-chunker - chunk an audio stream by silence
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;

use glib::subclass::Signal;
use glib::SendWeakRef;

use once_cell::sync::Lazy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{
    DEFAULT_MAXIMUM_CHUNK_TIME, DEFAULT_MINIMUM_SILENCE_TIME, DEFAULT_RATE,
    DEFAULT_SILENCE_HYSTERESIS, DEFAULT_SILENCE_THRESHOLD, INPUT_MIC,
};

static CAT: Lazy<gst::DebugCategory> = Lazy::new(|| {
    gst::DebugCategory::new(
        "silencechunker",
        gst::DebugColorFlags::empty(),
        Some("Silence-based audio chunker"),
    )
});

struct Settings {
    input: String,
    output: Option<String>,
    muxer: Option<String>,
    src: Option<gst::Element>,
    sink: Option<gst::Element>,
    rate: i32,
    max_chunk_time: u64,
    min_silence_time: u64,
    hysteresis: u64,
    threshold: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input: String::from(INPUT_MIC),
            output: None,
            muxer: None,
            src: None,
            sink: None,
            rate: DEFAULT_RATE,
            max_chunk_time: DEFAULT_MAXIMUM_CHUNK_TIME.nseconds(),
            min_silence_time: DEFAULT_MINIMUM_SILENCE_TIME.nseconds(),
            hysteresis: DEFAULT_SILENCE_HYSTERESIS,
            threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }
}

#[derive(Default)]
pub struct Chunker {
    settings: Mutex<Settings>,
    pipeline: Mutex<Option<gst::Pipeline>>,
    muxsink: Mutex<Option<gst::Element>>,
    playing: AtomicBool,
}

#[glib::object_subclass]
impl ObjectSubclass for Chunker {
    const NAME: &'static str = "SilenceChunker";
    type Type = super::Chunker;
    type ParentType = glib::Object;
}

impl ObjectImpl for Chunker {
    fn properties() -> &'static [glib::ParamSpec] {
        static PROPERTIES: Lazy<Vec<glib::ParamSpec>> = Lazy::new(|| {
            vec![
                glib::ParamSpecString::builder("input")
                    .nick("Input")
                    .blurb("Audio file to chunk; \"mic\" reads from the microphone")
                    .default_value(Some(INPUT_MIC))
                    .construct_only()
                    .build(),
                glib::ParamSpecString::builder("output")
                    .nick("Output")
                    .blurb("printf-style location pattern for chunk files, like \"out/%02d.wav\"")
                    .construct_only()
                    .build(),
                glib::ParamSpecString::builder("muxer")
                    .nick("Muxer")
                    .blurb("Factory name of the element encoding each chunk, like \"wavenc\"")
                    .construct_only()
                    .build(),
                glib::ParamSpecObject::builder::<gst::Element>("src")
                    .nick("Source element")
                    .blurb("Custom source element used instead of the input file or microphone")
                    .construct_only()
                    .build(),
                glib::ParamSpecObject::builder::<gst::Element>("sink")
                    .nick("Sink element")
                    .blurb("Custom sink element used instead of the chunk-file writer")
                    .construct_only()
                    .build(),
                glib::ParamSpecInt::builder("rate")
                    .nick("Rate")
                    .blurb("Sample rate of chunked audio")
                    .minimum(1)
                    .default_value(DEFAULT_RATE)
                    .construct_only()
                    .build(),
                glib::ParamSpecUInt64::builder("maximum-chunk-time")
                    .nick("Maximum chunk time")
                    .blurb("Cut a chunk after this duration (ns) even without silence")
                    .default_value(DEFAULT_MAXIMUM_CHUNK_TIME.nseconds())
                    .construct_only()
                    .build(),
                glib::ParamSpecUInt64::builder("minimum-silence-time")
                    .nick("Minimum silence time")
                    .blurb("How long (ns) the signal must stay quiet to count as silence")
                    .default_value(DEFAULT_MINIMUM_SILENCE_TIME.nseconds())
                    .construct_only()
                    .build(),
                glib::ParamSpecUInt64::builder("silence-hysteresis")
                    .nick("Silence hysteresis")
                    .blurb("Hysteresis of the silence detector, in samples")
                    .default_value(DEFAULT_SILENCE_HYSTERESIS)
                    .construct_only()
                    .build(),
                glib::ParamSpecInt::builder("silence-threshold")
                    .nick("Silence threshold")
                    .blurb("Level (dB) below which the signal counts as silence")
                    .default_value(DEFAULT_SILENCE_THRESHOLD)
                    .construct_only()
                    .build(),
                glib::ParamSpecBoolean::builder("playing")
                    .nick("Playing")
                    .blurb("Whether the pipeline is in playing state")
                    .read_only()
                    .explicit_notify()
                    .build(),
            ]
        });

        PROPERTIES.as_ref()
    }

    fn signals() -> &'static [Signal] {
        static SIGNALS: Lazy<Vec<Signal>> =
            Lazy::new(|| vec![Signal::builder("chunked").run_first().action().build()]);

        SIGNALS.as_ref()
    }

    fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
        let mut settings = self.settings.lock().unwrap();
        match pspec.name() {
            "input" => {
                if let Some(input) = value.get().expect("type checked upstream") {
                    settings.input = input;
                }
            }
            "output" => {
                settings.output = value.get().expect("type checked upstream");
            }
            "muxer" => {
                settings.muxer = value.get().expect("type checked upstream");
            }
            "src" => {
                settings.src = value.get().expect("type checked upstream");
            }
            "sink" => {
                settings.sink = value.get().expect("type checked upstream");
            }
            "rate" => {
                settings.rate = value.get().expect("type checked upstream");
            }
            "maximum-chunk-time" => {
                settings.max_chunk_time = value.get().expect("type checked upstream");
            }
            "minimum-silence-time" => {
                settings.min_silence_time = value.get().expect("type checked upstream");
            }
            "silence-hysteresis" => {
                settings.hysteresis = value.get().expect("type checked upstream");
            }
            "silence-threshold" => {
                settings.threshold = value.get().expect("type checked upstream");
            }
            _ => unimplemented!(),
        }
    }

    fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
        let settings = self.settings.lock().unwrap();
        match pspec.name() {
            "input" => settings.input.to_value(),
            "output" => settings.output.to_value(),
            "muxer" => settings.muxer.to_value(),
            "src" => settings.src.to_value(),
            "sink" => settings.sink.to_value(),
            "rate" => settings.rate.to_value(),
            "maximum-chunk-time" => settings.max_chunk_time.to_value(),
            "minimum-silence-time" => settings.min_silence_time.to_value(),
            "silence-hysteresis" => settings.hysteresis.to_value(),
            "silence-threshold" => settings.threshold.to_value(),
            "playing" => self.playing.load(Ordering::SeqCst).to_value(),
            _ => unimplemented!(),
        }
    }

    fn constructed(&self) {
        self.parent_constructed();

        let pipeline = match self.create_pipeline() {
            Ok(pipeline) => pipeline,
            Err(err) => {
                glib::g_critical!("silence-chunker", "Unable to create pipeline: {}", err);
                return;
            }
        };

        let bus = pipeline.bus().expect("pipeline without bus");

        // Handle messages directly on the posting thread so state updates and
        // chunk splits happen without a main loop running.
        let chunker_weak = SendWeakRef::from(self.obj().downgrade());
        bus.set_sync_handler(move |_bus, msg| {
            if let Some(chunker) = chunker_weak.upgrade() {
                chunker.imp().handle_message(msg);
            }
            gst::BusSyncReply::Pass
        });

        *self.pipeline.lock().unwrap() = Some(pipeline);
    }

    fn dispose(&self) {
        let pipeline = self.pipeline.lock().unwrap().take();
        if let Some(pipeline) = pipeline {
            if let Some(bus) = pipeline.bus() {
                bus.unset_sync_handler();
            }
            let _ = pipeline.set_state(gst::State::Null);
        }

        self.muxsink.lock().unwrap().take();
    }
}

impl Chunker {
    fn create_pipeline(&self) -> Result<gst::Pipeline, glib::BoolError> {
        let settings = self.settings.lock().unwrap();

        let pipeline = gst::Pipeline::builder().name("chunker").build();

        let silence = gst::ElementFactory::make("removesilence")
            .property("silent", false)
            .property("squash", true)
            .property("remove", true)
            .property("hysteresis", settings.hysteresis)
            .property("minimum-silence-time", settings.min_silence_time)
            .property("threshold", settings.threshold)
            .build()?;

        let resample = gst::ElementFactory::make("audioresample").build()?;

        let capsfilter = gst::ElementFactory::make("capsfilter")
            .property(
                "caps",
                gst_audio::AudioCapsBuilder::new().rate(settings.rate).build(),
            )
            .build()?;

        pipeline.add_many([&silence, &resample, &capsfilter])?;
        gst::Element::link_many([&silence, &resample, &capsfilter])?;

        if let Some(src) = settings.src.clone() {
            pipeline.add(&src)?;
            src.link(&silence)?;
        } else if settings.input == INPUT_MIC {
            let micsrc = gst::ElementFactory::make("pulsesrc").build()?;
            pipeline.add(&micsrc)?;
            micsrc.link(&silence)?;
        } else {
            let filesrc = gst::ElementFactory::make("filesrc")
                .property("location", settings.input.as_str())
                .build()?;
            let decoder = gst::ElementFactory::make("decodebin").build()?;

            pipeline.add_many([&filesrc, &decoder])?;
            filesrc.link(&decoder)?;

            // The decoder's pads only show up once the stream type is known.
            // Pads beyond the first (e.g. a video branch) are left unlinked.
            let silence_pad = silence
                .static_pad("sink")
                .expect("removesilence without sink pad");
            decoder.connect_pad_added(move |_decoder, src_pad| {
                if silence_pad.is_linked() {
                    return;
                }
                if let Err(err) = src_pad.link(&silence_pad) {
                    gst::warning!(
                        CAT,
                        obj = src_pad,
                        "Unable to link decoder to removesilence: {:?}",
                        err
                    );
                }
            });
        }

        if let Some(sink) = settings.sink.clone() {
            pipeline.add(&sink)?;
            capsfilter.link(&sink)?;
        } else {
            let (Some(output), Some(muxer_name)) =
                (settings.output.as_deref(), settings.muxer.as_deref())
            else {
                return Err(glib::bool_error!(
                    "\"output\" and \"muxer\" are required without a custom sink"
                ));
            };

            let muxer = gst::ElementFactory::make(muxer_name).build()?;
            let muxsink = gst::ElementFactory::make("splitmuxsink")
                .name("muxsink")
                .property("location", output)
                .property("max-size-time", settings.max_chunk_time)
                .property("muxer", &muxer)
                .build()?;

            pipeline.add(&muxsink)?;
            capsfilter.link(&muxsink)?;

            *self.muxsink.lock().unwrap() = Some(muxsink);
        }

        Ok(pipeline)
    }

    fn handle_message(&self, msg: &gst::Message) {
        use gst::MessageView;

        match msg.view() {
            MessageView::Eos(..) => {
                gst::debug!(CAT, imp = self, "End of stream reached");
                self.stop_from_bus();
            }
            MessageView::Error(err) => {
                glib::g_critical!(
                    "silence-chunker",
                    "Error from {}: {}",
                    err.src()
                        .map(|src| src.path_string())
                        .unwrap_or_else(|| "pipeline".into()),
                    err.error()
                );
                self.stop_from_bus();
            }
            MessageView::StateChanged(state_changed) => {
                let pipeline = self.pipeline.lock().unwrap().clone();
                let from_pipeline = match (msg.src(), pipeline.as_ref()) {
                    (Some(src), Some(pipeline)) => src == pipeline.upcast_ref::<gst::Object>(),
                    _ => false,
                };

                if from_pipeline {
                    self.update_playing(state_changed.current() == gst::State::Playing);
                }
            }
            _ => self.maybe_split(msg),
        }
    }

    fn maybe_split(&self, msg: &gst::Message) {
        let Some(s) = msg.structure() else { return };
        if s.name() != "removesilence" || s.get::<u64>("silence_detected").is_err() {
            return;
        }

        gst::debug!(CAT, imp = self, "Silence detected, starting a new chunk");

        let muxsink = self.muxsink.lock().unwrap().clone();
        if let Some(muxsink) = muxsink {
            muxsink.emit_by_name::<()>("split-now", &[]);
        }

        self.obj().emit_by_name::<()>("chunked", &[]);
    }

    fn update_playing(&self, playing: bool) {
        if self.playing.swap(playing, Ordering::SeqCst) != playing {
            gst::debug!(CAT, imp = self, "Playing: {}", playing);
            self.obj().notify("playing");
        }
    }

    fn mark_stopped(&self) {
        self.playing.store(false, Ordering::SeqCst);
        // Unconditional notify so completion waiters wake up even when
        // playback never made it to the playing state.
        self.obj().notify("playing");
    }

    fn pipeline(&self) -> Option<gst::Pipeline> {
        self.pipeline.lock().unwrap().clone()
    }

    pub(super) fn play(&self) -> Result<(), glib::BoolError> {
        let Some(pipeline) = self.pipeline() else {
            return Err(glib::bool_error!("Chunker has no pipeline"));
        };

        gst::debug!(CAT, imp = self, "Changing state to playing");
        pipeline
            .set_state(gst::State::Playing)
            .map_err(|_| glib::bool_error!("Unable to start the pipeline"))?;

        Ok(())
    }

    pub(super) fn pause(&self) -> Result<(), glib::BoolError> {
        let Some(pipeline) = self.pipeline() else {
            return Err(glib::bool_error!("Chunker has no pipeline"));
        };

        gst::debug!(CAT, imp = self, "Changing state to paused");
        pipeline
            .set_state(gst::State::Paused)
            .map_err(|_| glib::bool_error!("Unable to pause the pipeline"))?;

        Ok(())
    }

    pub(super) fn stop(&self) {
        gst::debug!(CAT, imp = self, "Stopping playback");

        self.mark_stopped();
        if let Some(pipeline) = self.pipeline() {
            let _ = pipeline.set_state(gst::State::Null);
        }
    }

    // Stop triggered from the bus. The state change is dispatched to a helper
    // thread because tearing the pipeline down from the streaming thread that
    // posted the message would deadlock.
    fn stop_from_bus(&self) {
        gst::debug!(CAT, imp = self, "Stopping playback");

        self.mark_stopped();
        if let Some(pipeline) = self.pipeline() {
            pipeline.call_async(|pipeline| {
                let _ = pipeline.set_state(gst::State::Null);
            });
        }
    }
}
