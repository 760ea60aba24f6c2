// silence-chunker
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

//! Chunk an audio stream by silence.
//!
//! [`Chunker`] wraps a GStreamer pipeline that reads audio from a file or the
//! microphone, watches for silences and splits the stream into sequential
//! numbered chunk files encoded by a muxer of the caller's choice. Chunks are
//! also cut when they exceed a maximum duration, so a stream without any
//! silence still produces bounded files.
//!
//! [`CallbackSink`] is a helper sink element that hands every buffer to a
//! callback instead of writing files, for callers that want the chunked
//! samples in memory.

mod callback_sink;
mod chunker;

pub use callback_sink::CallbackSink;
pub use chunker::{
    Chunker, ChunkerBuilder, DEFAULT_MAXIMUM_CHUNK_TIME, DEFAULT_MINIMUM_SILENCE_TIME,
    DEFAULT_RATE, DEFAULT_SILENCE_HYSTERESIS, DEFAULT_SILENCE_THRESHOLD, INPUT_MIC,
};
