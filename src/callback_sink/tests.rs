// silence-chunker - buffer-collecting callback sink (Tests)
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

#[cfg(test)]
use super::CallbackSink;

#[cfg(test)]
use gst::prelude::*;

#[cfg(test)]
#[test]
fn sink_pad_accepts_any_caps() {
    gst::init().unwrap();

    let sink = CallbackSink::new();

    let pad = sink.static_pad("sink").expect("sink without sink pad");
    assert!(pad.pad_template_caps().is_any());
}

#[cfg(test)]
#[test]
fn callbacks_are_replaceable() {
    gst::init().unwrap();

    let sink = CallbackSink::new();

    sink.set_buffer_callback(|_buffer| {});
    sink.set_buffer_list_callback(|_buffers| {});

    // Setting again replaces the previous callbacks rather than stacking them
    sink.set_buffer_callback(|_buffer| {});
    sink.set_buffer_list_callback(|_buffers| {});
}

#[cfg(test)]
#[test]
fn usable_as_pipeline_sink() {
    gst::init().unwrap();

    let pipeline = gst::Pipeline::new();
    let sink = CallbackSink::new();

    pipeline.add(&sink).unwrap();
    assert!(sink.static_pad("sink").unwrap().peer().is_none());
}
