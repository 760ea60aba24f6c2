// silence-chunker - buffer-collecting callback sink
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

mod callback_sink;
mod tests;

use gst::glib;
use gst::subclass::prelude::*;

glib::wrapper! {
    /// Sink element that hands buffers to callbacks instead of writing them.
    ///
    /// Every rendered buffer is collected and passed to the buffer callback;
    /// when the sink stops, the whole collection is passed to the buffer-list
    /// callback. Useful as the custom `sink` of a
    /// [`Chunker`](crate::Chunker) when the chunked samples are wanted in
    /// memory rather than as files.
    ///
    /// The callbacks run on streaming threads, hence `Send + Sync`.
    pub struct CallbackSink(ObjectSubclass<callback_sink::CallbackSink>) @extends gst_base::BaseSink, gst::Element, gst::Object;
}

unsafe impl Send for CallbackSink {}
unsafe impl Sync for CallbackSink {}

impl CallbackSink {
    pub fn new() -> Self {
        glib::Object::new()
    }

    /// Sets the callback invoked for every rendered buffer, replacing any
    /// previous one.
    pub fn set_buffer_callback<F>(&self, f: F)
    where
        F: Fn(&gst::Buffer) + Send + Sync + 'static,
    {
        self.imp().set_buffer_callback(Box::new(f));
    }

    /// Sets the callback invoked with all collected buffers when the sink
    /// stops, replacing any previous one.
    pub fn set_buffer_list_callback<F>(&self, f: F)
    where
        F: Fn(&gst::BufferList) + Send + Sync + 'static,
    {
        self.imp().set_buffer_list_callback(Box::new(f));
    }
}

impl Default for CallbackSink {
    fn default() -> Self {
        Self::new()
    }
}
