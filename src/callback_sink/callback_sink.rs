// silence-chunker - buffer-collecting callback sink
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;
use gst_base::subclass::prelude::*;

use once_cell::sync::Lazy;

use std::sync::Mutex;

static CAT: Lazy<gst::DebugCategory> = Lazy::new(|| {
    gst::DebugCategory::new(
        "callbacksink",
        gst::DebugColorFlags::empty(),
        Some("Buffer-collecting callback sink"),
    )
});

pub type BufferCallback = Box<dyn Fn(&gst::Buffer) + Send + Sync + 'static>;
pub type BufferListCallback = Box<dyn Fn(&gst::BufferList) + Send + Sync + 'static>;

#[derive(Default)]
struct Callbacks {
    buffer: Option<BufferCallback>,
    buffer_list: Option<BufferListCallback>,
}

#[derive(Default)]
pub struct CallbackSink {
    callbacks: Mutex<Callbacks>,
    // Buffers collected since start, None while the sink is stopped
    buffers: Mutex<Option<gst::BufferList>>,
}

#[glib::object_subclass]
impl ObjectSubclass for CallbackSink {
    const NAME: &'static str = "ChunkerCallbackSink";
    type Type = super::CallbackSink;
    type ParentType = gst_base::BaseSink;
}

impl ObjectImpl for CallbackSink {}

impl GstObjectImpl for CallbackSink {}

impl ElementImpl for CallbackSink {
    fn metadata() -> Option<&'static gst::subclass::ElementMetadata> {
        static ELEMENT_METADATA: Lazy<gst::subclass::ElementMetadata> = Lazy::new(|| {
            gst::subclass::ElementMetadata::new(
                "Callback Sink",
                "Sink",
                "Calls the configured callbacks for every collected buffer",
                "silence-chunker",
            )
        });

        Some(&*ELEMENT_METADATA)
    }

    fn pad_templates() -> &'static [gst::PadTemplate] {
        static PAD_TEMPLATES: Lazy<Vec<gst::PadTemplate>> = Lazy::new(|| {
            let caps = gst::Caps::new_any();

            let sink_pad_template = gst::PadTemplate::new(
                "sink",
                gst::PadDirection::Sink,
                gst::PadPresence::Always,
                &caps,
            )
            .unwrap();

            vec![sink_pad_template]
        });

        PAD_TEMPLATES.as_ref()
    }
}

impl BaseSinkImpl for CallbackSink {
    fn start(&self) -> Result<(), gst::ErrorMessage> {
        gst::debug!(CAT, imp = self, "Starting");

        *self.buffers.lock().unwrap() = Some(gst::BufferList::new());

        Ok(())
    }

    fn stop(&self) -> Result<(), gst::ErrorMessage> {
        let buffers = self
            .buffers
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(gst::BufferList::new);

        gst::debug!(
            CAT,
            imp = self,
            "Stopping with {} collected buffers",
            buffers.len()
        );

        let callbacks = self.callbacks.lock().unwrap();
        if let Some(cb) = callbacks.buffer_list.as_ref() {
            cb(&buffers);
        }

        Ok(())
    }

    fn render(&self, buffer: &gst::Buffer) -> Result<gst::FlowSuccess, gst::FlowError> {
        {
            let mut buffers = self.buffers.lock().unwrap();
            let Some(list) = buffers.as_mut() else {
                gst::error!(CAT, imp = self, "Buffer rendered on a stopped sink");
                return Err(gst::FlowError::Error);
            };

            let list = list.get_mut().ok_or(gst::FlowError::Error)?;
            list.add(buffer.clone());

            gst::log!(CAT, imp = self, "Collected buffer {}", list.len());
        }

        let callbacks = self.callbacks.lock().unwrap();
        if let Some(cb) = callbacks.buffer.as_ref() {
            cb(buffer);
        }

        Ok(gst::FlowSuccess::Ok)
    }
}

impl CallbackSink {
    pub(super) fn set_buffer_callback(&self, cb: BufferCallback) {
        self.callbacks.lock().unwrap().buffer = Some(cb);
    }

    pub(super) fn set_buffer_list_callback(&self, cb: BufferListCallback) {
        self.callbacks.lock().unwrap().buffer_list = Some(cb);
    }
}
