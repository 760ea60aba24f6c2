// chunk-inspect
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use std::sync::Arc;

use anyhow::Context;

use atomic_refcell::AtomicRefCell;

use clap::{Arg, Command};

use silence_chunker::{CallbackSink, Chunker, INPUT_MIC};

#[derive(Default)]
struct ChunkCollector {
    data: Vec<u8>,
    n_buffers: u64,
    n_chunks: u64,
}

fn main() -> anyhow::Result<()> {
    // Command line arguments
    let matches = Command::new("chunk-inspect")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Chunk an audio stream by silence and report chunk digests")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .default_value(INPUT_MIC)
                .help("Input audio file to chunk, e.g. \"input.wav\"; use \"mic\" to listen from the microphone"),
        )
        .arg(
            Arg::new("rate")
                .short('r')
                .long("rate")
                .default_value("8000")
                .value_parser(clap::value_parser!(i32))
                .help("Sample rate of the inspected audio"),
        )
        .arg(
            Arg::new("max-chunk-time")
                .short('t')
                .long("max-chunk-time")
                .default_value("2")
                .value_parser(clap::value_parser!(u64))
                .help("Maximum chunk duration in seconds"),
        )
        .after_help(
            "Instead of writing chunk files, collects the chunked samples in memory
and prints the size and MD5 digest of every chunk, so the chunking of a
given input can be compared across runs.",
        )
        .get_matches();

    let input = matches.get_one::<String>("input").unwrap();
    let rate = *matches.get_one::<i32>("rate").unwrap();
    let max_chunk_time = *matches.get_one::<u64>("max-chunk-time").unwrap();

    gst::init().context("Unable to initialise GStreamer")?;

    // All callbacks below run on the single streaming thread feeding the sink
    let collector = Arc::new(AtomicRefCell::new(ChunkCollector::default()));

    let sink = CallbackSink::new();

    let collector_clone = collector.clone();
    sink.set_buffer_callback(move |buffer| {
        let mut collector = collector_clone.borrow_mut();

        let map = buffer.map_readable().expect("unreadable buffer");
        collector.data.extend_from_slice(map.as_slice());
        collector.n_buffers += 1;
    });

    sink.set_buffer_list_callback(|buffers| {
        println!("Sink drained with {} buffers", buffers.len());
    });

    let chunker = Chunker::builder()
        .input(input)
        .sink(&sink)
        .rate(rate)
        .maximum_chunk_time(gst::ClockTime::from_seconds(max_chunk_time))
        .build();

    let collector_clone = collector.clone();
    chunker.connect_chunked(move |_chunker| {
        let mut collector = collector_clone.borrow_mut();
        collector.n_chunks += 1;

        let digest = md5::compute(&collector.data);
        println!(
            "chunk {:2}: {} buffers, {} bytes, md5 {:?}",
            collector.n_chunks,
            collector.n_buffers,
            collector.data.len(),
            digest
        );

        collector.data.clear();
        collector.n_buffers = 0;
    });

    let main_loop = glib::MainLoop::new(None, false);

    let main_loop_clone = main_loop.clone();
    chunker.connect_playing_notify(move |chunker| {
        if !chunker.is_playing() {
            main_loop_clone.quit();
        }
    });

    chunker.play().context("Unable to start chunking")?;

    if input == INPUT_MIC {
        println!("Listening from microphone; press Enter to quit");

        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("Unable to read from stdin")?;
    } else {
        println!("Waiting for {input} to be chunked…");
        main_loop.run();
    }

    // Synchronous stop so the sink has drained before the summary
    chunker.stop();

    let collector = collector.borrow();
    if !collector.data.is_empty() {
        let digest = md5::compute(&collector.data);
        println!(
            "tail    : {} buffers, {} bytes, md5 {:?}",
            collector.n_buffers,
            collector.data.len(),
            digest
        );
    }
    println!("{} chunk(s) in total", collector.n_chunks);

    Ok(())
}
