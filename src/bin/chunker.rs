// chunker
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use std::path::Path;

use anyhow::Context;

use clap::{Arg, Command};

use silence_chunker::{Chunker, INPUT_MIC};

fn main() -> anyhow::Result<()> {
    // Command line arguments
    let matches = Command::new("chunker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Chunk an audio stream by silence")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .default_value(INPUT_MIC)
                .help("Input audio file to chunk, e.g. \"input.wav\"; use \"mic\" to listen from the microphone"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .required(true)
                .help("Output location pattern for chunks, e.g. \"output/%02d.wav\""),
        )
        .arg(
            Arg::new("muxer")
                .short('m')
                .long("muxer")
                .required(true)
                .help("Muxer element used to encode chunks, e.g. \"wavenc\""),
        )
        .after_help(
            "Splits the input stream into numbered chunk files whenever a silence is
detected, or once a chunk exceeds the maximum chunk duration.",
        )
        .get_matches();

    let input = matches.get_one::<String>("input").unwrap();
    let output = matches.get_one::<String>("output").unwrap();
    let muxer = matches.get_one::<String>("muxer").unwrap();

    gst::init().context("Unable to initialise GStreamer")?;

    // splitmuxsink won't create the chunk directory itself
    if let Some(dir) = Path::new(output).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Unable to create output directory {}", dir.display()))?;
        }
    }

    let chunker = Chunker::new(input, output, muxer);

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

    chunker.stop();

    Ok(())
}
