// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Synthesizes a chirp and writes it out as an opus bitstream.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use tone_encode::encoder::{Encoder, EncoderConfig};
use tone_encode::ogg_opus::{OggOpusSink, OpusHead};
use tone_encode::opus_encoder::OpusEncoder;
use tone_encode::pipeline::{encode_tone, Encoded};
use tone_encode::sink::{RawSink, Sink};
use tone_encode::tone::ToneConfig;
use tone_encode::{Error, Result};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Where to write the encoded stream.
    output: Option<PathBuf>,

    /// Length of the tone, rounded up to whole encoder frames.
    #[arg(long, default_value_t = 1000)]
    duration_ms: u32,

    /// Start frequency of the chirp in Hz.
    #[arg(long, default_value_t = 440.)]
    frequency: f64,

    /// Wrap the packets in an Ogg Opus stream instead of writing them raw.
    #[arg(long)]
    ogg: bool,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn open_encoder() -> Result<OpusEncoder> {
    let config = EncoderConfig::for_layouts(OpusEncoder::SUPPORTED_LAYOUTS);
    OpusEncoder::new(config).map_err(|e| e.context("could not open codec"))
}

fn report<E, O>(path: &Path, encoded: &Encoded<E, O>) {
    let stats = &encoded.stats;
    log::info!(
        "wrote {} packets, {} bytes for {} frames to {}",
        stats.packets_written,
        stats.bytes_written,
        stats.frames_submitted,
        path.display()
    );
}

fn encode_to<S: Sink>(path: &Path, tone: &ToneConfig, encoder: OpusEncoder, sink: S) -> Result<()> {
    let encoded = encode_tone(tone, encoder, sink)?;
    report(path, &encoded);
    Ok(())
}

fn run(cli: &Cli, path: &Path) -> Result<()> {
    let tone = ToneConfig { frequency: cli.frequency, duration_ms: cli.duration_ms };
    tone.validate()?;
    // The encoder is opened before the output so that setup failures leave no file behind.
    let encoder = open_encoder()?;
    if cli.ogg {
        let config = encoder.config();
        let channels = u8::try_from(config.channels()).map_err(Error::msg)?;
        let head = OpusHead::new(channels, encoder.pre_skip()?, config.sample_rate);
        // Granule positions count samples at 48kHz whatever the input rate.
        let rendered = tone.rendered_samples(config.sample_rate, encoder.frame_samples());
        let length = rendered * 48_000 / config.sample_rate as u64;
        let sink = OggOpusSink::create(path, &head)?.with_length(length);
        encode_to(path, &tone, encoder, sink)
    } else {
        let sink = RawSink::create(path)?;
        encode_to(path, &tone, encoder, sink)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    init_logger(cli.verbose);

    let Some(path) = cli.output.as_deref() else {
        // A missing output is a request for help, not a failure.
        eprintln!("{}", Cli::command().render_usage());
        return ExitCode::SUCCESS;
    };

    match run(&cli, path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
