// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::encoder::Encoder;
use crate::frame::AudioFrame;
use crate::pump::{EncodePump, PumpStats};
use crate::sink::Sink;
use crate::tone::{ToneConfig, ToneGenerator};
use crate::Result;

pub struct Encoded<E, O> {
    pub encoder: E,
    pub output: O,
    pub stats: PumpStats,
}

/// Renders the tone frame by frame through `encoder` into `sink`, then flushes
/// the encoder and closes the sink.
pub fn encode_tone<E: Encoder, S: Sink>(
    tone: &ToneConfig,
    encoder: E,
    sink: S,
) -> Result<Encoded<E, S::Output>> {
    let frame_samples = encoder.frame_samples();
    let mut frame = AudioFrame::for_encoder(encoder.config(), frame_samples)?;
    let mut generator = ToneGenerator::new(tone, encoder.config().sample_rate, frame_samples)?;
    log::debug!(
        "rendering {} Hz for {} ms: {} frames of {} samples",
        tone.frequency,
        tone.duration_ms,
        generator.frames_total(),
        frame_samples
    );

    let mut pump = EncodePump::new(encoder, sink);
    while generator.fill_next(&mut frame)? {
        pump.encode(&frame)?;
    }
    let flushed = pump.flush()?;
    let output = flushed.sink.close()?;
    Ok(Encoded { encoder: flushed.encoder, output, stats: flushed.stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RawSink;
    use crate::testing::ScriptedEncoder;

    #[test]
    fn one_submit_per_frame_plus_flush() {
        for duration_ms in [0, 1, 10, 1000, 1001] {
            let tone = ToneConfig { frequency: 440., duration_ms };
            let total = tone.total_samples(48000);
            let frames = total.div_ceil(ScriptedEncoder::FRAME_SAMPLES as u64);

            let encoder = ScriptedEncoder::new(3);
            let encoded = encode_tone(&tone, encoder, RawSink::new(Vec::new())).unwrap();
            assert_eq!(encoded.stats.frames_submitted, frames, "{duration_ms} ms");
            assert_eq!(encoded.stats.flush_submits, 1);
            assert_eq!(encoded.stats.packets_written, frames);
            assert_eq!(encoded.stats.bytes_written, encoded.output.len() as u64);
        }
    }

    #[test]
    fn every_refill_leaves_retained_frames_alone() {
        let tone = ToneConfig { frequency: 440., duration_ms: 10 };
        let mut encoder = ScriptedEncoder::new(2);
        encoder.retain = true;
        let encoded = encode_tone(&tone, encoder, RawSink::new(Vec::new())).unwrap();
        let retained = &encoded.encoder.retained;
        assert_eq!(retained.len(), 8);

        // Same tone rendered without anything holding on to the frame.
        let frame_samples = ScriptedEncoder::FRAME_SAMPLES;
        let mut generator = ToneGenerator::new(&tone, 48000, frame_samples).unwrap();
        let mut frame = AudioFrame::for_encoder(encoded.encoder.config(), frame_samples).unwrap();
        for (i, held) in retained.iter().enumerate() {
            assert!(generator.fill_next(&mut frame).unwrap());
            assert_eq!(held.pts(), (i * frame_samples) as u64);
            assert_eq!(held.samples().get(0, 0), frame.samples().get(0, 0), "frame {i}");
            assert_eq!(held.data(), frame.data(), "frame {i}");
        }

        for (i, a) in retained.iter().enumerate() {
            for b in retained[i + 1..].iter() {
                assert_ne!(a.data().as_ptr(), b.data().as_ptr());
            }
        }
    }

    #[test]
    fn rejection_aborts_the_run() {
        let mut encoder = ScriptedEncoder::new(0);
        encoder.reject_after = Some(3);
        let err = match encode_tone(&ToneConfig::default(), encoder, RawSink::new(Vec::new())) {
            Err(err) => err,
            Ok(_) => panic!("run survived a rejected frame"),
        };
        assert!(matches!(err, crate::Error::EncoderSubmit(_)));
    }
}
