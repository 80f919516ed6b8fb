// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::format::{select_channel_layout, ChannelLayout, SampleFormat};
use crate::frame::{AudioFrame, EncodedPacket};
use crate::Result;

pub const DEFAULT_BIT_RATE: u32 = 96_000;
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Parameters an encoder is opened with. They do not change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub bit_rate: u32,
    pub sample_format: SampleFormat,
    pub sample_rate: u32,
    pub layout: ChannelLayout,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bit_rate: DEFAULT_BIT_RATE,
            sample_format: SampleFormat::S16,
            sample_rate: DEFAULT_SAMPLE_RATE,
            layout: ChannelLayout::Stereo,
        }
    }
}

impl EncoderConfig {
    /// Default configuration using the widest layout among `advertised`.
    pub fn for_layouts(advertised: &[ChannelLayout]) -> Self {
        Self { layout: select_channel_layout(advertised), ..Self::default() }
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Checks that `frame` carries `nb_samples` samples in the configured format.
    pub fn check_frame(&self, frame: &AudioFrame, nb_samples: usize) -> Result<()> {
        let expected = (self.sample_format, self.sample_rate, self.layout, nb_samples);
        let actual = (frame.format(), frame.sample_rate(), frame.layout(), frame.nb_samples());
        if expected != actual {
            return Err(crate::Error::FrameMismatch {
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
            });
        }
        Ok(())
    }
}

/// Outcome of asking an encoder for a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receive {
    /// The packet handle was filled.
    Packet,
    /// Nothing ready, more input has to be sent first.
    Again,
    /// The encoder has been flushed and everything has been handed out.
    Eof,
}

/// Streaming encoder: raw frames in, compressed packets out.
///
/// A frame is sent with `send_frame(Some(frame))`, then `receive_packet` is
/// called until it returns `Again`. Sending `None` marks the end of the input,
/// after which `receive_packet` hands out the buffered packets and then `Eof`.
pub trait Encoder {
    fn config(&self) -> &EncoderConfig;

    /// Samples per channel every submitted frame must hold.
    fn frame_samples(&self) -> usize;

    fn send_frame(&mut self, frame: Option<&AudioFrame>) -> Result<()>;

    fn receive_packet(&mut self, packet: &mut EncodedPacket) -> Result<Receive>;
}
