// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::VecDeque;

use crate::encoder::{Encoder, EncoderConfig, Receive};
use crate::format::ChannelLayout;
use crate::frame::{AudioFrame, EncodedPacket};
use crate::{Error, Result};

// This must be an allowed value among 120, 240, 480, 960, 1920, and 2880.
// Using a different value would result in a BadArg "invalid argument" error when calling encode.
// https://opus-codec.org/docs/opus_api-1.2/group__opus__encoder.html#ga4ae9905859cd241ef4bb5c59cd5e5309
pub const OPUS_ENCODER_FRAME_SIZE: usize = 960;

// Recommended upper bound for a single opus packet.
const MAX_PACKET_SIZE: usize = 4000;

pub struct OpusEncoder {
    encoder: opus::Encoder,
    config: EncoderConfig,
    pending: VecDeque<(Vec<u8>, u64)>,
    pcm: Vec<i16>,
    out_buf: Vec<u8>,
    frames_in: usize,
    next_pts: u64,
    flushing: bool,
    lookahead: u32,
}

impl OpusEncoder {
    pub const SUPPORTED_LAYOUTS: &'static [ChannelLayout] =
        &[ChannelLayout::Mono, ChannelLayout::Stereo];

    pub fn new(config: EncoderConfig) -> Result<Self> {
        let channels = match config.layout {
            ChannelLayout::Mono => opus::Channels::Mono,
            ChannelLayout::Stereo => opus::Channels::Stereo,
            layout => return Err(Error::UnsupportedLayout(layout)),
        };
        let mut encoder =
            opus::Encoder::new(config.sample_rate, channels, opus::Application::Audio)?;
        encoder.set_bitrate(opus::Bitrate::Bits(config.bit_rate as i32))?;
        let lookahead = u32::try_from(encoder.get_lookahead()?).map_err(Error::msg)?;
        log::debug!(
            "opened opus encoder: {} Hz, {:?}, {} bps, {} samples per frame, lookahead {}",
            config.sample_rate,
            config.layout,
            config.bit_rate,
            OPUS_ENCODER_FRAME_SIZE,
            lookahead
        );
        let pcm = vec![0i16; OPUS_ENCODER_FRAME_SIZE * config.channels()];
        Ok(Self {
            encoder,
            config,
            pending: VecDeque::new(),
            pcm,
            out_buf: vec![0u8; MAX_PACKET_SIZE],
            frames_in: 0,
            next_pts: 0,
            flushing: false,
            lookahead,
        })
    }

    /// Samples per channel, at the encoder rate, the encoder delays its output by.
    pub fn lookahead(&self) -> u32 {
        self.lookahead
    }

    /// Samples at 48kHz a decoder has to drop at the start of the stream.
    pub fn pre_skip(&self) -> Result<u16> {
        let pre_skip = self.lookahead as u64 * 48_000 / self.config.sample_rate as u64;
        u16::try_from(pre_skip).map_err(Error::msg)
    }

    fn encode_pcm(&mut self, pts: u64) -> Result<()> {
        let size = self.encoder.encode(&self.pcm, &mut self.out_buf)?;
        if size > 0 {
            self.pending.push_back((self.out_buf[..size].to_vec(), pts));
        }
        self.next_pts = pts + OPUS_ENCODER_FRAME_SIZE as u64;
        Ok(())
    }
}

impl Encoder for OpusEncoder {
    fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn frame_samples(&self) -> usize {
        OPUS_ENCODER_FRAME_SIZE
    }

    fn send_frame(&mut self, frame: Option<&AudioFrame>) -> Result<()> {
        if self.flushing {
            crate::bail!("the encoder has already been flushed")
        }
        match frame {
            Some(frame) => {
                self.config.check_frame(frame, OPUS_ENCODER_FRAME_SIZE)?;
                frame.samples().copy_to(&mut self.pcm);
                self.encode_pcm(frame.pts())?;
                self.frames_in += 1;
            }
            None => {
                // Push one frame of silence through so that the lookahead held
                // by the encoder ends up in a packet.
                if self.frames_in > 0 {
                    self.pcm.fill(0);
                    self.encode_pcm(self.next_pts)?;
                }
                log::debug!(
                    "opus encoder flushed after {} frames, {} packets pending",
                    self.frames_in,
                    self.pending.len()
                );
                self.flushing = true;
            }
        }
        Ok(())
    }

    fn receive_packet(&mut self, packet: &mut EncodedPacket) -> Result<Receive> {
        match self.pending.pop_front() {
            Some((data, pts)) => {
                packet.fill(&data, pts, OPUS_ENCODER_FRAME_SIZE as u64);
                Ok(Receive::Packet)
            }
            None if self.flushing => Ok(Receive::Eof),
            None => Ok(Receive::Again),
        }
    }
}
