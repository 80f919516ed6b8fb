// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::VecDeque;

use crate::encoder::{Encoder, EncoderConfig, Receive};
use crate::frame::{AudioFrame, EncodedPacket};
use crate::{Error, Result};

/// Test encoder with a configurable delay between input and output.
///
/// Each frame turns into one packet whose payload is derived from the first
/// sample of the frame, `delay` frames are held back until the flush.
pub struct ScriptedEncoder {
    config: EncoderConfig,
    delay: usize,
    held: VecDeque<(u8, u64)>,
    ready: VecDeque<(u8, u64)>,
    flushed: bool,
    /// Whether each send carried a frame (`true`) or the end of stream.
    pub sends: Vec<bool>,
    /// Keeps a reference on every submitted frame, as a lookahead encoder would.
    pub retain: bool,
    pub retained: Vec<AudioFrame>,
    /// Number of frames accepted before every further one gets rejected.
    pub reject_after: Option<usize>,
    pub fail_receive: bool,
}

impl ScriptedEncoder {
    pub const FRAME_SAMPLES: usize = 64;

    pub fn new(delay: usize) -> Self {
        Self {
            config: EncoderConfig::default(),
            delay,
            held: VecDeque::new(),
            ready: VecDeque::new(),
            flushed: false,
            sends: vec![],
            retain: false,
            retained: vec![],
            reject_after: None,
            fail_receive: false,
        }
    }

    pub fn payload(tag: u8) -> Vec<u8> {
        vec![tag; tag as usize % 4 + 1]
    }

    pub fn frames_sent(&self) -> usize {
        self.sends.iter().filter(|&&s| s).count()
    }
}

impl Encoder for ScriptedEncoder {
    fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn frame_samples(&self) -> usize {
        Self::FRAME_SAMPLES
    }

    fn send_frame(&mut self, frame: Option<&AudioFrame>) -> Result<()> {
        if self.flushed {
            crate::bail!("send after flush")
        }
        match frame {
            Some(frame) => {
                if self.reject_after.is_some_and(|n| self.frames_sent() >= n) {
                    crate::bail!("frame rejected")
                }
                self.config.check_frame(frame, Self::FRAME_SAMPLES)?;
                self.held.push_back((frame.samples().get(0, 0) as u8, frame.pts()));
                if self.retain {
                    self.retained.push(frame.clone());
                }
                while self.held.len() > self.delay {
                    if let Some(p) = self.held.pop_front() {
                        self.ready.push_back(p)
                    }
                }
            }
            None => {
                self.ready.extend(self.held.drain(..));
                self.flushed = true;
            }
        }
        self.sends.push(frame.is_some());
        Ok(())
    }

    fn receive_packet(&mut self, packet: &mut EncodedPacket) -> Result<Receive> {
        if self.fail_receive {
            return Err(Error::msg("scripted failure"));
        }
        match self.ready.pop_front() {
            Some((tag, pts)) => {
                packet.fill(&Self::payload(tag), pts, Self::FRAME_SAMPLES as u64);
                Ok(Receive::Packet)
            }
            None if self.flushed => Ok(Receive::Eof),
            None => Ok(Receive::Again),
        }
    }
}
