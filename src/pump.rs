// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::encoder::{Encoder, Receive};
use crate::frame::{AudioFrame, EncodedPacket};
use crate::sink::Sink;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Ready,
    Submitted,
    Draining,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub frames_submitted: u64,
    pub flush_submits: u64,
    pub packets_written: u64,
    pub bytes_written: u64,
}

/// What remains of a pump once it has been flushed.
pub struct Flushed<E, S> {
    pub encoder: E,
    pub sink: S,
    pub stats: PumpStats,
}

/// Moves frames into an encoder and the resulting packets into a sink.
///
/// Packets reach the sink in the order the encoder hands them out. Flushing
/// consumes the pump, nothing can be submitted afterwards.
pub struct EncodePump<E: Encoder, S: Sink> {
    encoder: E,
    sink: S,
    packet: EncodedPacket,
    state: PumpState,
    eof: bool,
    stats: PumpStats,
}

impl<E: Encoder, S: Sink> EncodePump<E, S> {
    pub fn new(encoder: E, sink: S) -> Self {
        Self {
            encoder,
            sink,
            packet: EncodedPacket::new(),
            state: PumpState::Ready,
            eof: false,
            stats: PumpStats::default(),
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Hands a frame to the encoder, `None` signals the end of the input.
    pub fn submit(&mut self, frame: Option<&AudioFrame>) -> Result<()> {
        assert_eq!(self.state, PumpState::Ready, "frame submitted before draining the last one");
        self.encoder.send_frame(frame).map_err(|e| Error::EncoderSubmit(Box::new(e)))?;
        match frame {
            Some(_) => self.stats.frames_submitted += 1,
            None => self.stats.flush_submits += 1,
        }
        self.state = PumpState::Submitted;
        Ok(())
    }

    /// Writes every packet the encoder has ready to the sink, returns how many
    /// were written. Stops when the encoder wants more input or has nothing
    /// left to give.
    pub fn drain(&mut self) -> Result<usize> {
        self.state = PumpState::Draining;
        let mut written = 0;
        loop {
            match self.encoder.receive_packet(&mut self.packet) {
                Ok(Receive::Packet) => {
                    log::trace!(
                        "packet pts {} size {} duration {}",
                        self.packet.pts(),
                        self.packet.len(),
                        self.packet.duration()
                    );
                    self.sink.write_packet(&self.packet)?;
                    self.stats.packets_written += 1;
                    self.stats.bytes_written += self.packet.len() as u64;
                    self.packet.unref();
                    written += 1;
                }
                Ok(Receive::Again) => break,
                Ok(Receive::Eof) => {
                    self.eof = true;
                    break;
                }
                Err(e) => return Err(Error::EncoderDrain(Box::new(e))),
            }
        }
        self.state = PumpState::Ready;
        Ok(written)
    }

    /// Submits a frame and drains whatever it made available.
    pub fn encode(&mut self, frame: &AudioFrame) -> Result<usize> {
        self.submit(Some(frame))?;
        self.drain()
    }

    pub fn flush(mut self) -> Result<Flushed<E, S>> {
        self.submit(None)?;
        let trailing = self.drain()?;
        if !self.eof {
            log::warn!("encoder did not report the end of the stream after flushing");
        }
        log::debug!("flushed encoder, {trailing} trailing packets");
        Ok(Flushed { encoder: self.encoder, sink: self.sink, stats: self.stats })
    }
}
