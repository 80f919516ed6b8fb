// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;

use crate::frame::EncodedPacket;
use crate::{Error, Result};

/// Destination for encoded packets.
pub trait Sink {
    /// What is left once the sink has been closed, typically the writer.
    type Output;

    fn write_packet(&mut self, packet: &EncodedPacket) -> Result<()>;

    fn close(self) -> Result<Self::Output>;
}

/// Writes the packet payloads back to back, with no framing at all. Decoding
/// the result requires knowing the codec out of band.
pub struct RawSink<W: Write> {
    writer: W,
    bytes_written: u64,
}

impl RawSink<std::io::BufWriter<std::fs::File>> {
    pub fn create<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::create(path.as_ref())
            .map_err(|e| Error::from(e).with_path(path.as_ref()).context("could not open output"))?;
        Ok(Self::new(std::io::BufWriter::new(file)))
    }
}

impl<W: Write> RawSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, bytes_written: 0 }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl<W: Write> Sink for RawSink<W> {
    type Output = W;

    fn write_packet(&mut self, packet: &EncodedPacket) -> Result<()> {
        self.writer.write_all(packet.data())?;
        self.bytes_written += packet.len() as u64;
        Ok(())
    }

    fn close(mut self) -> Result<W> {
        self.writer.flush()?;
        log::debug!("raw sink closed after {} bytes", self.bytes_written);
        Ok(self.writer)
    }
}
