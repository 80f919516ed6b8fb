// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::frame::EncodedPacket;
use crate::sink::Sink;
use crate::{Error, Result};

const OPUS_HEAD_LEN: usize = 19;
const VENDOR: &str = "tone-encode";

// https://wiki.xiph.org/OggOpus#ID_Header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusHead {
    pub version: u8,
    pub channel_count: u8,
    pub pre_skip: u16,
    pub sample_rate: u32,
    pub output_gain: i16,
    pub mapping_family: u8,
}

impl OpusHead {
    pub fn new(channel_count: u8, pre_skip: u16, sample_rate: u32) -> Self {
        Self { version: 1, channel_count, pre_skip, sample_rate, output_gain: 0, mapping_family: 0 }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(b"OpusHead")?;
        w.write_u8(self.version)?;
        w.write_u8(self.channel_count)?;
        w.write_u16::<LittleEndian>(self.pre_skip)?;
        w.write_u32::<LittleEndian>(self.sample_rate)?;
        w.write_i16::<LittleEndian>(self.output_gain)?; // Q7.8 in dB
        w.write_u8(self.mapping_family)?;
        Ok(())
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() != OPUS_HEAD_LEN {
            return Err(Error::OpusHeadLength(data.len()));
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&data[..8]);
        if &magic != b"OpusHead" {
            return Err(Error::OpusHeadSignature(magic));
        }
        let mut r = &data[8..];
        Ok(Self {
            version: r.read_u8()?,
            channel_count: r.read_u8()?,
            pre_skip: r.read_u16::<LittleEndian>()?,
            sample_rate: r.read_u32::<LittleEndian>()?,
            output_gain: r.read_i16::<LittleEndian>()?,
            mapping_family: r.read_u8()?,
        })
    }
}

fn write_opus_tags<W: Write>(w: &mut W) -> std::io::Result<()> {
    // https://wiki.xiph.org/OggOpus#Comment_Header
    w.write_all(b"OpusTags")?;
    w.write_u32::<LittleEndian>(VENDOR.len() as u32)?; // vendor string length
    w.write_all(VENDOR.as_bytes())?; // vendor string, UTF8 encoded
    w.write_u32::<LittleEndian>(0u32)?; // number of tags
    Ok(())
}

/// Wraps the packets in an Ogg Opus stream, one packet per page, so that the
/// output can be played back by regular tools.
///
/// A packet is only written once the next one shows up, the last one has to be
/// flagged as the end of the stream when the sink gets closed. When the length
/// of the audio is known, the final granule position trims the padding the
/// encoder added at the end.
pub struct OggOpusSink<W: Write> {
    pw: ogg::PacketWriter<'static, W>,
    serial: u32,
    pending: Option<(Vec<u8>, u64)>,
    granule: u64,
    packets: u64,
    pre_skip: u64,
    length: Option<u64>,
}

impl OggOpusSink<std::io::BufWriter<std::fs::File>> {
    pub fn create<P: AsRef<std::path::Path>>(path: P, head: &OpusHead) -> Result<Self> {
        let file = std::fs::File::create(path.as_ref())
            .map_err(|e| Error::from(e).with_path(path.as_ref()).context("could not open output"))?;
        Self::new(std::io::BufWriter::new(file), head)
    }
}

impl<W: Write> OggOpusSink<W> {
    pub fn new(writer: W, head: &OpusHead) -> Result<Self> {
        let serial = 42;
        let mut pw = ogg::PacketWriter::new(writer);
        let mut head_data = Vec::with_capacity(OPUS_HEAD_LEN);
        head.write(&mut head_data)?;
        pw.write_packet(head_data, serial, ogg::PacketWriteEndInfo::EndPage, 0)?;
        let mut tags = Vec::new();
        write_opus_tags(&mut tags)?;
        pw.write_packet(tags, serial, ogg::PacketWriteEndInfo::EndPage, 0)?;
        Ok(Self {
            pw,
            serial,
            pending: None,
            granule: 0,
            packets: 0,
            pre_skip: head.pre_skip as u64,
            length: None,
        })
    }

    /// Number of samples per channel, at 48kHz, the decoded stream should have
    /// once the pre-skip has been dropped.
    pub fn with_length(mut self, samples: u64) -> Self {
        self.length = Some(samples);
        self
    }

    fn write_pending(&mut self, end: ogg::PacketWriteEndInfo) -> Result<()> {
        if let Some((data, granule)) = self.pending.take() {
            self.pw.write_packet(data, self.serial, end, granule)?;
            self.packets += 1;
        }
        Ok(())
    }
}

impl<W: Write> Sink for OggOpusSink<W> {
    type Output = W;

    fn write_packet(&mut self, packet: &EncodedPacket) -> Result<()> {
        self.write_pending(ogg::PacketWriteEndInfo::EndPage)?;
        self.granule += packet.duration();
        self.pending = Some((packet.data().to_vec(), self.granule));
        Ok(())
    }

    fn close(mut self) -> Result<W> {
        if let (Some(length), Some((_, granule))) = (self.length, self.pending.as_mut()) {
            *granule = (*granule).min(self.pre_skip + length);
        }
        self.write_pending(ogg::PacketWriteEndInfo::EndStream)?;
        log::debug!("ogg sink closed after {} packets, granule {}", self.packets, self.granule);
        let mut writer = self.pw.into_inner();
        writer.flush()?;
        Ok(writer)
    }
}
