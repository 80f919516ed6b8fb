// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use byteorder::{ByteOrder, NativeEndian};

use crate::encoder::EncoderConfig;
use crate::format::{ChannelLayout, SampleFormat};
use crate::Result;

/// A block of raw interleaved audio, the encoder's input granularity.
///
/// The buffer is reference counted so that an encoder can keep a cheap clone of
/// a submitted frame. `make_writable` copies the buffer when such a clone is
/// still alive, so refilling a frame never alters what the encoder holds.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    format: SampleFormat,
    sample_rate: u32,
    layout: ChannelLayout,
    nb_samples: usize,
    pts: u64,
    data: Arc<Vec<u8>>,
}

impl AudioFrame {
    pub fn new(
        format: SampleFormat,
        sample_rate: u32,
        layout: ChannelLayout,
        nb_samples: usize,
    ) -> Result<Self> {
        if nb_samples == 0 {
            crate::bail!("could not allocate audio data buffers: empty frame")
        }
        let len = nb_samples * layout.channels() * format.bytes_per_sample();
        let data = Arc::new(vec![0u8; len]);
        Ok(Self { format, sample_rate, layout, nb_samples, pts: 0, data })
    }

    /// Allocates a frame matching what `config` expects as input.
    pub fn for_encoder(config: &EncoderConfig, nb_samples: usize) -> Result<Self> {
        Self::new(config.sample_format, config.sample_rate, config.layout, nb_samples)
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Samples per channel.
    pub fn nb_samples(&self) -> usize {
        self.nb_samples
    }

    pub fn pts(&self) -> u64 {
        self.pts
    }

    pub fn set_pts(&mut self, pts: u64) {
        self.pts = pts
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn is_writable(&self) -> bool {
        Arc::strong_count(&self.data) == 1
    }

    /// Makes sure the buffer is not shared, copying it if it is.
    /// Returns `true` when a copy was made.
    pub fn make_writable(&mut self) -> bool {
        let shared = !self.is_writable();
        if shared {
            log::trace!("frame pts {} still referenced, copying {} bytes", self.pts, self.data.len());
        }
        Arc::make_mut(&mut self.data);
        shared
    }

    pub fn samples(&self) -> Interleaved<'_> {
        Interleaved { data: self.data.as_slice(), channels: self.channels() }
    }

    /// Mutable view on the samples, copying the buffer first if it is shared.
    pub fn samples_mut(&mut self) -> InterleavedMut<'_> {
        let channels = self.channels();
        let data = Arc::make_mut(&mut self.data);
        debug_assert_eq!(data.len(), self.nb_samples * channels * self.format.bytes_per_sample());
        InterleavedMut { data: data.as_mut_slice(), channels }
    }
}

const S16_BYTES: usize = 2;

/// Read-only view on interleaved S16 samples.
#[derive(Debug, Clone, Copy)]
pub struct Interleaved<'a> {
    data: &'a [u8],
    channels: usize,
}

impl Interleaved<'_> {
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.data.len() / (self.channels * S16_BYTES)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `index` or `channel` is out of range.
    pub fn get(&self, index: usize, channel: usize) -> i16 {
        debug_assert!(channel < self.channels, "channel {channel} out of range ({})", self.channels);
        debug_assert!(index < self.len(), "sample {index} out of range ({})", self.len());
        let offset = (index * self.channels + channel) * S16_BYTES;
        NativeEndian::read_i16(&self.data[offset..offset + S16_BYTES])
    }

    /// Copies every sample, interleaved, into `dst`.
    pub fn copy_to(&self, dst: &mut [i16]) {
        NativeEndian::read_i16_into(self.data, dst)
    }
}

/// Mutable view on interleaved S16 samples, one stride of `channels` samples
/// per sample index.
#[derive(Debug)]
pub struct InterleavedMut<'a> {
    data: &'a mut [u8],
    channels: usize,
}

impl InterleavedMut<'_> {
    fn len(&self) -> usize {
        self.data.len() / (self.channels * S16_BYTES)
    }

    /// # Panics
    ///
    /// Panics if `index` or `channel` is out of range.
    pub fn set(&mut self, index: usize, channel: usize, value: i16) {
        debug_assert!(channel < self.channels, "channel {channel} out of range ({})", self.channels);
        debug_assert!(index < self.len(), "sample {index} out of range ({})", self.len());
        let offset = (index * self.channels + channel) * S16_BYTES;
        NativeEndian::write_i16(&mut self.data[offset..offset + S16_BYTES], value)
    }

    /// Writes `value` to every channel of the given sample index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_all_channels(&mut self, index: usize, value: i16) {
        debug_assert!(index < self.len(), "sample {index} out of range ({})", self.len());
        let stride = self.channels * S16_BYTES;
        let slot = &mut self.data[index * stride..(index + 1) * stride];
        for sample in slot.chunks_exact_mut(S16_BYTES) {
            NativeEndian::write_i16(sample, value)
        }
    }
}

/// A block of compressed bitstream, the encoder's output granularity.
///
/// The same packet is handed to the encoder over and over, `unref` clears it
/// while keeping its allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedPacket {
    data: Vec<u8>,
    pts: u64,
    duration: u64,
}

impl EncodedPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&mut self, data: &[u8], pts: u64, duration: u64) {
        self.data.clear();
        self.data.extend_from_slice(data);
        self.pts = pts;
        self.duration = duration;
    }

    pub fn unref(&mut self) {
        self.data.clear();
        self.pts = 0;
        self.duration = 0;
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Timestamp of the first sample, in samples at the encoder rate.
    pub fn pts(&self) -> u64 {
        self.pts
    }

    /// Samples per channel covered by this packet.
    pub fn duration(&self) -> u64 {
        self.duration
    }
}
