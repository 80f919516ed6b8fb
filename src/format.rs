// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

/// Raw sample encodings a frame can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit, native endian, interleaved.
    S16,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
    Quad,
    Surround51,
    Surround71,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Quad => 4,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
        }
    }
}

/// Picks the layout with the most channels among the ones a codec advertises.
/// The first one wins on ties, and stereo is used when nothing is advertised.
pub fn select_channel_layout(advertised: &[ChannelLayout]) -> ChannelLayout {
    let mut best: Option<ChannelLayout> = None;
    for &layout in advertised.iter() {
        match best {
            Some(b) if b.channels() >= layout.channels() => {}
            _ => best = Some(layout),
        }
    }
    best.unwrap_or(ChannelLayout::Stereo)
}
