// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod error;
pub mod encoder;
pub mod format;
pub mod frame;
pub mod ogg_opus;
pub mod opus_encoder;
pub mod pipeline;
pub mod pump;
pub mod sink;
pub mod tone;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
