// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::format::ChannelLayout;

#[derive(thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Opus(#[from] opus::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The encoder refused a frame, or the end-of-stream marker.
    #[error("error sending the frame to the encoder: {0}")]
    EncoderSubmit(Box<Self>),

    /// The encoder failed while producing a packet.
    #[error("error encoding audio frame: {0}")]
    EncoderDrain(Box<Self>),

    #[error("unsupported channel layout {0:?}")]
    UnsupportedLayout(ChannelLayout),

    #[error("frame mismatch: expected {expected}, got {actual}")]
    FrameMismatch { expected: String, actual: String },

    #[error("unexpected opus head signature {0:?}")]
    OpusHeadSignature([u8; 8]),

    #[error("unexpected len for opus head {0}")]
    OpusHeadLength(usize),

    /// User generated error message, typically created via `bail!`.
    #[error("{0}")]
    Msg(String),

    #[error("{context}: {inner}")]
    Context { inner: Box<Self>, context: Box<dyn std::fmt::Display + Send + Sync> },

    /// Adding path information to an error.
    #[error("{inner} (path: {path:?})")]
    WithPath { inner: Box<Self>, path: std::path::PathBuf },

    #[error("{inner}\n{backtrace}")]
    WithBacktrace { inner: Box<Self>, backtrace: Box<std::backtrace::Backtrace> },
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Msg(format!($msg).into()).bt())
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::Msg(format!($err).into()).bt())
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($fmt, $($arg)*).into()).bt())
    };
}

impl Error {
    pub fn msg(err: impl std::fmt::Display) -> Self {
        Self::Msg(err.to_string()).bt()
    }

    pub fn bt(self) -> Self {
        let backtrace = std::backtrace::Backtrace::capture();
        match backtrace.status() {
            std::backtrace::BacktraceStatus::Disabled
            | std::backtrace::BacktraceStatus::Unsupported => self,
            _ => Self::WithBacktrace { inner: Box::new(self), backtrace: Box::new(backtrace) },
        }
    }

    pub fn with_path<P: AsRef<std::path::Path>>(self, p: P) -> Self {
        Self::WithPath { inner: Box::new(self), path: p.as_ref().to_path_buf() }
    }

    pub fn context(self, c: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self::Context { inner: Box::new(self), context: Box::new(c) }
    }

    /// Strips the wrappers added by `context`, `with_path` and `bt`.
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { inner, .. }
            | Self::WithPath { inner, .. }
            | Self::WithBacktrace { inner, .. } => inner.root(),
            other => other,
        }
    }
}
