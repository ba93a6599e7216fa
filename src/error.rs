//! Error types for the module loader and the audio sink boundary.
//!
//! The engine itself has no fallible operations once playback has begun:
//! malformed slots are neutralised silently (see [`crate::engine`]).
//! Errors only ever originate at the two edges of the system — loading a
//! file, and opening the audio device.

use thiserror::Error;

/// Failure loading and parsing a module file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read module file: {0}")]
    Io(#[from] std::io::Error),

    #[error("module file truncated: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("unsupported module format (expected M.K. or FLT4 tag)")]
    UnsupportedFormat,
}

/// Failure opening or writing to the audio output device.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("no audio output device available")]
    Unavailable,

    #[error("audio device rejected requested format: {0}")]
    Incompatible(String),
}
