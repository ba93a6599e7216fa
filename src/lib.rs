//! Library surface for the module player: the format loader, playback
//! engine, and audio sink abstraction. `main.rs` is a thin CLI shell over
//! this crate; integration tests exercise the engine through here too.

pub mod bytereader;
pub mod engine;
pub mod error;
pub mod module;
pub mod sink;
pub mod tables;
pub mod tracker;
