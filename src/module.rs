//! The in-memory `Module` value and the binary loader that produces it.
//!
//! Only the Protracker "M.K." / "FLT4" 31-sample, 4-channel variant is
//! recognized; anything else is a hard [`LoadError::UnsupportedFormat`]
//! rather than a silent reinterpretation as a 15-sample module.

use std::fs;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::bytereader::ByteReader;
use crate::error::LoadError;
use crate::tables::nearest_note_index;

const HEADER_SIZE: usize = 1084;
const SAMPLE_HEADER_SIZE: usize = 30;
const NUM_SAMPLE_SLOTS: usize = 31;
const PATTERN_SIZE: usize = 1024;
const ROWS_PER_PATTERN: usize = 64;
const CHANNELS: usize = 4;

/// One of the 31 instrument slots. Samples with `length == 0` carry no
/// sample data.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub length: usize,
    /// 0..15; values 8..15 represent finetunes -8..-1. Indexes directly
    /// into [`crate::tables::FINETUNE_TABLE`].
    pub finetune: u8,
    /// 0..64.
    pub volume: u8,
    pub repeat_point: usize,
    pub repeat_length: usize,
    /// Signed 8-bit PCM, `length` bytes. Bytes 0 and 1 are forced to zero
    /// to suppress a click at note start. `None` when `length == 0`.
    pub data: Option<Vec<i8>>,
}

impl Sample {
    /// `repeat_length <= 2` means "no loop" in Protracker's convention.
    pub fn loops(&self) -> bool {
        self.repeat_length > 2
    }
}

/// One (channel, row) cell within a pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct Slot {
    /// 0..31; 0 means "reuse the channel's current instrument".
    pub sample_number: u8,
    /// 12-bit Amiga period; 0 means "no note".
    pub note_period: u16,
    /// 0..15.
    pub effect: u8,
    pub effect_arg: u8,
    /// Nearest row in the base (finetune 0) period table, 0..35.
    pub note_index: usize,
}

impl Slot {
    /// Printable note name ("C-2", etc.), or `None` if this slot has no
    /// note.
    pub fn note_name(&self) -> Option<String> {
        if self.note_period == 0 {
            return None;
        }
        let name = crate::tables::NOTE_NAMES[self.note_index % 12];
        let octave = self.note_index / 12 + 1;
        Some(format!("{name}{octave}"))
    }
}

pub type Row = [Slot; CHANNELS];
pub type Pattern = [Row; ROWS_PER_PATTERN];

/// A fully parsed Protracker module, immutable for the life of playback
/// with one documented exception: effect 14.5 rewrites a sample's
/// finetune in place.
#[derive(Debug, Clone)]
pub struct Module {
    pub song_name: String,
    /// Always exactly 31 entries (some may have `length == 0`).
    pub samples: Vec<Sample>,
    pub song_positions: [u8; 128],
    /// 1..128.
    pub song_length: u8,
    /// `max(song_positions[0..song_length]) + 1`.
    pub num_patterns: usize,
    pub patterns: Vec<Pattern>,
}

impl Module {
    /// Reads and parses a module file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Module, LoadError> {
        let data = fs::read(path)?;
        Module::parse(&data)
    }

    /// Parses a module already resident in memory. This is the seam
    /// integration tests use to exercise the loader without touching the
    /// filesystem.
    pub fn parse(data: &[u8]) -> Result<Module, LoadError> {
        if data.len() < HEADER_SIZE {
            return Err(LoadError::Truncated {
                expected: HEADER_SIZE,
                found: data.len(),
            });
        }

        let magic = &data[1080..1084];
        if magic != b"M.K." && magic != b"FLT4" {
            warn!(?magic, "module magic mismatch, refusing to guess a layout");
            return Err(LoadError::UnsupportedFormat);
        }

        let mut r = ByteReader::new(data);
        let song_name = r.read_sanitized_str(20)?;
        debug!(song_name, "parsing module header");

        let mut samples = Vec::with_capacity(NUM_SAMPLE_SLOTS);
        for _ in 0..NUM_SAMPLE_SLOTS {
            samples.push(read_sample_header(&mut r)?);
        }

        r.seek(950);
        let song_length = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let mut song_positions = [0u8; 128];
        song_positions.copy_from_slice(r.read_bytes(128)?);

        let num_patterns = song_positions[..128].iter().copied().max().unwrap_or(0) as usize + 1;
        trace!(num_patterns, song_length, "computed song geometry");

        r.seek(HEADER_SIZE);
        let mut patterns = Vec::with_capacity(num_patterns);
        for _ in 0..num_patterns {
            patterns.push(read_pattern(&mut r)?);
        }

        for sample in samples.iter_mut() {
            if sample.length == 0 {
                continue;
            }
            let bytes = r.read_bytes(sample.length)?;
            let mut data: Vec<i8> = bytes.iter().map(|&b| b as i8).collect();
            if data.len() >= 2 {
                data[0] = 0;
                data[1] = 0;
            }
            sample.data = Some(data);
        }

        Ok(Module {
            song_name,
            samples,
            song_positions,
            song_length,
            num_patterns,
            patterns,
        })
    }
}

fn read_sample_header(r: &mut ByteReader) -> Result<Sample, LoadError> {
    let name = r.read_sanitized_str(22)?;
    let length = r.read_u16()? as usize * 2;
    let finetune = r.read_u8()? & 0x0F;
    let volume = r.read_u8()?;
    let repeat_point = r.read_u16()? as usize * 2;
    let repeat_length = r.read_u16()? as usize * 2;
    Ok(Sample {
        name,
        length,
        finetune,
        volume,
        repeat_point,
        repeat_length,
        data: None,
    })
}

fn read_pattern(r: &mut ByteReader) -> Result<Pattern, LoadError> {
    let bytes = r.read_bytes(PATTERN_SIZE)?;
    let mut pattern: Pattern = [[Slot::default(); CHANNELS]; ROWS_PER_PATTERN];
    for row in 0..ROWS_PER_PATTERN {
        for ch in 0..CHANNELS {
            let base = (row * CHANNELS + ch) * 4;
            let b0 = bytes[base];
            let b1 = bytes[base + 1];
            let b2 = bytes[base + 2];
            let b3 = bytes[base + 3];

            let sample_number = (b0 & 0xF0) | (b2 >> 4);
            let note_period = (((b0 & 0x0F) as u16) << 8) | b1 as u16;
            let effect = b2 & 0x0F;
            let effect_arg = b3;
            let note_index = nearest_note_index(note_period);

            pattern[row][ch] = Slot {
                sample_number,
                note_period,
                effect,
                effect_arg,
                note_index,
            };
        }
    }
    Ok(pattern)
}
