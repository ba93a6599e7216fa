//! Printing helpers for the currently playing row, mirroring the original
//! player's `PrintRow`. Purely cosmetic — the engine never consults this
//! module.

use std::fmt;

use crate::module::Row;

/// Renders one pattern row the way the reference player's `PrintRow` does:
/// `NNO  II  EAA | ...` per channel.
pub struct RowDisplay<'a> {
    pub row: &'a Row,
    pub pattern: usize,
    pub row_index: usize,
}

impl fmt::Display for RowDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:2}.{:02}: | ", self.pattern, self.row_index)?;
        for (i, slot) in self.row.iter().enumerate() {
            match slot.note_name() {
                Some(name) => write!(f, "{name:<4} ")?,
                None => write!(f, "---  ")?,
            }
            if slot.sample_number != 0 {
                write!(f, "{:02}  ", slot.sample_number)?;
            } else {
                write!(f, "--  ")?;
            }
            if slot.effect != 0 || slot.effect_arg != 0 {
                write!(f, "{:01X}{:02X}", slot.effect, slot.effect_arg)?;
            } else {
                write!(f, "---")?;
            }
            if i != self.row.len() - 1 {
                write!(f, " | ")?;
            } else {
                writeln!(f, " |")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;

    #[test]
    fn displays_empty_row() {
        let bytes = crate::module::tests::synth_module_bytes();
        let module = Module::parse(&bytes).unwrap();
        let row = module.patterns[0][1]; // row 1 is empty in the synthetic module
        let disp = RowDisplay {
            row: &row,
            pattern: 0,
            row_index: 1,
        };
        let s = disp.to_string();
        assert!(s.contains("---"));
    }

    #[test]
    fn displays_note_row() {
        let bytes = crate::module::tests::synth_module_bytes();
        let module = Module::parse(&bytes).unwrap();
        let row = module.patterns[0][0];
        let disp = RowDisplay {
            row: &row,
            pattern: 0,
            row_index: 0,
        };
        let s = disp.to_string();
        assert!(s.contains("C-2"));
        assert!(s.contains("01"));
    }
}
