//! A small big-endian cursor over an in-memory byte buffer.
//!
//! Module files store every multi-byte field big-endian, so unlike the
//! reader this one started from there is no little-endian path to carry.

use crate::error::LoadError;

#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], LoadError> {
        if self.offset + count > self.data.len() {
            return Err(LoadError::Truncated {
                expected: self.offset + count,
                found: self.data.len(),
            });
        }
        let slice = &self.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, LoadError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Big-endian 16-bit word.
    pub fn read_u16(&mut self) -> Result<u16, LoadError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a fixed-width, space-padded ASCII string and sanitizes it:
    /// replaces every non-printable byte, including embedded NULs, with a
    /// space rather than truncating (matches the original loader's
    /// `Sanitize`, which substitutes across the whole field).
    pub fn read_sanitized_str(&mut self, length: usize) -> Result<String, LoadError> {
        let bytes = self.read_bytes(length)?;
        let mut out = String::with_capacity(length);
        for &b in bytes {
            if (32..=126).contains(&b) {
                out.push(b as char);
            } else {
                out.push(' ');
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_word() {
        let data = [0x01, 0x02];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u16().unwrap(), 0x0102);
    }

    #[test]
    fn truncated_read_is_an_error() {
        let data = [0x01];
        let mut r = ByteReader::new(&data);
        assert!(matches!(r.read_u16(), Err(LoadError::Truncated { .. })));
    }

    #[test]
    fn sanitizes_non_printable_bytes() {
        let data = [b'h', b'i', 0x01, b'!', 0, b'x'];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_sanitized_str(6).unwrap(), "hi ! x");
    }

    #[test]
    fn embedded_nul_does_not_truncate_the_rest_of_the_field() {
        let data = [b'a', 0, b'b', 0, b'c'];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_sanitized_str(5).unwrap(), "a b c");
    }
}
