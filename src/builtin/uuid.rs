use std::{fmt, str::FromStr};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UuidError {
    #[error("UUID must be 36 characters long, found {0}")]
    Length(usize),
    #[error("unexpected character at offset {0} of UUID")]
    Character(usize),
}

/// A UUID in its canonical `8-4-4-4-12` hex form. Parsing accepts either
/// case; display is lowercase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid([u8; 16]);

impl Uuid {
    #[inline]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

const HYPHENS: [usize; 4] = [8, 13, 18, 23];

impl FromStr for Uuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.as_bytes();
        if text.len() != 36 {
            return Err(UuidError::Length(s.chars().count()));
        }

        let mut bytes = [0u8; 16];
        let mut nibble = 0;
        for (offset, &byte) in text.iter().enumerate() {
            if HYPHENS.contains(&offset) {
                if byte != b'-' {
                    return Err(UuidError::Character(offset));
                }
                continue;
            }
            let value = char::from(byte)
                .to_digit(16)
                .ok_or(UuidError::Character(offset))? as u8;
            bytes[nibble / 2] |= if nibble % 2 == 0 { value << 4 } else { value };
            nibble += 1;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.0.iter().enumerate() {
            if matches!(index, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
