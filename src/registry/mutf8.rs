//! Modified UTF-8
//!
//! The string encoding used by the registry format. It differs from UTF-8
//! in two ways: U+0000 is written as the two bytes `C0 80`, and characters
//! outside the BMP are written as two three-byte surrogate halves instead
//! of one four-byte sequence.

use std::fmt;

/// A byte sequence that is not valid modified UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSequence {
    /// Offset of the offending byte within the input
    pub position: usize,
    pub reason: &'static str,
}

impl fmt::Display for InvalidSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at string byte {}", self.reason, self.position)
    }
}

impl std::error::Error for InvalidSequence {}

/// Number of bytes `s` occupies once encoded
pub fn encoded_len(s: &str) -> usize {
    s.encode_utf16().map(unit_len).sum()
}

fn unit_len(unit: u16) -> usize {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

/// Append the encoding of `s` to `out`
pub fn encode_into(s: &str, out: &mut Vec<u8>) {
    for unit in s.encode_utf16() {
        match unit_len(unit) {
            1 => out.push(unit as u8),
            2 => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
}

/// Decode a complete modified UTF-8 byte string
pub fn decode(bytes: &[u8]) -> Result<String, InvalidSequence> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let lead = bytes[pos];
        let unit = match lead >> 4 {
            0x0..=0x7 => {
                pos += 1;
                u16::from(lead)
            }
            0xC | 0xD => {
                let b = continuation(bytes, pos + 1)?;
                pos += 2;
                (u16::from(lead & 0x1F) << 6) | u16::from(b & 0x3F)
            }
            0xE => {
                let b = continuation(bytes, pos + 1)?;
                let c = continuation(bytes, pos + 2)?;
                pos += 3;
                (u16::from(lead & 0x0F) << 12) | (u16::from(b & 0x3F) << 6) | u16::from(c & 0x3F)
            }
            _ => {
                return Err(InvalidSequence {
                    position: pos,
                    reason: "invalid lead byte",
                })
            }
        };
        units.push(unit);
    }

    String::from_utf16(&units).map_err(|_| InvalidSequence {
        position: bytes.len(),
        reason: "unpaired surrogate",
    })
}

fn continuation(bytes: &[u8], pos: usize) -> Result<u8, InvalidSequence> {
    match bytes.get(pos) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(b),
        Some(_) => Err(InvalidSequence {
            position: pos,
            reason: "invalid continuation byte",
        }),
        None => Err(InvalidSequence {
            position: pos,
            reason: "truncated multi-byte sequence",
        }),
    }
}
