//! Compact per-field format descriptors and the decoder driven by them.
//!
//! A descriptor is a string of one-character tags, each naming the width and
//! interpretation of one field:
//!
//! | tag | width | interpretation |
//! |-----|-------|----------------|
//! | `1` `2` `4` `8` | 1, 2, 4, 8 | signed, sign-magnitude |
//! | `u` | 1 | unsigned |
//! | `S` | 2 | unsigned |
//! | `C` | 4 | raw characters |
//! | `R` | 4 | IEEE-754 single precision |

use crate::grib::utils::{normalize, Buffer, GribInt};
use crate::grib::{GribError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Unsigned8,
    Unsigned16,
    Raw,
    Float,
}

impl FieldTag {
    pub fn size(&self) -> usize {
        match self {
            FieldTag::Signed8 | FieldTag::Unsigned8 => 1,
            FieldTag::Signed16 | FieldTag::Unsigned16 => 2,
            FieldTag::Signed32 | FieldTag::Raw | FieldTag::Float => 4,
            FieldTag::Signed64 => 8,
        }
    }

    fn interpret(&self, bytes: &[u8]) -> f64 {
        match self {
            FieldTag::Unsigned8 => bytes[0] as f64,
            FieldTag::Unsigned16 => u16::from_be_bytes([bytes[0], bytes[1]]) as f64,
            FieldTag::Signed8 => bytes[0].as_grib_int() as f64,
            FieldTag::Signed16 => u16::from_be_bytes([bytes[0], bytes[1]]).as_grib_int() as f64,
            FieldTag::Signed32 => u32::from_be_bytes(word(bytes)).as_grib_int() as f64,
            FieldTag::Signed64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                u64::from_be_bytes(raw).as_grib_int() as f64
            }
            FieldTag::Float => {
                let mut raw = word(bytes);
                normalize(&mut raw, 4);
                f32::from_ne_bytes(raw) as f64
            }
            FieldTag::Raw => u32::from_be_bytes(word(bytes)) as f64,
        }
    }

    fn encode(&self, value: f64, out: &mut Vec<u8>) {
        match self {
            FieldTag::Unsigned8 => out.push(value as u8),
            FieldTag::Unsigned16 => out.extend_from_slice(&(value as u16).to_be_bytes()),
            FieldTag::Signed8 | FieldTag::Signed16 | FieldTag::Signed32 | FieldTag::Signed64 => {
                let magnitude = (value.abs() as u64).to_be_bytes();
                let mut bytes = magnitude[8 - self.size()..].to_vec();
                if value.is_sign_negative() && value != 0.0 {
                    bytes[0] |= 0x80;
                }
                out.extend_from_slice(&bytes);
            }
            FieldTag::Float => out.extend_from_slice(&(value as f32).to_be_bytes()),
            FieldTag::Raw => out.extend_from_slice(&(value as u32).to_be_bytes()),
        }
    }
}

impl TryFrom<char> for FieldTag {
    type Error = GribError;

    fn try_from(tag: char) -> Result<Self> {
        match tag {
            '1' => Ok(FieldTag::Signed8),
            '2' => Ok(FieldTag::Signed16),
            '4' => Ok(FieldTag::Signed32),
            '8' => Ok(FieldTag::Signed64),
            'u' => Ok(FieldTag::Unsigned8),
            'S' => Ok(FieldTag::Unsigned16),
            'C' => Ok(FieldTag::Raw),
            'R' => Ok(FieldTag::Float),
            c => Err(GribError::InvalidDescriptor(c)),
        }
    }
}

fn word(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// Ordered list of field tags, e.g. `"4u22uuu2uuuuuuu"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor(pub &'static str);

impl FormatDescriptor {
    pub fn tags(&self) -> impl Iterator<Item = Result<FieldTag>> + 'static {
        self.0.chars().map(FieldTag::try_from)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total byte width of the fields described.
    pub fn size(&self) -> Result<usize> {
        self.tags().map(|tag| tag.map(|t| t.size())).sum()
    }
}

/// A decoded field together with its "missing" marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldValue {
    pub value: f64,
    /// Every byte of the field was 0xFF.
    pub missing: bool,
}

impl FieldValue {
    /// Bytes of a raw `C` field, as they appeared on the wire.
    pub fn as_tag(&self) -> [u8; 4] {
        (self.value as u32).to_be_bytes()
    }
}

/// Decodes the fields of `descriptor` from `buf` starting at `start`.
///
/// Returns the values in descriptor order and the offset just past the last
/// field, so that a template extension can be decoded right after a fixed prefix.
pub fn decode(buf: &[u8], start: usize, descriptor: FormatDescriptor) -> Result<(Vec<FieldValue>, usize)> {
    let mut buffer = Buffer::new(buf, start);
    let mut values = Vec::with_capacity(descriptor.len());

    for tag in descriptor.tags() {
        let tag = tag?;
        let bytes = buffer.take(tag.size())?;

        values.push(FieldValue {
            value: tag.interpret(bytes),
            missing: bytes.iter().all(|b| *b == 0xFF),
        });
    }

    Ok((values, buffer.pos()))
}

/// Inverse of [`decode`]: lays `values` out as described by `descriptor`.
pub fn encode(values: &[f64], descriptor: FormatDescriptor) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(descriptor.size()?);
    let mut values = values.iter();

    for tag in descriptor.tags() {
        let tag = tag?;
        let value = values.next().ok_or_else(|| GribError::FieldOverrun { offset: out.len(), len: out.len() })?;
        tag.encode(*value, &mut out);
    }

    Ok(out)
}
