use crate::grib::sections::{sect3, DecodedSection};
use crate::grib::utils::read_bits;
use crate::grib::{GribError, Result};

/// Octets preceding the bit-map: length, section number and bit-map indicator.
const SECT6_HEADER_SIZE: usize = 6;
/// Index of the bit-map indicator in the decoded section 6.
const INDICATOR: usize = 2;

/// Bit-map indicator (see Code Table 6.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitMapIndicator {
    /// A bit-map applies and follows the indicator
    Present,
    /// Bit-map predefined by the originating centre
    Predefined(u8),
    /// The bit-map of a previous field of the same message applies
    Previous,
    /// No bit-map applies
    None,
}

impl BitMapIndicator {
    pub fn from_section(sect6: &DecodedSection) -> Result<Self> {
        Ok(match sect6.value(INDICATOR)? as u8 {
            0 => BitMapIndicator::Present,
            254 => BitMapIndicator::Previous,
            255 => BitMapIndicator::None,
            n => BitMapIndicator::Predefined(n),
        })
    }
}

/// Expands the bit-map of `sect6` into one 0/1 presence flag per grid point of `sect3`.
pub fn unpack_bitmap(sect6: &[u8], sect3: &DecodedSection) -> Result<Vec<u8>> {
    let num_points = sect3.value(sect3::NUM_POINTS)? as usize;

    let bitmap = sect6.get(SECT6_HEADER_SIZE..).unwrap_or_default();
    if bitmap.len() * 8 < num_points {
        return Err(GribError::Format(format!(
            "Bit-map holds {} bits for {} grid points", bitmap.len() * 8, num_points
        )));
    }

    debug!("bitmap : {} points in {} octets", num_points, bitmap.len());

    Ok((0..num_points).map(|i| read_bits(bitmap, i, 1) as u8).collect())
}
