use crate::grib::sections::DecodedSection;
use crate::grib::sections::sect7::simple::GridPointDataSimplePackingDecoder;
use crate::grib::{GribError, Result};

pub(crate) mod simple;

/// Octets preceding the packed data: length and section number.
pub(crate) const SECT7_HEADER_SIZE: usize = 5;

pub(crate) trait Grib2DataDecoder {
    fn decode(&self, sect5: &DecodedSection, sect7: &[u8]) -> Result<Vec<f64>>;
}

/// Reconstructs the field values packed in `sect7` as described by `sect5`.
///
/// One value is produced for every point that carries data: all grid points,
/// or only those set in the bit-map when one applies.
pub fn unpack_grid(sect7: &[u8], sect5: &DecodedSection) -> Result<Vec<f64>> {
    match sect5.template_number {
        Some(0) => GridPointDataSimplePackingDecoder {}.decode(sect5, sect7),
        Some(template) => Err(GribError::UnknownTemplate { section: 5, template }),
        None => Err(GribError::MissingField { section: 5, index: 3 }),
    }
}
