use num::ToPrimitive;
use crate::grib::GribError;
use crate::grib::sections::DecodedSection;
use crate::grib::sections::sect5::{SimplePacking, NUM_POINTS};
use crate::grib::sections::sect7::{Grib2DataDecoder, SECT7_HEADER_SIZE};
use crate::grib::utils::read_bits;

pub(crate) struct GridPointDataSimplePackingDecoder {}

impl Grib2DataDecoder for GridPointDataSimplePackingDecoder {
    fn decode(&self, sect5: &DecodedSection, sect7: &[u8]) -> crate::grib::Result<Vec<f64>> {

        let num_points = sect5.value(NUM_POINTS)? as usize;
        let data = SimplePacking::from_section(sect5)?;

        if data.num_bits == 0 {
            return Ok(vec![data.reference_value as f64; num_points]);
        }

        if data.num_bits > 32 {
            return Err(GribError::Format(format!("Unsupported bit width {}", data.num_bits)));
        }

        let packed = sect7.get(SECT7_HEADER_SIZE..).unwrap_or_default();
        let required = (num_points * data.num_bits + 7) / 8;
        if packed.len() < required {
            return Err(GribError::Format(format!(
                "Length Mismatch : {} points of {} bits need {} octets, found {}",
                num_points, data.num_bits, required, packed.len()
            )));
        }

        let num_bits = data.num_bits;
        let encoded = (0..num_points).map(|i| read_bits(packed, i * num_bits, num_bits));
        let decoder = SimpleDecoderIterator::new(encoded, data.reference_value as f64, data.binary_scale_factor, data.decimal_scale_factor);

        Ok(decoder.collect())
    }
}

pub(crate) struct SimpleDecoderIterator<I: Iterator<Item = N>, N: ToPrimitive> {
    bitwise_iter: I,
    reference_value: f64,
    binary_scale: f64,
    decimal_scale: f64,
}

impl<I: Iterator<Item = N>, N: ToPrimitive> SimpleDecoderIterator<I, N> {
    pub(crate) fn new(bitwise_iter: I, reference_value: f64, binary_scale_factor: i16, decimal_scale_factor: i16) -> Self {
        Self {
            bitwise_iter,
            reference_value,
            binary_scale: 2_f64.powi(binary_scale_factor as i32),
            decimal_scale: 10_f64.powi(decimal_scale_factor as i32),
        }
    }
}

impl<I: Iterator<Item = N>, N: ToPrimitive> Iterator for SimpleDecoderIterator<I, N> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let encoded = self.bitwise_iter.next()?.to_f64()?;

        Some((self.reference_value + encoded * self.binary_scale) / self.decimal_scale)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bitwise_iter.size_hint()
    }
}
