use crate::grib::sections::DecodedSection;
use crate::grib::{GribError, Result};

/// Index of "Number of data points where values are specified" in the decoded section 5.
pub(crate) const NUM_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct DataRepresentationDefinition {
    pub num_points: usize,
    pub template_number: u16,
    pub packing: Option<SimplePacking>,
}

impl DataRepresentationDefinition {
    pub fn from_section(sect5: &DecodedSection) -> Result<Self> {
        let template_number = sect5.value(3)? as u16;

        let packing = match (template_number, sect5.extended) {
            (0, true) => Some(SimplePacking::from_section(sect5)?),
            _ => None,
        };

        Ok(Self {
            num_points: sect5.value(NUM_POINTS)? as usize,
            template_number,
            packing,
        })
    }
}

/// Data Representation Template 5.0: Grid point data - simple packing
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePacking {
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub num_bits: usize,
    pub values_type: u8,
}

impl SimplePacking {
    pub fn from_section(sect5: &DecodedSection) -> Result<Self> {
        if sect5.template_number != Some(0) || !sect5.extended {
            return Err(GribError::MissingField { section: 5, index: 4 });
        }

        Ok(Self {
            reference_value: sect5.value(4)? as f32,
            binary_scale_factor: sect5.value(5)? as i16,
            decimal_scale_factor: sect5.value(6)? as i16,
            num_bits: sect5.value(7)? as usize,
            values_type: sect5.value(8)? as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib::descriptor::{encode, FormatDescriptor};
    use crate::grib::sections::Section;

    #[test]
    fn simple_packing() {
        let mut bytes = encode(&[21.0, 5.0, 100.0, 0.0], FormatDescriptor("4u4S")).unwrap();
        bytes.extend(encode(&[273.5, -3.0, 2.0, 12.0, 0.0], FormatDescriptor("R22uu")).unwrap());
        let sect5 = Section { number: 5, length: 21, bytes }.decode().unwrap();

        let definition = DataRepresentationDefinition::from_section(&sect5).unwrap();
        assert_eq!(definition.num_points, 100);
        assert_eq!(definition.packing, Some(SimplePacking {
            reference_value: 273.5,
            binary_scale_factor: -3,
            decimal_scale_factor: 2,
            num_bits: 12,
            values_type: 0,
        }));
    }

    #[test]
    fn other_packing() {
        let mut bytes = encode(&[21.0, 5.0, 100.0, 40.0], FormatDescriptor("4u4S")).unwrap();
        bytes.extend_from_slice(&[0; 10]);
        let sect5 = Section { number: 5, length: 21, bytes }.decode().unwrap();

        let definition = DataRepresentationDefinition::from_section(&sect5).unwrap();
        assert_eq!(definition.template_number, 40);
        assert_eq!(definition.packing, None);
        assert!(matches!(SimplePacking::from_section(&sect5), Err(GribError::MissingField { section: 5, .. })));
    }
}
