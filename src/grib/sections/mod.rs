use crate::grib::descriptor::{self, FieldValue};
use crate::grib::templates;
use crate::grib::{GribError, Result, SECT8_ES_MAGIC};

pub mod sect1;
pub mod sect3;
pub mod sect4;
pub mod sect5;
pub mod sect6;
pub mod sect7;

/// Raw bytes of one section, length field included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Number : Number of the section
    pub number: u8,
    /// Length : Length of the section in octets
    pub length: u32,
    pub bytes: Vec<u8>,
}

impl Section {
    pub(crate) fn end_marker() -> Self {
        Self {
            number: 8,
            length: SECT8_ES_MAGIC.len() as u32,
            bytes: SECT8_ES_MAGIC.to_vec(),
        }
    }

    pub fn is_end(&self) -> bool {
        self.number == 8
    }

    /// Decodes the fixed part of the section and, for sections 3 to 5, the
    /// template extension named by its last fixed field.
    pub fn decode(&self) -> Result<DecodedSection> {
        let format = templates::section_format(self.number).ok_or_else(|| GribError::Format(format!("Unknown section number {}", self.number)))?;
        let (mut values, end) = descriptor::decode(&self.bytes, 0, format)?;

        let mut template_number = None;
        let mut extended = false;

        if templates::has_template(self.number) {
            let template = values.last().map(|v| v.value as u16).ok_or(GribError::MissingField {
                section: self.number,
                index: format.len(),
            })?;
            template_number = Some(template);

            if let Some(extension) = templates::lookup(self.number, template) {
                let (extra, _) = descriptor::decode(&self.bytes, end, extension)?;
                values.extend(extra);
                extended = true;
            }
        }

        Ok(DecodedSection {
            number: self.number,
            template_number,
            extended,
            values,
        })
    }
}

/// Field values of one section, in descriptor order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSection {
    pub number: u8,
    /// Template number read from the fixed part (sections 3, 4, 5)
    pub template_number: Option<u16>,
    /// The template was found in the catalogue and its fields follow the fixed part
    pub extended: bool,
    pub values: Vec<FieldValue>,
}

impl DecodedSection {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).map(|v| v.value)
    }

    pub fn value(&self, index: usize) -> Result<f64> {
        self.get(index).ok_or(GribError::MissingField { section: self.number, index })
    }

    pub fn is_missing(&self, index: usize) -> bool {
        self.values.get(index).map_or(true, |v| v.missing)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The template number was read but no extension is catalogued for it.
    pub(crate) fn unknown_template(&self) -> Option<GribError> {
        match self.template_number {
            Some(template) if !self.extended => Some(GribError::UnknownTemplate {
                section: self.number,
                template,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Discipline - GRIB Master Table Number (see Code Table 0.0)
    pub discipline: u8,
    /// GRIB Edition Number
    pub edition: u8,
    /// Total length of GRIB message in octets (including Section 0)
    pub total_length: u64,
}

impl Indicator {
    pub fn from_section(sect0: &DecodedSection) -> Result<Self> {
        Ok(Self {
            discipline: sect0.value(2)? as u8,
            edition: sect0.value(3)? as u8,
            total_length: sect0.value(4)? as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(number: u8, payload: &[u8]) -> Section {
        let length = (payload.len() + 5) as u32;
        let mut bytes = length.to_be_bytes().to_vec();
        bytes.push(number);
        bytes.extend_from_slice(payload);
        Section { number, length, bytes }
    }

    #[test]
    fn decodes_template_extension() {
        // 5.0: 4 points, R = 1.0, E = 0, D = 1, 8 bits
        let mut payload = vec![0, 0, 0, 4, 0, 0];
        payload.extend_from_slice(&1.0f32.to_be_bytes());
        payload.extend_from_slice(&[0, 0, 0, 1, 8, 0]);
        let decoded = section(5, &payload).decode().unwrap();

        assert_eq!(decoded.template_number, Some(0));
        assert!(decoded.extended);
        assert_eq!(decoded.len(), 9);
        assert_eq!(decoded.get(2), Some(4.0));
        assert_eq!(decoded.get(4), Some(1.0));
        assert_eq!(decoded.get(6), Some(1.0));
        assert_eq!(decoded.get(7), Some(8.0));
        assert!(decoded.unknown_template().is_none());
    }

    #[test]
    fn unknown_template_keeps_fixed_part() {
        // 4.9999 with a trailing payload nobody understands
        let payload = [0, 0, 0x27, 0x0F, 1, 2, 3];
        let decoded = section(4, &payload).decode().unwrap();

        assert_eq!(decoded.template_number, Some(9999));
        assert!(!decoded.extended);
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.value(0).unwrap(), 12.0);
        assert!(matches!(
            decoded.unknown_template(),
            Some(GribError::UnknownTemplate { section: 4, template: 9999 })
        ));
    }

    #[test]
    fn value_out_of_range() {
        let decoded = section(7, &[]).decode().unwrap();

        assert_eq!(decoded.len(), 2);
        assert!(decoded.is_missing(5));
        assert!(matches!(decoded.value(5), Err(GribError::MissingField { section: 7, index: 5 })));
    }

    #[test]
    fn end_marker() {
        let end = Section::end_marker();
        assert!(end.is_end());

        let decoded = end.decode().unwrap();
        assert_eq!(&decoded.values[0].as_tag(), b"7777");
    }
}
