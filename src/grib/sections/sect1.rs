use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use crate::grib::sections::DecodedSection;
use crate::grib::{GribError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// Identification of originating/generating centre (see Common Code Table C-1)
    pub centre_id: u16,
    /// Identification of originating/generating sub-centre (allocated by originating/ generating centre)
    pub subcentre_id: u16,
    /// GRIB Master Tables Version Number (see Code Table 1.0)
    pub master_table_version: u8,
    /// GRIB Local Tables Version Number (see Code Table 1.1)
    pub local_table_version: u8,
    /// Significance of Reference Time (see Code Table 1.2)
    pub ref_time_significance: u8,
    /// Reference time of data
    pub ref_time: DateTime<Utc>,
    /// Production status of processed data in this GRIB message
    /// (see Code Table 1.3)
    pub prod_status: u8,
    /// Type of processed data in this GRIB message (see Code Table 1.4)
    pub data_type: u8,
}

impl Identification {
    pub fn from_section(sect1: &DecodedSection) -> Result<Self> {
        let field = |index: usize| sect1.value(index);

        let ref_time = NaiveDate::from_ymd_opt(field(7)? as i32, field(8)? as u32, field(9)? as u32)
            .and_then(|date| date.and_hms_opt(field(10).ok()? as u32, field(11).ok()? as u32, field(12).ok()? as u32))
            .ok_or_else(|| GribError::ParseError(String::from("Invalid reference time")))?;

        Ok(Self {
            centre_id: field(2)? as u16,
            subcentre_id: field(3)? as u16,
            master_table_version: field(4)? as u8,
            local_table_version: field(5)? as u8,
            ref_time_significance: field(6)? as u8,
            ref_time: Utc.from_utc_datetime(&ref_time),
            prod_status: field(13)? as u8,
            data_type: field(14)? as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib::descriptor::FieldValue;

    fn section(values: &[f64]) -> DecodedSection {
        DecodedSection {
            number: 1,
            template_number: None,
            extended: false,
            values: values.iter().map(|v| FieldValue { value: *v, missing: false }).collect(),
        }
    }

    #[test]
    fn reference_time() {
        let sect1 = section(&[21.0, 1.0, 34.0, 0.0, 2.0, 1.0, 1.0, 2020.0, 4.0, 23.0, 12.0, 30.0, 0.0, 0.0, 1.0]);
        let identification = Identification::from_section(&sect1).unwrap();

        assert_eq!(identification.centre_id, 34);
        assert_eq!(identification.ref_time, Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2020, 4, 23).unwrap().and_hms_opt(12, 30, 0).unwrap()
        ));
        assert_eq!(identification.data_type, 1);
    }

    #[test]
    fn invalid_date() {
        let sect1 = section(&[21.0, 1.0, 34.0, 0.0, 2.0, 1.0, 1.0, 2020.0, 13.0, 23.0, 12.0, 30.0, 0.0, 0.0, 1.0]);

        assert!(matches!(Identification::from_section(&sect1), Err(GribError::ParseError(_))));
    }

    #[test]
    fn truncated() {
        let sect1 = section(&[21.0, 1.0, 34.0]);

        assert!(matches!(Identification::from_section(&sect1), Err(GribError::MissingField { section: 1, index: 7 })));
    }
}
