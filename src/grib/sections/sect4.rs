use chrono::Duration;
use crate::grib::sections::DecodedSection;
use crate::grib::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDefinition {
    /// Number of coordinate values after Template
    pub num_coordinates: u16,
    /// Product Definition Template Number
    pub template_number: u16,
    pub product: Option<Product>,
}

/// Fields shared by product definition templates 4.0, 4.1, 4.8, 4.9 and 4.11.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub process_type: u8,
    pub background_process: u8,
    pub analysis_process: u8,
    pub hours: u16,
    pub minutes: u8,
    pub time_unit: u8,
    /// Forecast time in `time_unit`
    pub forecast_time_value: u32,
    pub forecast_time: Option<Duration>,
    pub first_surface: Surface,
    pub second_surface: Surface,
    pub ensemble: Option<Ensemble>,
    /// Length of the statistical processing time range, in its own unit
    pub statistical_period: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub surface_type: u8,
    pub scale_factor: i8,
    pub scaled_value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensemble {
    /// Type of ensemble forecast (see Code Table 4.6)
    pub kind: u8,
    pub perturbation: u8,
}

impl ProductDefinition {
    pub fn from_section(sect4: &DecodedSection) -> Result<Self> {
        let template_number = sect4.value(3)? as u16;

        let product = if sect4.extended {
            Some(Product::from_section(sect4, template_number)?)
        } else {
            None
        };

        Ok(Self {
            num_coordinates: sect4.value(2)? as u16,
            template_number,
            product,
        })
    }
}

impl Product {
    fn from_section(sect4: &DecodedSection, template_number: u16) -> Result<Self> {
        let field = |index: usize| sect4.value(index);

        let (ensemble, statistical_period) = match template_number {
            1 => (Some(Ensemble { kind: field(19)? as u8, perturbation: field(20)? as u8 }), None),
            8 => (None, Some(field(30)? as u32)),
            9 => (None, Some(field(37)? as u32)),
            11 => (Some(Ensemble { kind: field(19)? as u8, perturbation: field(20)? as u8 }), Some(field(33)? as u32)),
            _ => (None, None),
        };

        let time_unit = field(11)? as u8;
        let forecast_time_value = field(12)? as u32;

        Ok(Self {
            parameter_category: field(4)? as u8,
            parameter_number: field(5)? as u8,
            process_type: field(6)? as u8,
            background_process: field(7)? as u8,
            analysis_process: field(8)? as u8,
            hours: field(9)? as u16,
            minutes: field(10)? as u8,
            time_unit,
            forecast_time_value,
            forecast_time: forecast_duration(time_unit, forecast_time_value as i64),
            first_surface: Surface {
                surface_type: field(13)? as u8,
                scale_factor: field(14)? as i8,
                scaled_value: field(15)? as i32,
            },
            second_surface: Surface {
                surface_type: field(16)? as u8,
                scale_factor: field(17)? as i8,
                scaled_value: field(18)? as i32,
            },
            ensemble,
            statistical_period,
        })
    }

    /// Forecast time plus the statistical processing period, both taken as
    /// counted in the same unit.
    pub fn forecast_end(&self) -> u32 {
        self.forecast_time_value + self.statistical_period.unwrap_or(0)
    }
}

/// Converts a value in a Code Table 4.4 time unit.
fn forecast_duration(unit: u8, value: i64) -> Option<Duration> {
    match unit {
        0 => Some(Duration::minutes(value)),
        1 => Some(Duration::hours(value)),
        2 => Some(Duration::days(value)),
        3 => Some(Duration::days(30 * value)),
        4 => Some(Duration::days(365 * value)),
        5 => Some(Duration::days(10 * 365 * value)),
        6 => Some(Duration::days(30 * 365 * value)),
        7 => Some(Duration::days(100 * 365 * value)),
        10 => Some(Duration::hours(3 * value)),
        11 => Some(Duration::hours(6 * value)),
        12 => Some(Duration::hours(12 * value)),
        13 => Some(Duration::seconds(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib::descriptor::{encode, FormatDescriptor};
    use crate::grib::sections::Section;

    fn sect4(template: u16, extension: &'static str, values: &[f64]) -> DecodedSection {
        let mut bytes = encode(&[0.0, 4.0, 0.0, template as f64], FormatDescriptor("4u2S")).unwrap();
        bytes.extend(encode(values, FormatDescriptor(extension)).unwrap());
        let length = bytes.len() as u32;
        bytes[..4].copy_from_slice(&length.to_be_bytes());

        Section { number: 4, length, bytes }.decode().unwrap()
    }

    #[test]
    fn point_in_time() {
        let values = [1.0, 8.0, 2.0, 0.0, 31.0, 0.0, 0.0, 1.0, 6.0, 1.0, 0.0, 0.0, 255.0, 0.0, 0.0];
        let product_definition = ProductDefinition::from_section(&sect4(0, "uuuuu2uu4u14u14", &values)).unwrap();
        let product = product_definition.product.unwrap();

        assert_eq!(product.parameter_category, 1);
        assert_eq!(product.parameter_number, 8);
        assert_eq!(product.forecast_time, Some(Duration::hours(6)));
        assert_eq!(product.statistical_period, None);
        assert_eq!(product.forecast_end(), 6);
        assert_eq!(product.first_surface.surface_type, 1);
    }

    #[test]
    fn ensemble_interval() {
        let mut values = vec![1.0, 8.0, 4.0, 0.0, 31.0, 0.0, 0.0, 1.0, 12.0, 1.0, 0.0, 0.0, 255.0, 0.0, 0.0];
        values.extend_from_slice(&[3.0, 7.0, 27.0]);
        values.extend_from_slice(&[2020.0, 4.0, 24.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        values.extend_from_slice(&[1.0, 2.0, 1.0, 6.0, 1.0, 0.0]);
        let descriptor = "uuuuu2uu4u14u14uuu2uuuuuu4uuu4u4";
        let product = ProductDefinition::from_section(&sect4(11, descriptor, &values)).unwrap().product.unwrap();

        assert_eq!(product.ensemble, Some(Ensemble { kind: 3, perturbation: 7 }));
        assert_eq!(product.statistical_period, Some(6));
        assert_eq!(product.forecast_end(), 18);
    }

    #[test]
    fn unknown_product() {
        let product_definition = ProductDefinition::from_section(&sect4(9999, "", &[])).unwrap();

        assert_eq!(product_definition.template_number, 9999);
        assert_eq!(product_definition.product, None);
    }
}
