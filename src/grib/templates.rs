use crate::grib::descriptor::FormatDescriptor;

/// Fixed part of every section, indexed by section number.
const SECTION_FORMATS: [&str; 9] = [
    "C2uu8",           // Indicator
    "4u22uuu2uuuuuuu", // Identification
    "",                // Local use
    "4uu4uuS",         // Grid definition
    "4u2S",            // Product definition
    "4u4S",            // Data representation
    "4uu",             // Bit-map
    "4u",              // Data
    "C",               // End
];

/// Descriptor of the fixed part of section `number`, if it is a GRIB2 section.
pub fn section_format(number: u8) -> Option<FormatDescriptor> {
    SECTION_FORMATS.get(number as usize).copied().map(FormatDescriptor)
}

/// Whether section `number` carries a template number at the end of its fixed part.
pub fn has_template(number: u8) -> bool {
    (3..=5).contains(&number)
}

/// Descriptor extending section `section` for template `template`, or `None`
/// when the combination is not catalogued.
pub fn lookup(section: u8, template: u16) -> Option<FormatDescriptor> {
    let format = match (section, template) {
        // Latitude/longitude
        (3, 0) => "uu4u4u4444444u4444u",
        // Polar stereographic
        (3, 20) => "uu4u4u44444u4444uu",
        // Analysis or forecast at a point in time
        (4, 0) => "uuuuu2uu4u14u14",
        // Individual ensemble forecast
        (4, 1) => "uuuuu2uu4u14u14uuu",
        // Statistically processed over a time interval
        (4, 8) => "uuuuu2uu4u14u142uuuuuu4uuu4u4",
        // Probability forecast over a time interval
        (4, 9) => "uuuuu2uu4u14u14uuu14142uuuuuu4uuu4u4",
        // Ensemble forecast over a time interval
        (4, 11) => "uuuuu2uu4u14u14uuu2uuuuuu4uuu4u4",
        // Grid point data, simple packing
        (5, 0) => "R22uu",
        _ => return None,
    };

    Some(FormatDescriptor(format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_miss() {
        assert_eq!(lookup(4, 9999), None);
        assert_eq!(lookup(6, 0), None);
    }

    #[test]
    fn lookup_hit() {
        assert_eq!(lookup(5, 0), Some(FormatDescriptor("R22uu")));
        assert_eq!(lookup(3, 20).map(|d| d.len()), Some(18));
    }

    #[test]
    fn catalogue_is_well_formed() {
        let known = [(3, 0), (3, 20), (4, 0), (4, 1), (4, 8), (4, 9), (4, 11), (5, 0)];
        for (section, template) in known {
            let descriptor = lookup(section, template).unwrap();
            assert!(descriptor.size().is_ok(), "template {}.{}", section, template);
        }
        for number in 0..=8 {
            assert!(section_format(number).unwrap().size().is_ok());
        }
        assert_eq!(section_format(9), None);
    }

    #[test]
    fn fixed_part_sizes() {
        assert_eq!(section_format(0).unwrap().size().unwrap(), 16);
        assert_eq!(section_format(1).unwrap().size().unwrap(), 21);
        assert_eq!(section_format(3).unwrap().size().unwrap(), 14);
        assert_eq!(section_format(5).unwrap().size().unwrap(), 11);
        assert_eq!(lookup(3, 0).unwrap().size().unwrap(), 58);
    }
}
