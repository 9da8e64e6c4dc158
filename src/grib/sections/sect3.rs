use crate::grib::sections::DecodedSection;
use crate::grib::Result;

/// Index of "Number of data points" in the decoded section 3.
pub(crate) const NUM_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct GridDefinition {
    pub source: u8,
    /// Number of data points
    pub num_points: usize,
    pub optional_num_list_size: usize,
    pub optional_num_list_interpretation: u8,
    /// Grid Definition Template Number
    pub template_number: u16,
    pub grid: Grid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Grid {
    LatLon(Grid0),
    PolarStereographic(Grid20),
    Unknown,
}

impl GridDefinition {
    pub fn from_section(sect3: &DecodedSection) -> Result<Self> {
        let template_number = sect3.value(6)? as u16;

        let grid = match (template_number, sect3.extended) {
            (0, true) => Grid::LatLon(Grid0 {
                n_i: sect3.value(14)? as u32,
                n_j: sect3.value(15)? as u32,
                la1: sect3.value(18)? as i32,
                lo1: sect3.value(19)? as i32,
                resolution_and_component_flags: sect3.value(20)? as u8,
                la2: sect3.value(21)? as i32,
                lo2: sect3.value(22)? as i32,
                d_i: sect3.value(23)? as i32,
                d_j: sect3.value(24)? as i32,
                scanning_mode: sect3.value(25)? as u8,
            }),
            (20, true) => Grid::PolarStereographic(Grid20 {
                n_x: sect3.value(14)? as u32,
                n_y: sect3.value(15)? as u32,
                la1: sect3.value(16)? as i32,
                lo1: sect3.value(17)? as i32,
                la_d: sect3.value(19)? as i32,
                lo_v: sect3.value(20)? as i32,
                d_x: sect3.value(21)? as i32,
                d_y: sect3.value(22)? as i32,
                projection_centre: sect3.value(23)? as u8,
                scanning_mode: sect3.value(24)? as u8,
            }),
            _ => Grid::Unknown,
        };

        Ok(Self {
            source: sect3.value(2)? as u8,
            num_points: sect3.value(NUM_POINTS)? as usize,
            optional_num_list_size: sect3.value(4)? as usize,
            optional_num_list_interpretation: sect3.value(5)? as u8,
            template_number,
            grid,
        })
    }

    /// Points along a row and number of rows.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        match &self.grid {
            Grid::LatLon(grid) => Some((grid.n_i as usize, grid.n_j as usize)),
            Grid::PolarStereographic(grid) => Some((grid.n_x as usize, grid.n_y as usize)),
            Grid::Unknown => None,
        }
    }
}

///Grid Definition Template 3.0: Latitude/longitude (or equidistant cylindrical, or Plate Carree)
///
/// Angles are in micro-degrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid0 {
    pub n_i: u32,
    pub n_j: u32,
    pub la1: i32,
    pub lo1: i32,
    pub resolution_and_component_flags: u8,
    pub la2: i32,
    pub lo2: i32,
    pub d_i: i32,
    pub d_j: i32,
    pub scanning_mode: u8,
}

///Grid Definition Template 3.20: Polar stereographic projection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid20 {
    pub n_x: u32,
    pub n_y: u32,
    pub la1: i32,
    pub lo1: i32,
    pub la_d: i32,
    pub lo_v: i32,
    /// Grid lengths in millimetres
    pub d_x: i32,
    pub d_y: i32,
    pub projection_centre: u8,
    pub scanning_mode: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib::descriptor::{encode, FormatDescriptor};
    use crate::grib::sections::Section;

    #[test]
    fn lat_lon_grid() {
        let mut values = vec![72.0, 3.0, 0.0, 6.0, 0.0, 0.0, 0.0];
        values.extend_from_slice(&[6.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        values.extend_from_slice(&[3.0, 2.0, 0.0, 0.0, 47_600_000.0, 120_000_000.0, 48.0]);
        values.extend_from_slice(&[47_500_000.0, 120_125_000.0, 62_500.0, 50_000.0, 0.0]);

        let mut bytes = encode(&values[..7], FormatDescriptor("4uu4uuS")).unwrap();
        bytes.extend(encode(&values[7..], FormatDescriptor("uu4u4u4444444u4444u")).unwrap());

        let sect3 = Section { number: 3, length: 72, bytes }.decode().unwrap();
        let grid_definition = GridDefinition::from_section(&sect3).unwrap();

        assert_eq!(grid_definition.num_points, 6);
        assert_eq!(grid_definition.dimensions(), Some((3, 2)));
        match grid_definition.grid {
            Grid::LatLon(grid) => {
                assert_eq!(grid.la1, 47_600_000);
                assert_eq!(grid.lo2, 120_125_000);
                assert_eq!(grid.d_j, 50_000);
            }
            other => panic!("unexpected grid {:?}", other),
        }
    }

    #[test]
    fn unknown_grid() {
        let bytes = encode(&[14.0, 3.0, 0.0, 10.0, 0.0, 0.0, 40.0], FormatDescriptor("4uu4uuS")).unwrap();
        let sect3 = Section { number: 3, length: 14, bytes }.decode().unwrap();
        let grid_definition = GridDefinition::from_section(&sect3).unwrap();

        assert_eq!(grid_definition.template_number, 40);
        assert_eq!(grid_definition.grid, Grid::Unknown);
        assert_eq!(grid_definition.dimensions(), None);
    }
}
