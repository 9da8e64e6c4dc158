//! CSV rendering of decoded fields.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::grib::{DecodedField, GribDecoder};
use crate::grib::sections::sect1::Identification;
use crate::grib::sections::sect3::{Grid, GridDefinition};
use crate::grib::sections::sect4::{Product, ProductDefinition};
use crate::grib::sections::sect5::DataRepresentationDefinition;

/// Most points that can be picked out of a grid in one run.
pub const MAX_POINTS: usize = 10;

/// Part of the grid written out. Coordinates are 1-based (column, row) indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cut {
    All,
    /// Inclusive window from `(x1, y1)` to `(x2, y2)`
    Window { x1: usize, y1: usize, x2: usize, y2: usize },
    Points(Vec<(usize, usize)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub fill_value: f64,
    pub cut: Cut,
}

/// Fields selected for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One parameter, see Code Tables 4.1 and 4.2
    Parameter { category: u8, number: u8 },
    /// Sea surface deviation or astronomical tide at the ground or water
    /// surface, from the storm surge or astronomical tide models
    Tide,
}

const SURFACE_GROUND_OR_WATER: u8 = 1;
const CATEGORY_MASS: u8 = 3;
const TIDE_PARAMETERS: [u8; 2] = [1, 200];
const TIDE_PROCESSES: [u8; 2] = [225, 226];

/// What to extract from a GRIB2 file and where to write it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub out_dir: PathBuf,
    pub out_name: String,
    pub target: Target,
    pub options: OutputOptions,
}

/// Decodes the message read from `reader` and writes every field holding the
/// requested parameter to its own CSV file. Returns the paths written.
pub fn extract<R: Read>(reader: R, extraction: &Extraction) -> Result<Vec<PathBuf>> {
    if !extraction.out_dir.exists() {
        fs::create_dir_all(&extraction.out_dir)?;
        info!("{:?} created successfully", extraction.out_dir);
    }

    let mut decoder = GribDecoder::new(reader);
    let mut written = Vec::new();

    while let Some(field) = decoder.next_field()? {
        if !is_target(&field, &extraction.target) {
            debug!("Skip field (product template {:?})", field.product_definition.template_number);
            continue;
        }

        let product_definition = ProductDefinition::from_section(&field.product_definition)?;
        let product = product_definition.product
            .ok_or_else(|| Error::OutputError(format!("Unsupported product template 4.{}", product_definition.template_number)))?;

        info!("template no 4.{}, forecast time {}, period {}", product_definition.template_number,
            product.forecast_time_value, product.statistical_period.unwrap_or(0));

        let path = extraction.out_dir.join(file_name(&extraction.out_name, &product));
        let file = BufWriter::new(File::create(&path)?);
        write_csv(&field, &extraction.options, file)?;

        info!("output '{}'", path.display());
        written.push(path);
    }

    if !decoder.warnings().is_empty() {
        warn!("{} section(s) could not be fully decoded", decoder.warnings().len());
    }

    Ok(written)
}

/// Whether `field` is selected by `target`.
///
/// Probability products (template 4.9) are never selected for a parameter.
pub fn is_target(field: &DecodedField, target: &Target) -> bool {
    let product_definition = match ProductDefinition::from_section(&field.product_definition) {
        Ok(product_definition) => product_definition,
        Err(_) => return false,
    };

    match (target, &product_definition) {
        (Target::Parameter { .. }, ProductDefinition { template_number: 9, .. }) => false,
        (Target::Parameter { category, number }, ProductDefinition { product: Some(product), .. }) => {
            product.parameter_category == *category && product.parameter_number == *number
        }
        (Target::Tide, ProductDefinition { product: Some(product), .. }) => {
            product.first_surface.surface_type == SURFACE_GROUND_OR_WATER
                && product.parameter_category == CATEGORY_MASS
                && TIDE_PARAMETERS.contains(&product.parameter_number)
                && TIDE_PROCESSES.contains(&product.background_process)
        }
        _ => false,
    }
}

/// Name of the CSV file of a field: `<name>_M<type><member>_<hours>.csv` for
/// ensemble members, `<name>_LEN<period>_<hours>.csv` otherwise.
pub fn file_name(out_name: &str, product: &Product) -> String {
    let hours = product.forecast_end();

    match &product.ensemble {
        Some(ensemble) => {
            format!("{}_M{}{:02}_{:03}.csv", out_name, ensemble.kind, ensemble.perturbation, hours)
        }
        _ => format!("{}_LEN{:02}_{:02}.csv", out_name, product.statistical_period.unwrap_or(0), hours),
    }
}

/// Inclusive 0-based bounds of the written rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start_x: usize,
    start_y: usize,
    end_x: usize,
    end_y: usize,
}

impl Window {
    fn new(cut: &Cut, nx: usize, ny: usize) -> Result<Self> {
        let full = Window { start_x: 0, start_y: 0, end_x: nx.saturating_sub(1), end_y: ny.saturating_sub(1) };

        let window = match cut {
            Cut::Window { x1, y1, x2, y2 } => Window {
                start_x: if *x1 > 0 { x1 - 1 } else { full.start_x },
                start_y: if *y1 > 0 { y1 - 1 } else { full.start_y },
                end_x: if *x2 > 0 && *x2 <= nx { x2 - 1 } else { full.end_x },
                end_y: if *y2 > 0 && *y2 <= ny { y2 - 1 } else { full.end_y },
            },
            _ => full,
        };

        if window.start_x > window.end_x || window.start_y > window.end_y {
            return Err(Error::OutputError(format!("Empty cut-out window {:?} for a {}x{} grid", cut, nx, ny)));
        }

        Ok(window)
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        (self.start_x..=self.end_x).contains(&x) && (self.start_y..=self.end_y).contains(&y)
    }
}

fn write_field<W: Write>(csv: &mut csv::Writer<W>, name: &str, value: impl Display) -> Result<()> {
    csv.write_record([name, value.to_string().as_str()])?;
    Ok(())
}

/// Writes `field` as CSV: a header of the describing fields, then either the
/// grid rows within the cut-out or a single line of picked points.
pub fn write_csv<W: Write>(field: &DecodedField, options: &OutputOptions, writer: W) -> Result<()> {
    let grid_definition = GridDefinition::from_section(&field.grid_definition)?;
    let product_definition = ProductDefinition::from_section(&field.product_definition)?;
    let data_representation = DataRepresentationDefinition::from_section(&field.data_representation)?;

    let product = product_definition.product.as_ref()
        .ok_or_else(|| Error::OutputError(format!("Unsupported product template 4.{}", product_definition.template_number)))?;
    let packing = data_representation.packing.as_ref()
        .ok_or_else(|| Error::OutputError(format!("Unsupported data template 5.{}", data_representation.template_number)))?;
    let (nx, ny) = grid_definition.dimensions()
        .ok_or_else(|| Error::OutputError(format!("Unsupported grid template 3.{}", grid_definition.template_number)))?;

    let window = Window::new(&options.cut, nx, ny)?;
    let values = field.expand(options.fill_value);

    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    let ref_time = match &field.identification {
        Some(sect1) => Identification::from_section(sect1)?.ref_time.format("%Y/%m/%d %H:%M:%S").to_string(),
        None => String::new(),
    };
    write_field(&mut csv, "reference time", ref_time)?;

    match &grid_definition.grid {
        Grid::LatLon(grid) => {
            let (start_x, start_y) = (window.start_x as i64, window.start_y as i64);
            let (end_x, end_y) = (window.end_x as i64, window.end_y as i64);
            let (d_i, d_j) = (grid.d_i as i64, grid.d_j as i64);

            let la2 = grid.la2 as i64 + d_j * ((ny as i64 - 1) - end_y);
            let lo2 = grid.lo1 as i64 + d_i * end_x;
            let la1 = grid.la1 as i64 - d_j * start_y;
            let lo1 = grid.lo1 as i64 + d_i * start_x;

            write_field(&mut csv, "first grid point latitude", la1)?;
            write_field(&mut csv, "first grid point longitude", lo1)?;
            write_field(&mut csv, "last grid point latitude", la2)?;
            write_field(&mut csv, "last grid point longitude", lo2)?;
            write_field(&mut csv, "i direction increment", grid.d_i)?;
            write_field(&mut csv, "j direction increment", grid.d_j)?;
        }
        Grid::PolarStereographic(grid) => {
            write_field(&mut csv, "first grid point latitude", grid.la1)?;
            write_field(&mut csv, "first grid point longitude", grid.lo1)?;
            write_field(&mut csv, "x direction grid length", grid.d_x)?;
            write_field(&mut csv, "y direction grid length", grid.d_y)?;
        }
        Grid::Unknown => {}
    }

    write_field(&mut csv, "parameter category", product.parameter_category)?;
    write_field(&mut csv, "parameter number", product.parameter_number)?;
    write_field(&mut csv, "first fixed surface type", product.first_surface.surface_type)?;
    write_field(&mut csv, "first fixed surface scale factor", product.first_surface.scale_factor)?;
    write_field(&mut csv, "first fixed surface scaled value", product.first_surface.scaled_value)?;
    write_field(&mut csv, "number of data points", data_representation.num_points)?;
    write_field(&mut csv, "reference value (R)", format!("{:.6}", packing.reference_value))?;
    write_field(&mut csv, "binary scale factor (E)", packing.binary_scale_factor)?;
    write_field(&mut csv, "decimal scale factor (D)", packing.decimal_scale_factor)?;

    let mut fill_record = vec![String::from("fill value"), format!("{:.2}", options.fill_value)];
    match &options.cut {
        Cut::Points(points) => {
            fill_record.extend(points.iter().map(|(x, y)| format!("{}:{}", x, y)));
        }
        _ => {
            fill_record.extend([window.start_x + 1, window.start_y + 1, window.end_x + 1, window.end_y + 1].iter().map(|v| v.to_string()));
        }
    }
    csv.write_record(&fill_record)?;

    let value_at = |x: usize, y: usize| -> f64 {
        values.get(y * nx + x).copied().unwrap_or(options.fill_value)
    };

    match &options.cut {
        Cut::Points(points) => {
            let record: Vec<String> = points.iter()
                .map(|(x, y)| match (x.checked_sub(1), y.checked_sub(1)) {
                    (Some(x), Some(y)) if x < nx && y < ny => value_at(x, y),
                    _ => options.fill_value,
                })
                .map(|v| format!("{:.2}", v))
                .collect();
            csv.write_record(&record)?;
        }
        _ => {
            for y in 0..ny {
                let record: Vec<String> = (0..nx)
                    .filter(|x| window.contains(*x, y))
                    .map(|x| format!("{:.2}", value_at(x, y)))
                    .collect();
                if !record.is_empty() {
                    csv.write_record(&record)?;
                }
            }
        }
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grib::descriptor::FieldValue;
    use crate::grib::sections::DecodedSection;

    fn section(number: u8, template_number: Option<u16>, values: &[f64]) -> DecodedSection {
        DecodedSection {
            number,
            template_number,
            extended: template_number.is_some(),
            values: values.iter().map(|v| FieldValue { value: *v, missing: false }).collect(),
        }
    }

    fn field(category: f64, template: u16, bitmap: Option<Vec<u8>>) -> DecodedField {
        let mut sect3 = vec![72.0, 3.0, 0.0, 6.0, 0.0, 0.0, 0.0, 6.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        sect3.extend_from_slice(&[3.0, 2.0, 0.0, 0.0, 40_000_000.0, 130_000_000.0, 48.0]);
        sect3.extend_from_slice(&[39_000_000.0, 132_000_000.0, 1_000_000.0, 1_000_000.0, 0.0]);

        let mut sect4 = vec![34.0, 4.0, 0.0, template as f64];
        sect4.extend_from_slice(&[category, 8.0, 2.0, 0.0, 31.0, 0.0, 0.0, 1.0, 3.0, 1.0, 0.0, 0.0, 255.0, 0.0, 0.0]);
        if template == 8 {
            sect4.extend_from_slice(&[2020.0, 4.0, 23.0, 3.0, 0.0, 0.0, 1.0, 0.0, 1.0, 2.0, 1.0, 3.0, 1.0, 0.0]);
        }

        let sect5 = [21.0, 5.0, 6.0, 0.0, 0.0, 0.0, 1.0, 8.0, 0.0];

        DecodedField {
            identification: Some(section(1, None, &[21.0, 1.0, 34.0, 0.0, 2.0, 1.0, 1.0, 2020.0, 4.0, 23.0, 0.0, 0.0, 0.0, 0.0, 1.0])),
            grid_definition: section(3, Some(0), &sect3),
            product_definition: section(4, Some(template), &sect4),
            data_representation: section(5, Some(0), &sect5),
            values: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            bitmap,
        }
    }

    fn render(field: &DecodedField, cut: Cut) -> Vec<String> {
        let mut out = Vec::new();
        write_csv(field, &OutputOptions { fill_value: -2.0, cut }, &mut out).unwrap();
        String::from_utf8(out).unwrap().lines().map(String::from).collect()
    }

    #[test]
    fn whole_grid() {
        let lines = render(&field(1.0, 8, None), Cut::All);

        assert_eq!(lines[0], "reference time,2020/04/23 00:00:00");
        assert_eq!(lines[1], "first grid point latitude,40000000");
        assert_eq!(lines[3], "last grid point latitude,39000000");
        assert_eq!(lines[4], "last grid point longitude,132000000");
        assert_eq!(lines.iter().rev().nth(2).unwrap(), "fill value,-2.00,1,1,3,2");
        assert_eq!(lines[lines.len() - 2], "0.10,0.20,0.30");
        assert_eq!(lines[lines.len() - 1], "0.40,0.50,0.60");
    }

    #[test]
    fn window_with_bitmap() {
        let mut field = field(1.0, 8, Some(vec![1, 0, 1, 1, 1, 0]));
        field.values.truncate(4);
        let lines = render(&field, Cut::Window { x1: 2, y1: 1, x2: 3, y2: 2 });

        assert_eq!(lines[1], "first grid point latitude,40000000");
        assert_eq!(lines[2], "first grid point longitude,131000000");
        assert_eq!(lines[lines.len() - 3], "fill value,-2.00,2,1,3,2");
        assert_eq!(lines[lines.len() - 2], "-2.00,0.20");
        assert_eq!(lines[lines.len() - 1], "0.40,-2.00");
    }

    #[test]
    fn picked_points() {
        let lines = render(&field(1.0, 8, None), Cut::Points(vec![(1, 1), (3, 2), (9, 9)]));

        assert_eq!(lines[lines.len() - 2], "fill value,-2.00,1:1,3:2,9:9");
        assert_eq!(lines[lines.len() - 1], "0.10,0.60,-2.00");
    }

    #[test]
    fn empty_window() {
        let mut out = Vec::new();
        let options = OutputOptions { fill_value: -2.0, cut: Cut::Window { x1: 3, y1: 1, x2: 2, y2: 2 } };

        assert!(matches!(write_csv(&field(1.0, 8, None), &options, &mut out), Err(Error::OutputError(_))));
    }

    #[test]
    fn targets() {
        let precipitation = Target::Parameter { category: 1, number: 8 };

        assert!(is_target(&field(1.0, 8, None), &precipitation));
        assert!(!is_target(&field(2.0, 8, None), &precipitation));
        assert!(is_target(&field(1.0, 0, None), &precipitation));
        assert!(!is_target(&field(1.0, 0, None), &Target::Tide));
    }

    fn tide_field(number: f64, process: f64, surface: f64) -> DecodedField {
        let mut field = field(3.0, 0, None);
        field.product_definition.values[5].value = number;
        field.product_definition.values[7].value = process;
        field.product_definition.values[13].value = surface;
        field
    }

    #[test]
    fn tide_targets() {
        assert!(is_target(&tide_field(1.0, 225.0, 1.0), &Target::Tide));
        assert!(is_target(&tide_field(200.0, 226.0, 1.0), &Target::Tide));
        assert!(!is_target(&tide_field(1.0, 31.0, 1.0), &Target::Tide));
        assert!(!is_target(&tide_field(1.0, 225.0, 101.0), &Target::Tide));
        assert!(!is_target(&tide_field(5.0, 225.0, 1.0), &Target::Tide));
        assert!(!is_target(&tide_field(1.0, 225.0, 1.0), &Target::Parameter { category: 1, number: 8 }));
    }

    #[test]
    fn names() {
        let product = ProductDefinition::from_section(&field(1.0, 8, None).product_definition).unwrap().product.unwrap();

        assert_eq!(file_name("out", &product), "out_LEN03_06.csv");
    }
}
