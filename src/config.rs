use std::path::Path;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::output::Target;

/// Total precipitation
const DEFAULT_PARAMETER: (u8, u8) = (1, 8);
/// Precipitation guidance
const GUIDANCE_PARAMETER: (u8, u8) = (1, 52);
const DEFAULT_FILL_VALUE: f64 = -2.0;
const OCEAN_FILL_VALUE: f64 = -999.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
  /// Directory receiving the CSV files
  pub out_dir: String,
  /// Prefix of the CSV file names
  pub out_name: String,
  /// Kind of product held by the files
  pub mode: Mode,
  /// Parameter category of the fields to extract (see Code Table 4.1)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<u8>,
  /// Parameter number of the fields to extract (see Code Table 4.2)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub number: Option<u8>,
  /// Value written for absent points and points outside the grid
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fill_value: Option<f64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      out_dir: String::from("."),
      out_name: String::from("grib2"),
      mode: Mode::Auto,
      category: None,
      number: None,
      fill_value: None,
    }
  }
}

/// Kind of product held by a GRIB2 file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
  /// Told by the file name
  Auto,
  /// Meteorological grid point values
  Weather,
  /// Forecast guidance, defaulting to precipitation guidance
  Guidance,
  /// Storm surge and astronomical tide
  Tide,
}

impl Mode {
  /// Mode announced by the product tag of a JMA file name, such as
  /// `Z__C_RJTD_..._SGM_...bin` for storm surge.
  pub fn detect(file_name: &str) -> Self {
    let has_tag = |tags: &[&str]| tags.iter().any(|tag| file_name.contains(tag));

    if has_tag(&["_TID_", "_SGM_"]) {
      Mode::Tide
    } else if has_tag(&["_MSM_GUID_", "_GSM_GUID_"]) {
      Mode::Guidance
    } else {
      Mode::Weather
    }
  }
}

impl FromStr for Mode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "auto" => Ok(Mode::Auto),
      "weather" => Ok(Mode::Weather),
      "guidance" => Ok(Mode::Guidance),
      "tide" => Ok(Mode::Tide),
      _ => Err(Error::ConfigError(format!("Unknown mode '{}'", s))),
    }
  }
}

impl Config {
  /// Loads the YAML config at `path`, writing the defaults there when the file does not exist.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Ok(confy::load_path(path)?),
      None => Ok(Self::default()),
    }
  }

  /// The configured mode, or the one announced by the name of `file`.
  pub fn mode_for(&self, file: &Path) -> Mode {
    match self.mode {
      Mode::Auto => {
        let name = file.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
        Mode::detect(&name)
      }
      mode => mode,
    }
  }

  /// Fields to extract in `mode`. Tide extraction ignores the configured parameter.
  pub fn target(&self, mode: Mode) -> Target {
    let (category, number) = match mode {
      Mode::Guidance => GUIDANCE_PARAMETER,
      _ => DEFAULT_PARAMETER,
    };

    match mode {
      Mode::Tide => Target::Tide,
      _ => Target::Parameter {
        category: self.category.unwrap_or(category),
        number: self.number.unwrap_or(number),
      },
    }
  }

  pub fn fill_value(&self, mode: Mode) -> f64 {
    self.fill_value.unwrap_or(match mode {
      Mode::Tide => OCEAN_FILL_VALUE,
      _ => DEFAULT_FILL_VALUE,
    })
  }
}
