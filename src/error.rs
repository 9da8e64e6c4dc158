use crate::grib;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    #[error("GribError: {0}")]
    GribError(#[from] grib::GribError),

    #[error("ConfyError: {0}")]
    ConfyError(#[from] confy::ConfyError),

    #[error("CsvError: {0}")]
    CsvError(#[from] csv::Error),

    #[error("ConfigError: {0}")]
    ConfigError(String),

    #[error("OutputError: {0}")]
    OutputError(String),
}
