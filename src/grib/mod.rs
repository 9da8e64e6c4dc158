pub mod descriptor;
pub mod sections;
pub mod templates;
pub mod utils;

use std::io::{ErrorKind, Read};
use crate::grib::sections::{DecodedSection, Section};
use crate::grib::sections::{sect3, sect5};
use crate::grib::sections::sect6::{unpack_bitmap, BitMapIndicator};
use crate::grib::sections::sect7::unpack_grid;

const SECT0_IS_MAGIC: &[u8] = b"GRIB";
const SECT0_IS_MAGIC_SIZE: usize = SECT0_IS_MAGIC.len();
const SECT0_IS_SIZE: usize = 16;
const SECT0_EDITION: u8 = 2;
const SECT_HEADER_SIZE: usize = 5;
const SECT_LENGTH_SIZE: usize = 4;
pub(crate) const SECT8_ES_MAGIC: &[u8] = b"7777";
const NUM_SECTIONS: usize = 9;

pub type Result<T, E = GribError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum GribError {
    #[error("StdError({0})")]
    StdError(#[from] std::io::Error),

    #[error("FormatError({0})")]
    Format(String),

    #[error("MissingSection({0})")]
    MissingSection(u8),

    #[error("UnknownTemplate({section}.{template})")]
    UnknownTemplate { section: u8, template: u16 },

    #[error("UnsupportedBitmapMode({0})")]
    UnsupportedBitmapMode(u8),

    #[error("MissingField(section {section}, index {index})")]
    MissingField { section: u8, index: usize },

    #[error("InvalidDescriptor({0:?})")]
    InvalidDescriptor(char),

    #[error("FieldOverrun(offset {offset}, length {len})")]
    FieldOverrun { offset: usize, len: usize },

    #[error("ParseError({0})")]
    ParseError(String),
}

impl GribError {
    /// Errors after which the rest of the message can still be decoded.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GribError::UnknownTemplate { .. } | GribError::UnsupportedBitmapMode(_))
    }
}

/// Splits a byte stream into GRIB2 sections.
pub struct GribReader<R: Read> {
    reader: R,
}

impl<R: Read> GribReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => GribError::Format(String::from("Unexpected end of input")),
            _ => GribError::StdError(e),
        })
    }

    /// Reads the 16-octet Indicator Section.
    pub fn read_sect0(&mut self) -> Result<Section> {
        let mut buf = vec![0; SECT0_IS_SIZE];
        self.read_exact(&mut buf[..])?;

        if &buf[0..SECT0_IS_MAGIC_SIZE] != SECT0_IS_MAGIC {
            return Err(GribError::Format(String::from("Not a GRIB file")));
        }

        let edition = buf[7];
        if edition != SECT0_EDITION {
            return Err(GribError::Format(format!("GRIB edition {} is not supported", edition)));
        }

        debug!("Read section {} : {}", 0, SECT0_IS_SIZE);

        Ok(Section {
            number: 0,
            length: SECT0_IS_SIZE as u32,
            bytes: buf,
        })
    }

    /// Reads the next length-prefixed section, or the End Section.
    pub fn read_section(&mut self) -> Result<Section> {
        let mut length_field = [0; SECT_LENGTH_SIZE];
        self.read_exact(&mut length_field)?;

        if length_field[..] == SECT8_ES_MAGIC[..] {
            debug!("Read section {} : {}", 8, SECT8_ES_MAGIC.len());
            return Ok(Section::end_marker());
        }

        let mut length = length_field;
        utils::normalize(&mut length, SECT_LENGTH_SIZE);
        let length = u32::from_ne_bytes(length);

        if (length as usize) < SECT_HEADER_SIZE {
            return Err(GribError::Format(format!("Section length {} is shorter than its header", length)));
        }

        let mut bytes = vec![0; length as usize];
        bytes[..SECT_LENGTH_SIZE].copy_from_slice(&length_field);
        self.read_exact(&mut bytes[SECT_LENGTH_SIZE..])?;

        let number = bytes[SECT_LENGTH_SIZE];
        if number as usize >= NUM_SECTIONS {
            return Err(GribError::Format(format!("Unknown section number {}", number)));
        }

        debug!("Read section {} : {}(-{} : {})", number, length, SECT_HEADER_SIZE, length as usize - SECT_HEADER_SIZE);

        Ok(Section { number, length, bytes })
    }
}

/// One reconstructed field, with the sections describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub identification: Option<DecodedSection>,
    pub grid_definition: DecodedSection,
    pub product_definition: DecodedSection,
    pub data_representation: DecodedSection,
    /// One value per point carrying data
    pub values: Vec<f64>,
    /// One 0/1 flag per grid point, when a bit-map applies
    pub bitmap: Option<Vec<u8>>,
}

impl DecodedField {
    /// Lays the values out over every grid point, writing `fill` where the
    /// bit-map marks the point as absent.
    pub fn expand(&self, fill: f64) -> Vec<f64> {
        match &self.bitmap {
            None => self.values.clone(),
            Some(bitmap) => {
                let mut values = self.values.iter();
                bitmap.iter()
                    .map(|present| match present {
                        1 => values.next().copied().unwrap_or(fill),
                        _ => fill,
                    })
                    .collect()
            }
        }
    }
}

/// Decoding session over one GRIB2 message.
///
/// Decoded values are kept per section number; a section occurring again in a
/// multi-field message replaces the previous one.
pub struct GribDecoder<R: Read> {
    reader: GribReader<R>,
    sections: [Option<DecodedSection>; NUM_SECTIONS],
    /// Bit-map applying to the next Data Section
    bitmap: Option<Vec<u8>>,
    /// Last bit-map unpacked from a Bit-Map Section, reused by indicator 254
    last_bitmap: Option<Vec<u8>>,
    warnings: Vec<GribError>,
    started: bool,
    finished: bool,
}

impl<R: Read> GribDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: GribReader::new(reader),
            sections: Default::default(),
            bitmap: None,
            last_bitmap: None,
            warnings: Vec::new(),
            started: false,
            finished: false,
        }
    }

    /// Most recently decoded values of section `number`.
    pub fn section(&self, number: u8) -> Option<&DecodedSection> {
        self.sections.get(number as usize)?.as_ref()
    }

    /// Recoverable problems met so far.
    pub fn warnings(&self) -> &[GribError] {
        &self.warnings
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decodes sections up to the next Data Section and returns its field, or
    /// `None` once the End Section has been read.
    ///
    /// Any error returned is fatal and ends the session.
    pub fn next_field(&mut self) -> Result<Option<DecodedField>> {
        if self.finished {
            return Ok(None);
        }

        let result = self.advance();
        if result.is_err() {
            self.finished = true;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<DecodedField>> {
        if !self.started {
            let sect0 = self.reader.read_sect0()?;
            self.sections[0] = Some(sect0.decode()?);
            self.started = true;
        }

        loop {
            let section = self.reader.read_section()?;
            let decoded = section.decode()?;

            if let Some(warning) = decoded.unknown_template() {
                self.warn(warning);
            }

            let number = section.number;
            if number == 6 {
                self.bitmap = self.read_bitmap(&section, &decoded)?;
            }
            self.sections[number as usize] = Some(decoded);

            match number {
                7 => {
                    if let Some(field) = self.read_field(&section)? {
                        return Ok(Some(field));
                    }
                }
                8 => {
                    self.finished = true;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    fn read_bitmap(&mut self, sect6: &Section, decoded: &DecodedSection) -> Result<Option<Vec<u8>>> {
        match BitMapIndicator::from_section(decoded)? {
            BitMapIndicator::Present => {
                let sect3 = self.required(3)?;
                let bitmap = unpack_bitmap(&sect6.bytes, sect3)?;
                self.last_bitmap = Some(bitmap.clone());
                Ok(Some(bitmap))
            }
            BitMapIndicator::None => Ok(None),
            BitMapIndicator::Previous if self.last_bitmap.is_some() => Ok(self.last_bitmap.clone()),
            BitMapIndicator::Previous => {
                self.warn(GribError::UnsupportedBitmapMode(254));
                Ok(None)
            }
            BitMapIndicator::Predefined(n) => {
                self.warn(GribError::UnsupportedBitmapMode(n));
                Ok(None)
            }
        }
    }

    fn read_field(&mut self, sect7: &Section) -> Result<Option<DecodedField>> {
        let grid_definition = self.required(3)?.clone();
        let product_definition = self.required(4)?.clone();
        let data_representation = self.required(5)?.clone();

        check_num_points(&grid_definition, &data_representation)?;

        let values = match unpack_grid(&sect7.bytes, &data_representation) {
            Ok(values) => values,
            // already reported when section 5 was decoded
            Err(e) if e.is_recoverable() && data_representation.unknown_template().is_some() => {
                debug!("Skipping data section : {}", e);
                return Ok(None);
            }
            Err(e) if e.is_recoverable() => {
                self.warn(e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        Ok(Some(DecodedField {
            identification: self.sections[1].clone(),
            grid_definition,
            product_definition,
            data_representation,
            values,
            bitmap: self.bitmap.clone(),
        }))
    }

    fn required(&self, number: u8) -> Result<&DecodedSection> {
        self.section(number).ok_or(GribError::MissingSection(number))
    }

    fn warn(&mut self, warning: GribError) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn into_parts(self) -> ([Option<DecodedSection>; NUM_SECTIONS], Vec<GribError>) {
        (self.sections, self.warnings)
    }
}

/// Data points announced by section 5 must fit in the grid of section 3.
fn check_num_points(sect3: &DecodedSection, sect5: &DecodedSection) -> Result<()> {
    let grid_points = sect3.value(sect3::NUM_POINTS)?;
    let data_points = sect5.value(sect5::NUM_POINTS)?;

    if data_points > grid_points {
        return Err(GribError::Format(format!(
            "{} data points announced for a grid of {} points", data_points, grid_points
        )));
    }
    Ok(())
}

/// Everything decoded from one GRIB2 message.
#[derive(Debug)]
pub struct DecodedMessage {
    pub fields: Vec<DecodedField>,
    pub sections: [Option<DecodedSection>; NUM_SECTIONS],
    pub warnings: Vec<GribError>,
}

impl DecodedMessage {
    pub fn section(&self, number: u8) -> Option<&DecodedSection> {
        self.sections.get(number as usize)?.as_ref()
    }

    /// Values of the last field of the message.
    pub fn values(&self) -> Option<&[f64]> {
        self.fields.last().map(|field| &field.values[..])
    }

    /// Bit-map of the last field of the message.
    pub fn bitmap(&self) -> Option<&[u8]> {
        self.fields.last()?.bitmap.as_deref()
    }
}

/// Decodes a whole message from `reader`.
pub fn decode_message<R: Read>(reader: R) -> Result<DecodedMessage> {
    let mut decoder = GribDecoder::new(reader);

    let mut fields = Vec::new();
    while let Some(field) = decoder.next_field()? {
        fields.push(field);
    }

    let (sections, warnings) = decoder.into_parts();

    Ok(DecodedMessage {
        fields,
        sections,
        warnings,
    })
}
