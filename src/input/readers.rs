//! Readers for experimental curves and metafiles
//!
//! Two ASCII formats are understood:
//!
//! - **Curve files**: two numeric columns (time, signal) separated by whitespace,
//!   commas, semicolons or tabs. Lines starting with `#` and non-numeric header
//!   lines are skipped.
//! - **Metafiles** (`.met`): global `key value` pairs followed by a table with an
//!   `ID` header row and one row per laser shot:
//!
//! ```text
//! Thickness       2.034
//! Diameter        9.88
//!
//! ID  Test_Temperature  Pulse_Width  Spot_Diameter  Absorbed_Energy  PulseShape
//! 200 200               5            2              31.81            TRAPEZOIDAL
//! 201 196               5            2              31.81            TRAPEZOIDAL
//! ```
//!
//! Lengths are given in millimetres, times in milliseconds and temperatures in
//! degrees Celsius; they are converted to SI units on reading.

use std::fs;
use std::path::Path;

use log::debug;

use crate::input::data::ExperimentalData;
use crate::input::metadata::Metadata;
use crate::input::DataError;
use crate::physics::{NumericProperty, NumericPropertyKeyword, TemporalShape};

const CELSIUS_TO_KELVIN: f64 = 273.0;

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|s| !s.is_empty())
}

/// Parse a two-column curve; `time_scale` converts the time column to seconds
///
/// Rows are sorted by time and rows repeating an earlier time are dropped.
pub fn parse_curve(text: &str, time_scale: f64) -> Result<ExperimentalData, DataError> {
    let mut rows: Vec<(f64, f64)> = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = split_fields(line);
        let (Some(a), Some(b)) = (fields.next(), fields.next()) else {
            return Err(DataError::Parse {
                line: number + 1,
                message: "expected two columns".to_string(),
            });
        };
        match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(t), Ok(s)) => rows.push((t * time_scale, s)),
            // Column titles
            _ if rows.is_empty() => continue,
            _ => {
                return Err(DataError::Parse {
                    line: number + 1,
                    message: format!("cannot parse '{}'", line),
                });
            }
        }
    }

    rows.sort_by(|x, y| x.0.total_cmp(&y.0));
    rows.dedup_by(|next, prev| next.0 == prev.0);

    let (time, signal) = rows.into_iter().unzip();
    ExperimentalData::new(time, signal)
}

/// Read a curve file from disk
pub fn read_curve(path: impl AsRef<Path>, time_scale: f64) -> Result<ExperimentalData, DataError> {
    let text = fs::read_to_string(path)?;
    parse_curve(&text, time_scale)
}

/// Factor converting a metafile value to SI units
fn to_si(keyword: NumericPropertyKeyword, value: f64) -> f64 {
    match keyword {
        NumericPropertyKeyword::TestTemperature => value + CELSIUS_TO_KELVIN,
        NumericPropertyKeyword::Thickness
        | NumericPropertyKeyword::Diameter
        | NumericPropertyKeyword::SpotDiameter
        | NumericPropertyKeyword::FovOuter
        | NumericPropertyKeyword::PulseWidth => value * 1e-3,
        _ => value,
    }
}

fn translate(metadata: &mut Metadata, key: &str, value: &str, line: usize) -> Result<(), DataError> {
    if key.eq_ignore_ascii_case("Sample") {
        metadata.set_sample_name(value);
        return Ok(());
    }
    if key.eq_ignore_ascii_case("PulseShape") {
        let shape = TemporalShape::parse(value).ok_or_else(|| DataError::Parse {
            line,
            message: format!("unknown pulse shape '{}'", value),
        })?;
        metadata.set_pulse_shape(shape);
        return Ok(());
    }

    let Ok(keyword) = NumericPropertyKeyword::parse(key) else {
        debug!("metafile: ignoring unknown entry '{}'", key);
        return Ok(());
    };
    if !Metadata::keywords().contains(&keyword) {
        debug!("metafile: ignoring entry '{}'", key);
        return Ok(());
    }

    let raw: f64 = value.parse().map_err(|_| DataError::Parse {
        line,
        message: format!("'{}' is not a number", value),
    })?;
    let property = NumericProperty::new(keyword, to_si(keyword, raw))?;
    metadata.set(keyword, property)?;
    Ok(())
}

/// Parse a metafile, keeping the global entries and the row of shot `id`
pub fn parse_metadata(text: &str, id: u32) -> Result<Metadata, DataError> {
    let mut metadata = Metadata::new(id);
    let mut header: Vec<String> = Vec::new();
    let mut found = false;

    for (number, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            [key, value] => translate(&mut metadata, key, value, number + 1)?,
            [first, ..] if first.eq_ignore_ascii_case("ID") => {
                header = tokens.iter().map(|s| s.to_string()).collect();
            }
            [first, rest @ ..] => {
                let Ok(row_id) = first.parse::<u32>() else {
                    continue;
                };
                if row_id != id {
                    continue;
                }
                for (key, value) in header.iter().skip(1).zip(rest) {
                    translate(&mut metadata, key, value, number + 1)?;
                }
                found = true;
                break;
            }
        }
    }

    if !found && !header.is_empty() {
        return Err(DataError::MissingShot(id));
    }
    Ok(metadata)
}

/// Read a metafile from disk
pub fn read_metadata(path: impl AsRef<Path>, id: u32) -> Result<Metadata, DataError> {
    let text = fs::read_to_string(path)?;
    parse_metadata(&text, id)
}
