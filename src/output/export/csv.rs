//! CSV export of heating curves and fits
//!
//! Files open with an optional `#`-commented metadata header, followed by one
//! header row and the data rows:
//!
//! ```csv
//! # Laser Flash Analysis
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Sample: graphite
//! # Scheme: implicit
//! # a = 1.00000e0 ± 3.10e-3 mm²/s
//! # R²: 0.999871
//! #
//! Time (s),Signal (K),Model (K),Residual (K)
//! 0.005000,0.001211,0.001198,0.000013
//! ...
//! ```
//!
//! The European variant swaps the delimiter for `;` and the decimal point for `,`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::output::export::Exporter;
use crate::physics::{HeatingCurve, NumericProperty};
use crate::tasks::FitResult;

/// Errors raised while exporting
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("nothing to export")]
    Empty,

    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("non-finite value in column '{column}' at row {row}")]
    NonFinite { column: String, row: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration
// =============================================================================

/// Formatting of the exported table
#[derive(Debug, Clone, PartialEq)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Number of decimal places (default: 6)
    pub precision: usize,

    /// Header comments, written when present
    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            metadata: None,
        }
    }
}

impl CsvConfig {
    /// Semicolon-delimited with a decimal comma
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    fn format_number(&self, value: f64) -> String {
        let formatted = format!("{:.prec$}", value, prec = self.precision);
        if self.decimal_separator != '.' {
            formatted.replace('.', &self.decimal_separator.to_string())
        } else {
            formatted
        }
    }
}

/// Header comments of an exported file
///
/// Only the fields that are set are written. The generation timestamp is
/// always added.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvMetadata {
    pub sample: Option<String>,
    pub scheme: Option<String>,
    /// Fitted and derived properties, one line each
    pub parameters: Vec<NumericProperty>,
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Parameters and goodness-of-fit of a finished fit
    pub fn from_fit(result: &FitResult) -> Self {
        let mut metadata = Self {
            parameters: result.parameters.iter().chain(&result.derived).copied().collect(),
            ..Default::default()
        };
        metadata.add_custom("SOS", format!("{:.6e}", result.sum_of_squares));
        metadata.add_custom("R²", format!("{:.6}", result.r_squared));
        metadata.add_custom("AIC", format!("{:.4}", result.aic));
        metadata.add_custom("Iterations", result.iterations.to_string());
        for details in &result.details {
            metadata.add_custom("Details", details.to_string());
        }
        metadata
    }

    pub fn with_sample(mut self, sample: impl Into<String>) -> Self {
        self.sample = Some(sample.into());
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn add_custom(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.push((key.into(), value.into()));
    }

    fn write_header(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "# Laser Flash Analysis")?;
        writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;
        if let Some(sample) = &self.sample {
            writeln!(out, "# Sample: {}", sample)?;
        }
        if let Some(scheme) = &self.scheme {
            writeln!(out, "# Scheme: {}", scheme)?;
        }
        for property in &self.parameters {
            writeln!(out, "# {}", property)?;
        }
        for (key, value) in &self.custom {
            writeln!(out, "# {}: {}", key, value)?;
        }
        writeln!(out, "#")
    }
}

// =============================================================================
// Table writer
// =============================================================================

/// Write named columns of equal length as a CSV table
pub fn write_table(
    out: &mut impl Write,
    columns: &[(&str, &[f64])],
    config: &CsvConfig,
) -> Result<(), CsvError> {
    // ===== Validation =====

    let Some((_, first)) = columns.first() else {
        return Err(CsvError::Empty);
    };
    let rows = first.len();
    if rows == 0 {
        return Err(CsvError::Empty);
    }
    for (name, values) in columns {
        if values.len() != rows {
            return Err(CsvError::LengthMismatch {
                column: name.to_string(),
                expected: rows,
                found: values.len(),
            });
        }
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(CsvError::NonFinite { column: name.to_string(), row });
        }
    }

    // ===== Header =====

    if let Some(metadata) = &config.metadata {
        metadata.write_header(out)?;
    }
    let delimiter = config.delimiter.to_string();
    let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    writeln!(out, "{}", header.join(&delimiter))?;

    // ===== Data =====

    for row in 0..rows {
        let line: Vec<String> = columns
            .iter()
            .map(|(_, values)| config.format_number(values[row]))
            .collect();
        writeln!(out, "{}", line.join(&delimiter))?;
    }
    Ok(())
}

// =============================================================================
// Exporter
// =============================================================================

/// [`Exporter`] writing CSV files
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvExporter {
    config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    fn write_file(&self, path: &Path, columns: &[(&str, &[f64])]) -> Result<(), CsvError> {
        let mut out = BufWriter::new(File::create(path)?);
        write_table(&mut out, columns, &self.config)?;
        out.flush()?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    type Error = CsvError;

    fn export_curve(&self, curve: &HeatingCurve, path: &Path) -> Result<(), CsvError> {
        self.write_file(
            path,
            &[("Time (s)", curve.times()), ("Temperature (K)", curve.temperatures())],
        )
    }

    fn export_fit(&self, result: &FitResult, path: &Path) -> Result<(), CsvError> {
        let model = result.model();
        self.write_file(
            path,
            &[
                ("Time (s)", &result.time),
                ("Signal (K)", &result.signal),
                ("Model (K)", &model),
                ("Residual (K)", &result.residuals),
            ],
        )
    }
}
