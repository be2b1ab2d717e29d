//! Record export: JSON and CSV.

use std::io::Write;
use std::path::Path;

use pumpcat_core::ProductRecord;
use thiserror::Error;

/// Columns of the CSV export, in order.
const CSV_HEADER: &str = "name,category,price,description,country,status";

/// Price column placeholder; the source site never exposes reliable prices.
const PRICE_PLACEHOLDER: &str = "Price on request";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the full record collection as a human-indented JSON array.
///
/// # Errors
///
/// Returns [`ExportError`] on serialization or file I/O failure.
pub fn write_json(path: &Path, records: &[ProductRecord]) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), count = records.len(), "wrote JSON export");
    Ok(())
}

/// Writes the fixed-column CSV view of the record collection.
///
/// # Errors
///
/// Returns [`ExportError::Io`] on file I/O failure.
pub fn write_csv(path: &Path, records: &[ProductRecord]) -> Result<(), ExportError> {
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(out, "{CSV_HEADER}")?;
    for record in records {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_field(&record.name),
            csv_field(&record.category),
            csv_field(PRICE_PLACEHOLDER),
            csv_field(&record.short_description),
            csv_field(&record.country),
            csv_field("draft"),
        )?;
    }
    out.flush()?;
    tracing::info!(path = %path.display(), count = records.len(), "wrote CSV export");
    Ok(())
}

/// Quotes a CSV field when it contains a comma, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(csv_field("Stratos MAXO"), "Stratos MAXO");
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        assert_eq!(csv_field("a, b"), "\"a, b\"");
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(csv_field("64\" tile"), "\"64\"\" tile\"");
    }

    #[test]
    fn newlines_force_quoting() {
        assert_eq!(csv_field("line1\nline2"), "\"line1\nline2\"");
    }
}
