//! CSV input and output for survey tables.

use std::io::{Read, Write};
use std::path::Path;

use nyc_traffic_survey_models::{AugmentedTable, SurveyTable};

/// Errors from reading or writing survey CSV files.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// CSV parsing or serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file open/flush).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads a survey CSV file with a header row.
///
/// # Errors
///
/// Returns [`TableError`] if the file cannot be opened or parsed.
pub fn read_survey(path: &Path) -> Result<SurveyTable, TableError> {
    let file = std::fs::File::open(path)?;
    read_survey_from(file)
}

fn read_survey_from<R: Read>(reader: R) -> Result<SurveyTable, TableError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let columns = reader.headers()?.iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(String::from).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()?;

    Ok(SurveyTable { columns, rows })
}

/// Writes the augmented table with its upper-cased header.
///
/// # Errors
///
/// Returns [`TableError`] if the file cannot be created or written.
pub fn write_augmented(path: &Path, table: &AugmentedTable) -> Result<(), TableError> {
    let file = std::fs::File::create(path)?;
    write_augmented_to(file, table)
}

fn write_augmented_to<W: Write>(writer: W, table: &AugmentedTable) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.header())?;
    for row in &table.rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}
