//! CSV export for report rows.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Write a slice of flat report rows to a CSV file, headers included.
pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render a slice of flat report rows as a CSV string.
pub fn csv_string<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
