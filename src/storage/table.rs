//! Delimited table I/O

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::path::Path;

use crate::core::RawTable;

pub const CATALOG_DELIMITER: u8 = b'|';

/// Cell contents read as missing values
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null"];

/// Read a pipe-delimited catalog with a header row
pub fn read_catalog(path: &Path) -> Result<RawTable> {
	let file = std::fs::File::open(path)
		.with_context(|| format!("Failed to open catalog {}", path.display()))?;
	read_table(file, CATALOG_DELIMITER)
		.with_context(|| format!("Failed to parse catalog {}", path.display()))
}

pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<RawTable> {
	let mut reader = csv::ReaderBuilder::new()
		.delimiter(delimiter)
		.flexible(true)
		.trim(csv::Trim::Headers)
		.from_reader(reader);

	let headers = reader
		.headers()
		.context("Missing header row")?
		.iter()
		.map(str::to_string)
		.collect();
	let mut table = RawTable::new(headers);

	for (line, record) in reader.records().enumerate() {
		let record = record.with_context(|| format!("Malformed row {}", line + 2))?;
		let row = record
			.iter()
			.map(|cell| (!NULL_MARKERS.contains(&cell)).then(|| cell.to_string()))
			.collect();
		table.push_row(row);
	}

	Ok(table)
}

pub fn write_table<W: Write>(writer: W, table: &RawTable, delimiter: u8) -> Result<()> {
	let mut writer = csv::WriterBuilder::new()
		.delimiter(delimiter)
		.from_writer(writer);

	writer.write_record(&table.headers)?;
	for row in &table.rows {
		writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
	}
	writer.flush()?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_pipe_delimited_rows_with_missing_cells() {
		let data = "STOCKCODE| PRODUCT_NAME |PRICE\n1|Gin 700mL||\n2|\"Rum | Spiced\"|NaN\n3\n";
		let table = read_table(data.as_bytes(), b'|').unwrap();

		assert_eq!(table.headers, vec!["STOCKCODE", "PRODUCT_NAME", "PRICE"]);
		assert_eq!(table.len(), 3);
		assert_eq!(table.rows[0][1].as_deref(), Some("Gin 700mL"));
		assert_eq!(table.rows[0][2], None);
		assert_eq!(table.rows[1][1].as_deref(), Some("Rum | Spiced"));
		assert_eq!(table.rows[1][2], None);
		assert_eq!(table.rows[2], vec![Some("3".to_string()), None, None]);
	}

	#[test]
	fn written_table_reads_back() {
		let mut table = RawTable::new(vec!["A".into(), "B".into()]);
		table.push_row(vec![Some("x".into()), None]);

		let mut buf = Vec::new();
		write_table(&mut buf, &table, b'|').unwrap();
		assert_eq!(String::from_utf8(buf.clone()).unwrap(), "A|B\nx|\n");
		assert_eq!(read_table(buf.as_slice(), b'|').unwrap(), table);
	}
}
