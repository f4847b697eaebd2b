//! Export Module
//! Serializes tables to CSV and to a single-sheet XLSX workbook.
//!
//! The workbook is written as direct ZIP/XML, the smallest package Excel and
//! LibreOffice will open: content types, package rels, workbook, one sheet.

use crate::data::string_values;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::io::{Cursor, Write};
use thiserror::Error;
use tracing::info;
use ::zip::result::ZipError;
use ::zip::write::FileOptions;
use ::zip::ZipWriter;

/// Datetime layout used in exported files. Sub-second digits are only
/// written when present, so whole-second values stay short.
pub const DATETIME_EXPORT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Sheet name inside exported workbooks.
pub const SHEET_NAME: &str = "Sheet1";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot serialize value: {0}")]
    Serialization(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single spreadsheet cell.
enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

/// Pure table serializers; rows and columns are written as given.
pub struct Exporter;

impl Exporter {
    /// UTF-8 CSV with a header row. Missing values become empty fields.
    pub fn to_csv(df: &DataFrame) -> Result<Vec<u8>, ExportError> {
        let mut df = df.clone();
        let mut buf: Vec<u8> = Vec::new();

        CsvWriter::new(&mut buf)
            .include_header(true)
            .with_datetime_format(Some(DATETIME_EXPORT_FORMAT.to_string()))
            .finish(&mut df)?;

        info!(rows = df.height(), bytes = buf.len(), "CSV export ready");
        Ok(buf)
    }

    /// XLSX workbook with the table on one sheet, header in the first row.
    pub fn to_spreadsheet(df: &DataFrame) -> Result<Vec<u8>, ExportError> {
        let sheet = Self::sheet_xml(df)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(Self::rels_xml().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(Self::workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(Self::workbook_rels_xml().as_bytes())?;

        zip.start_file("xl/worksheets/sheet1.xml", options)?;
        zip.write_all(sheet.as_bytes())?;

        let bytes = zip.finish()?.into_inner();
        info!(rows = df.height(), bytes = bytes.len(), "XLSX export ready");
        Ok(bytes)
    }

    /// Column-major cells for every column of the frame.
    fn collect_cells(df: &DataFrame) -> Result<Vec<Vec<Cell>>, ExportError> {
        df.get_columns()
            .iter()
            .map(|column| -> Result<Vec<Cell>, ExportError> {
                if column.dtype().is_primitive_numeric() {
                    let values = column.cast(&DataType::Float64)?;
                    Ok(values
                        .f64()?
                        .into_iter()
                        .map(|v| v.map_or(Cell::Empty, Cell::Number))
                        .collect())
                } else {
                    let values = if column.dtype().is_temporal() {
                        Self::format_temporal(column)?
                    } else {
                        string_values(df, column.name())?
                    };
                    Ok(values
                        .into_iter()
                        .map(|v| v.map_or(Cell::Empty, Cell::Text))
                        .collect())
                }
            })
            .collect()
    }

    fn format_temporal(column: &Column) -> PolarsResult<Vec<Option<String>>> {
        let millis = column
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .cast(&DataType::Int64)?;
        Ok(millis
            .i64()?
            .into_iter()
            .map(|v| {
                v.and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(|ts| ts.format(DATETIME_EXPORT_FORMAT).to_string())
            })
            .collect())
    }

    fn sheet_xml(df: &DataFrame) -> Result<String, ExportError> {
        let columns = Self::collect_cells(df)?;

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
"#,
        );

        // Header row
        xml.push_str(r#"<row r="1">"#);
        for (col_idx, name) in df.get_column_names().iter().enumerate() {
            Self::push_text_cell(&mut xml, &Self::cell_ref(col_idx, 1), name)?;
        }
        xml.push_str("</row>\n");

        for row_idx in 0..df.height() {
            let row_num = row_idx + 2;
            xml.push_str(&format!(r#"<row r="{}">"#, row_num));
            for (col_idx, column) in columns.iter().enumerate() {
                let reference = Self::cell_ref(col_idx, row_num);
                match &column[row_idx] {
                    Cell::Number(v) if v.is_finite() => {
                        xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, v));
                    }
                    Cell::Number(v) => {
                        return Err(ExportError::Serialization(format!(
                            "non-finite number {} at {}",
                            v, reference
                        )));
                    }
                    Cell::Text(s) => Self::push_text_cell(&mut xml, &reference, s)?,
                    Cell::Empty => {}
                }
            }
            xml.push_str("</row>\n");
        }

        xml.push_str("</sheetData>\n</worksheet>");
        Ok(xml)
    }

    fn push_text_cell(xml: &mut String, reference: &str, text: &str) -> Result<(), ExportError> {
        let escaped = escape_xml(text).ok_or_else(|| {
            ExportError::Serialization(format!("invalid XML character in cell {}", reference))
        })?;
        xml.push_str(&format!(
            r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            reference, escaped
        ));
        Ok(())
    }

    /// A1-style reference for a zero-based column and one-based row.
    fn cell_ref(col_idx: usize, row: usize) -> String {
        let mut letters = Vec::new();
        let mut n = col_idx + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        letters.reverse();
        format!("{}{}", String::from_utf8_lossy(&letters), row)
    }

    fn content_types_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#
    }

    fn rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
    }

    fn workbook_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="{}" sheetId="1" r:id="rId1"/>
</sheets>
</workbook>"#,
            SHEET_NAME
        )
    }

    fn workbook_rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#
    }
}

/// Escape text for XML content. `None` if it holds a character XML 1.0 forbids.
fn escape_xml(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}
