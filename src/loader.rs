// 📥 Loader - CSV / spreadsheet → Table → RawPartyRow
//
// Supported: .csv (csv crate), .xlsx/.xlsm/.xls/.xlsb/.ods (calamine, first sheet).
// Headers are matched case-insensitively through a small alias table, so
// "DOB", "birth_date" and "Date_Of_Birth" all land in the same field.
// The original header text and every original cell are kept for export.

use crate::record::RawPartyRow;
use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::fs::File;
use std::path::Path;

/// Field → accepted header names (lower-case), first match wins
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("party_tc", &["party_tc", "party_type"]),
    ("pan", &["pan", "pan_no", "pan_number"]),
    ("aadhar_no", &["aadhar_no", "aadhar", "aadhaar_no", "aadhaar"]),
    ("dob", &["dob", "birth_date", "date_of_birth"]),
    ("first_name", &["first_name"]),
    ("last_name", &["last_name"]),
    ("organization_name", &["organization_name", "org_name"]),
    ("ucic", &["ucic"]),
];

// ============================================================================
// TABLE
// ============================================================================

/// Rectangular string table. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Header text as found in the file (trimmed)
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Table { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column position for a header name, case-insensitive
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// Column position for a canonical field, trying each alias in order
    pub fn field_column(&self, field: &str) -> Option<usize> {
        COLUMN_ALIASES
            .iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, aliases)| aliases.iter().find_map(|alias| self.column(alias)))
    }

    /// Map every row onto the canonical raw record. Missing columns are empty.
    pub fn party_rows(&self) -> Vec<RawPartyRow> {
        let col = |field: &str| self.field_column(field);
        let party_tc = col("party_tc");
        let pan = col("pan");
        let aadhar_no = col("aadhar_no");
        let dob = col("dob");
        let first_name = col("first_name");
        let last_name = col("last_name");
        let organization_name = col("organization_name");
        let ucic = col("ucic");

        for (field, _) in COLUMN_ALIASES {
            if self.field_column(field).is_none() {
                debug!("Column '{}' not present, treating as empty", field);
            }
        }

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let get = |idx: Option<usize>| {
                    idx.and_then(|i| cells.get(i)).cloned().unwrap_or_default()
                };
                RawPartyRow {
                    row,
                    party_tc: get(party_tc),
                    pan: get(pan),
                    aadhar_no: get(aadhar_no),
                    dob: get(dob),
                    first_name: get(first_name),
                    last_name: get(last_name),
                    organization_name: get(organization_name),
                    ucic: get(ucic),
                }
            })
            .collect()
    }
}

// ============================================================================
// FILE LOADING
// ============================================================================

/// Load a table, picking the reader from the file extension
pub fn load_table(path: &Path) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let table = match extension.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_spreadsheet(path)?,
        other => bail!(
            "Unsupported input format '{}' for {} (expected csv, xlsx, xls, xlsb or ods)",
            other,
            path.display()
        ),
    };

    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers.len(),
        path.display()
    );

    Ok(table)
}

/// Load and map in one go
pub fn load_party_rows(path: &Path) -> Result<(Table, Vec<RawPartyRow>)> {
    let table = load_table(path)?;
    let rows = table.party_rows();
    Ok((table, rows))
}

fn load_csv(path: &Path) -> Result<Table> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header in {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;

        if record.len() > headers.len() {
            warn!(
                "Line {} in {} has {} fields, header has {}; extra fields ignored",
                line_num + 2,
                path.display(),
                record.len(),
                headers.len()
            );
        }

        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

fn load_spreadsheet(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow!("Failed to open spreadsheet {}: {}", path.display(), e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("Spreadsheet {} contains no sheets", path.display()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| anyhow!("Failed to read sheet '{}' in {}: {}", sheet_name, path.display(), e))?;

    let mut cells = range.rows();
    let headers: Vec<String> = match cells.next() {
        Some(header_row) => header_row.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Ok(Table::default()),
    };

    let rows: Vec<Vec<String>> = cells
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    debug!("Sheet '{}' of {}: {} data rows", sheet_name, path.display(), rows.len());

    Ok(Table::new(headers, rows))
}

/// Render one spreadsheet cell the way it would read in a CSV export.
/// Whole numbers lose their ".0" (Aadhar numbers are often stored as numbers),
/// date cells become YYYY-MM-DD.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.get(..10).unwrap_or(s).to_string(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// 1900 date system serial → calendar date (day 1 = 1900-01-01)
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_with_aliases() {
        let file = write_csv(
            "UCIC,Party_TC,PAN_No,Aadhaar,Birth_Date,First_Name,Last_Name,Org_Name,Branch\n\
             U1,PERSON,abcde1234f,XXXX XXXX 1234,01/01/1990,john,smith,,Pune\n\
             U2,ORGANIZATION,,,15-08-2001,,,Acme Ltd,Mumbai\n",
        );

        let (table, rows) = load_party_rows(file.path()).unwrap();

        assert_eq!(table.headers.len(), 9);
        assert_eq!(table.headers[0], "UCIC");
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].row, 0);
        assert_eq!(rows[0].ucic, "U1");
        assert_eq!(rows[0].party_tc, "PERSON");
        assert_eq!(rows[0].pan, "abcde1234f");
        assert_eq!(rows[0].aadhar_no, "XXXX XXXX 1234");
        assert_eq!(rows[0].dob, "01/01/1990");
        assert_eq!(rows[0].first_name, "john");

        assert_eq!(rows[1].row, 1);
        assert_eq!(rows[1].organization_name, "Acme Ltd");
        assert_eq!(rows[1].first_name, "");
    }

    #[test]
    fn test_alias_priority() {
        let table = Table::new(
            vec!["birth_date".to_string(), "dob".to_string()],
            vec![vec!["02/02/1992".to_string(), "01/01/1990".to_string()]],
        );

        assert_eq!(table.field_column("dob"), Some(1));
        assert_eq!(table.party_rows()[0].dob, "01/01/1990");
    }

    #[test]
    fn test_missing_columns_are_empty() {
        let file = write_csv("pan\nABCDE1234F\n");

        let (_, rows) = load_party_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pan, "ABCDE1234F");
        assert_eq!(rows[0].ucic, "");
        assert_eq!(rows[0].dob, "");
        assert_eq!(rows[0].party_tc, "");
    }

    #[test]
    fn test_short_rows_padded_and_blank_rows_skipped() {
        let file = write_csv("ucic,pan,dob\nU1,ABCDE1234F\n,,\nU3,,01/01/1990\n");

        let table = load_table(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["U1", "ABCDE1234F", ""]);
        assert_eq!(table.rows[1][0], "U3");
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let file = write_csv("\u{feff}ucic,pan\nU1,ABCDE1234F\n");

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.column("ucic"), Some(0));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = load_table(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported input format"));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_table(Path::new("/nonexistent/master.csv")).is_err());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(123456789012.0)), "123456789012");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::DateTimeIso("1990-01-01T00:00:00".to_string())), "1990-01-01");
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(32874.0), NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(excel_serial_to_date(32874.75), NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(excel_serial_to_date(0.0), None);
    }
}
