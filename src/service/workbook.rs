//! Transcription between query results and `.xlsx` workbooks.

use calamine::{Data, Range, Reader, Xlsx, XlsxError as ReadError};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError as WriteError};
use serde_json::{Number, Value};
use std::path::Path;

use crate::db::models::parse_timestamp;
use crate::db::{Record, UnsafeIdent};

/// Sheet name and source table of every exported sheet, in workbook order.
pub const EXPORT_TABLES: [(&str, &str); 4] = [
    ("Inventory", "inventory"),
    ("Orders", "orders"),
    ("Payments", "payments"),
    ("Financial_Summary", "financial_summary"),
];

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const DATE_CELL_FORMAT: &str = "yyyy-mm-dd hh:mm:ss.000";

/// Imported date cells become literals MySQL accepts for DATETIME columns.
const MYSQL_DATETIME: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Rows destined for (or read from) one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Record>,
}

impl SheetData {
    /// Imported sheets are inserted into the table named like the sheet.
    pub fn table(&self) -> UnsafeIdent {
        UnsafeIdent::new_unchecked(self.name.clone())
    }
}

/// Serialize sheets into an `.xlsx` document.
///
/// Row 1 holds the column names of the first record, every later row the
/// values of one record in that column order. An empty sheet stays empty.
/// Timestamp strings in the API's wire form are written as date cells.
pub fn write_workbook(sheets: &[SheetData]) -> Result<Vec<u8>, WriteError> {
    let date_format = Format::new().set_num_format(DATE_CELL_FORMAT);
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        let Some(first) = sheet.rows.first() else {
            continue;
        };
        let headers: Vec<&String> = first.keys().collect();

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col_index(col)?, header.as_str())?;
        }
        for (i, record) in sheet.rows.iter().enumerate() {
            let row = row_index(i + 1)?;
            for (col, header) in headers.iter().enumerate() {
                if let Some(value) = record.get(header.as_str()) {
                    write_cell(worksheet, row, col_index(col)?, value, &date_format)?;
                }
            }
        }
    }
    workbook.save_to_buffer()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date_format: &Format,
) -> Result<(), WriteError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => {
            worksheet.write_number(row, col, n.as_f64().unwrap_or_default())?;
        }
        Value::String(s) => match parse_timestamp(s) {
            Some(ts) => {
                worksheet.write_datetime_with_format(row, col, &ts, date_format)?;
            }
            None => {
                worksheet.write_string(row, col, s.as_str())?;
            }
        },
        other => {
            worksheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

fn row_index(i: usize) -> Result<u32, WriteError> {
    u32::try_from(i).map_err(|_| WriteError::RowColumnLimitError)
}

fn col_index(i: usize) -> Result<u16, WriteError> {
    u16::try_from(i).map_err(|_| WriteError::RowColumnLimitError)
}

/// Parse every sheet of the `.xlsx` file at `path`.
///
/// Sheets with fewer than two rows are left out. The first row names the
/// columns; each later row becomes one record keyed by those names. Blank
/// header cells drop their column, blank data cells become `null`.
pub fn read_workbook(path: &Path) -> Result<Vec<SheetData>, ReadError> {
    let mut workbook: Xlsx<_> = calamine::open_workbook(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        if let Some(rows) = sheet_records(&range) {
            sheets.push(SheetData { name, rows });
        }
    }
    Ok(sheets)
}

fn sheet_records(range: &Range<Data>) -> Option<Vec<Record>> {
    if range.height() < 2 {
        return None;
    }
    let mut rows = range.rows();
    let headers: Vec<Option<String>> = rows.next()?.iter().map(header_name).collect();

    let records = rows
        .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .filter_map(|(idx, header)| {
                    let header = header.as_ref()?;
                    let value = cells.get(idx).map(cell_value).unwrap_or(Value::Null);
                    Some((header.clone(), value))
                })
                .collect::<Record>()
        })
        .collect();
    Some(records)
}

fn header_name(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(_) | Data::Int(_) => match cell_value(cell) {
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
        other => Some(other.to_string()),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => number_value(*f),
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => Value::String(ts.format(MYSQL_DATETIME).to_string()),
            None => number_value(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// Spreadsheets store every number as a float; whole values come back as integers.
fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn whole_floats_become_integers() {
        assert_eq!(number_value(3.0), json!(3));
        assert_eq!(number_value(-2.0), json!(-2));
        assert_eq!(number_value(2.5), json!(2.5));
    }

    #[test]
    fn header_cells_render_as_text() {
        assert_eq!(header_name(&Data::String("name".into())), Some("name".into()));
        assert_eq!(header_name(&Data::Float(2024.0)), Some("2024".into()));
        assert_eq!(header_name(&Data::Empty), None);
    }

    #[test]
    fn written_workbook_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.xlsx");
        let sheets = vec![
            SheetData {
                name: "Inventory".to_string(),
                rows: vec![
                    record(&[("id", json!(1)), ("name", json!("Shirt")), ("price", json!(9.5))]),
                    record(&[("id", json!(2)), ("name", Value::Null), ("price", json!(12))]),
                ],
            },
            SheetData {
                name: "Orders".to_string(),
                rows: Vec::new(),
            },
        ];
        let bytes = write_workbook(&sheets).expect("write workbook");
        std::fs::write(&path, bytes).expect("save workbook");

        let read = read_workbook(&path).expect("read workbook");

        assert_eq!(read.len(), 1, "empty sheet is skipped");
        assert_eq!(read[0].name, "Inventory");
        assert_eq!(read[0].rows, sheets[0].rows);
    }

    #[test]
    fn timestamps_round_trip_as_mysql_datetime_literals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.xlsx");
        let sheets = vec![SheetData {
            name: "orders".to_string(),
            rows: vec![record(&[
                ("id", json!(10)),
                ("created_at", json!("2024-05-01T10:00:00.250Z")),
                ("note", json!("2024-05-01")),
            ])],
        }];
        std::fs::write(&path, write_workbook(&sheets).expect("write workbook"))
            .expect("save workbook");

        let mut raw: Xlsx<_> = calamine::open_workbook(&path).expect("open workbook");
        let range = raw.worksheet_range("orders").expect("sheet exists");
        assert!(
            matches!(range.get((1, 1)), Some(Data::DateTime(_))),
            "timestamp is a date cell"
        );
        assert!(matches!(range.get((1, 2)), Some(Data::String(_))));

        let read = read_workbook(&path).expect("read workbook");
        let created_at = read[0].rows[0]["created_at"].as_str().expect("text");
        assert_eq!(created_at, "2024-05-01 10:00:00.250");
        assert!(
            chrono::NaiveDateTime::parse_from_str(created_at, MYSQL_DATETIME).is_ok(),
            "no 'T' separator or 'Z' suffix"
        );
        assert_eq!(read[0].rows[0]["note"], json!("2024-05-01"));
    }
}
