use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use rust_xlsxwriter::Workbook;

use crate::consolidate::{
    Column, ConsolidatedTable, InspectionRecord, SourceSheet, headers, positional_row,
};
use crate::util::ensure_directory;

pub const CONSOLIDATED_SHEET_NAME: &str = "Compiled";

/// Claim sheets start after the summary and rates sheets.
const CLAIM_SHEETS_SKIPPED: usize = 2;

/// Cell text of one job sheet in a monthly claim workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSheet {
    pub name: String,
    /// B5
    pub suburb: Option<String>,
    /// B6
    pub address: Option<String>,
    /// B9, free text holding one or more dd/mm/yyyy dates
    pub work_dates: Option<String>,
}

/// Reads the first worksheet of a contractor spreadsheet. The first row is
/// the header; cells are addressed from column A regardless of where the
/// used range begins.
pub fn read_source_sheet(path: &Path) -> Result<SourceSheet> {
    let range = first_sheet_range(path)?;

    let (Some((start_row, _)), Some((end_row, end_col))) = (range.start(), range.end()) else {
        return Ok(SourceSheet::default());
    };
    let width = end_col as usize + 1;

    let read_row = |row: u32| -> Vec<Option<String>> {
        (0..width)
            .map(|col| {
                let column = Column::ALL.get(col).copied();
                range
                    .get_value((row, col as u32))
                    .and_then(|cell| cell_text(cell, column))
            })
            .collect()
    };

    Ok(SourceSheet {
        headers: read_row(start_row),
        rows: (start_row + 1..=end_row).map(read_row).collect(),
    })
}

/// Reads a workbook produced by [`write_consolidated`], possibly edited
/// during review. Fully empty rows are skipped.
pub fn read_consolidated(path: &Path) -> Result<ConsolidatedTable> {
    let sheet = read_source_sheet(path)?;

    for column in Column::ALL {
        let found = sheet
            .headers
            .get(column.index())
            .and_then(|header| header.as_deref())
            .unwrap_or_default();
        if found.trim() != column.header() {
            bail!(
                "{} is not a consolidated workbook: column {} header is {:?}, expected {:?}",
                path.display(),
                column.index() + 1,
                found,
                column.header()
            );
        }
    }

    let records = sheet
        .rows
        .iter()
        .map(|row| positional_row(row))
        .filter(|values| values.iter().any(Option::is_some))
        .map(InspectionRecord::new)
        .collect();

    Ok(ConsolidatedTable::from_records(records))
}

/// Writes the header row and one row per record. Inspected lengths that read
/// as numbers are stored as numbers; everything else is text.
pub fn write_consolidated(path: &Path, table: &ConsolidatedTable) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(CONSOLIDATED_SHEET_NAME)
        .map_err(|e| anyhow!("failed to name worksheet: {e}"))?;

    for (col, header) in headers().into_iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header)
            .map_err(|e| anyhow!("failed to write header {header:?}: {e}"))?;
    }

    for (index, record) in table.records().iter().enumerate() {
        let row = index as u32 + 1;
        for column in Column::ALL {
            let Some(value) = record.get(column) else {
                continue;
            };
            let col = column.index() as u16;

            let written = match numeric_value(column, value) {
                Some(number) => worksheet.write_number(row, col, number),
                None => worksheet.write_string(row, col, value),
            };
            written.map_err(|e| {
                anyhow!("failed to write row {} column {:?}: {e}", row + 1, column.header())
            })?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| anyhow!("failed to save {}: {e}", path.display()))?;

    Ok(())
}

pub fn read_claim_sheets(path: &Path) -> Result<Vec<ClaimSheet>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow!("failed to open workbook {}: {e}", path.display()))?;
    let sheet_names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::new();
    for name in sheet_names.into_iter().skip(CLAIM_SHEETS_SKIPPED) {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| anyhow!("failed to read sheet {name:?} of {}: {e}", path.display()))?;

        sheets.push(ClaimSheet {
            suburb: absolute_cell(&range, 4, 1),
            address: absolute_cell(&range, 5, 1),
            work_dates: absolute_cell(&range, 8, 1),
            name,
        });
    }

    Ok(sheets)
}

fn first_sheet_range(path: &Path) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow!("failed to open workbook {}: {e}", path.display()))?;

    workbook
        .worksheet_range_at(0)
        .with_context(|| format!("workbook has no sheets: {}", path.display()))?
        .map_err(|e| anyhow!("failed to read first sheet of {}: {e}", path.display()))
}

fn absolute_cell(range: &Range<Data>, row: u32, col: u32) -> Option<String> {
    range
        .get_value((row, col))
        .and_then(|cell| cell_text(cell, None))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Renders a cell the way the consolidated sheet stores it. Error cells and
/// empty strings read as empty.
fn cell_text(cell: &Data, column: Option<Column>) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => format_datetime(dt.as_datetime()?, column),
    };

    (!text.is_empty()).then_some(text)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn format_datetime(value: NaiveDateTime, column: Option<Column>) -> String {
    match column {
        Some(Column::InspectionDate) => value.format("%d/%m/%Y").to_string(),
        Some(Column::InspectionTime) => value.format("%H:%M:%S").to_string(),
        _ => value.format("%d/%m/%Y %H:%M:%S").to_string(),
    }
}

fn numeric_value(column: Column, value: &str) -> Option<f64> {
    match column {
        Column::InspectedLength => value.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(path: &Path, rows: &[&[&str]]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet
                        .write_string(r as u32, c as u16, *value)
                        .expect("fixture cell");
                }
            }
        }
        workbook.save(path).expect("fixture workbook");
    }

    #[test]
    fn source_sheet_keeps_column_positions_and_trailing_blank_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("job.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (c, header) in ["Attempt", "Video", "US", "DS"].iter().enumerate() {
            sheet.write_string(0, c as u16 + 1, *header).expect("header");
        }
        sheet.write_string(1, 2, "clip.mp4").expect("cell");
        sheet.write_number(1, 3, 7.0).expect("cell");
        sheet.write_number(2, 4, 12.5).expect("cell");
        sheet.write_string(4, 1, " ").expect("cell");
        workbook.save(&path).expect("fixture workbook");

        let source = read_source_sheet(&path).expect("readable sheet");
        assert_eq!(source.width(), 5);
        assert_eq!(source.headers[0], None);
        assert_eq!(source.headers[1].as_deref(), Some("Attempt"));
        assert_eq!(source.rows.len(), 4);
        assert_eq!(source.rows[0][2].as_deref(), Some("clip.mp4"));
        assert_eq!(source.rows[0][3].as_deref(), Some("7"));
        assert_eq!(source.rows[1][4].as_deref(), Some("12.5"));
        assert!(source.rows[2].iter().all(Option::is_none));
    }

    #[test]
    fn consolidated_workbook_reads_back_with_schema_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("compiled_data.xlsx");

        let mut values = crate::consolidate::positional_row(&[]);
        values[Column::WorkOrder.index()] = Some("91171698".to_string());
        values[Column::InspectionDate.index()] = Some("05/03/2024".to_string());
        values[Column::InspectionTime.index()] = Some("03:10:00".to_string());
        values[Column::InspectedLength.index()] = Some("42.5".to_string());
        let table = ConsolidatedTable::from_records(vec![InspectionRecord::new(values)]);

        write_consolidated(&path, &table).expect("write succeeds");
        let read = read_consolidated(&path).expect("read succeeds");

        assert_eq!(read.len(), 1);
        let record = &read.records()[0];
        assert_eq!(record.work_order(), "91171698");
        assert_eq!(record.get(Column::InspectedLength), Some("42.5"));
        assert_eq!(record.timestamp(), table.records()[0].timestamp());
    }

    #[test]
    fn foreign_workbooks_are_rejected_as_consolidated_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("other.xlsx");
        write_fixture(&path, &[&["Name", "Value"], &["a", "1"]]);

        let err = read_consolidated(&path).expect_err("wrong headers");
        assert!(err.to_string().contains("not a consolidated workbook"));
    }

    #[test]
    fn claim_sheets_skip_summary_sheets_and_read_fixed_cells() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("claim.xlsx");

        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Summary").expect("name");
        workbook.add_worksheet().set_name("Rates").expect("name");
        let job = workbook.add_worksheet().set_name("JDS1234").expect("name");
        job.write_string(4, 1, " PARRAMATTA ").expect("cell");
        job.write_string(5, 1, "12 SMITH ST").expect("cell");
        job.write_string(8, 1, "03/02/2024 - 05/02/2024").expect("cell");
        workbook.add_worksheet().set_name("JDS1300").expect("name");
        workbook.save(&path).expect("fixture workbook");

        let sheets = read_claim_sheets(&path).expect("readable claim workbook");
        assert_eq!(sheets.len(), 2);
        assert_eq!(
            sheets[0],
            ClaimSheet {
                name: "JDS1234".to_string(),
                suburb: Some("PARRAMATTA".to_string()),
                address: Some("12 SMITH ST".to_string()),
                work_dates: Some("03/02/2024 - 05/02/2024".to_string()),
            }
        );
        assert_eq!(sheets[1].name, "JDS1300");
        assert!(sheets[1].address.is_none());
    }

    #[test]
    fn cell_text_formats_dates_by_column() {
        let value = NaiveDateTime::parse_from_str("2024-03-05 14:30:00", "%Y-%m-%d %H:%M:%S")
            .expect("valid timestamp");
        assert_eq!(format_datetime(value, Some(Column::InspectionDate)), "05/03/2024");
        assert_eq!(format_datetime(value, Some(Column::InspectionTime)), "14:30:00");
        assert_eq!(format_datetime(value, None), "05/03/2024 14:30:00");
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(3.25), "3.25");
        assert_eq!(cell_text(&Data::String(String::new()), None), None);
    }
}
