use std::path::{Path, PathBuf};

use super::error::ConsolidateError;
use super::record::InspectionRecord;
use super::schema::{Column, NormalizedRow, is_blank_row, reconcile_row};
use super::table::ConsolidatedTable;
use super::work_order::WorkOrderPattern;

/// Cell text of one contractor spreadsheet, header row excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSheet {
    pub headers: Vec<Option<String>>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl SourceSheet {
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// One completed job folder together with its materialized spreadsheet.
#[derive(Debug, Clone)]
pub struct JobSource {
    pub name: String,
    pub docu_dir: PathBuf,
    pub video_dir: PathBuf,
    pub report_pdf: Option<PathBuf>,
    pub sheet: SourceSheet,
}

#[derive(Debug, Default)]
pub struct AggregateOutcome {
    pub table: ConsolidatedTable,
    pub source_rows: usize,
    pub blank_rows_dropped: usize,
    pub warnings: Vec<String>,
}

/// Fails unless the docu folder listing holds exactly one spreadsheet.
pub fn single_spreadsheet<'a>(
    directory: &Path,
    spreadsheets: &'a [PathBuf],
) -> Result<&'a Path, ConsolidateError> {
    match spreadsheets {
        [only] => Ok(only.as_path()),
        _ => Err(ConsolidateError::SourceCount {
            directory: directory.to_path_buf(),
            found: spreadsheets.len(),
        }),
    }
}

/// Merges every job's rows into one table, in job order then row order.
///
/// Stops at the first job whose folder name carries no work order number.
pub fn aggregate(
    jobs: &[JobSource],
    pattern: &WorkOrderPattern,
) -> Result<AggregateOutcome, ConsolidateError> {
    let mut outcome = AggregateOutcome::default();
    let mut records = Vec::new();

    for job in jobs {
        let work_order = pattern.extract(&job.name)?;

        if job.sheet.width() > Column::ALL.len() {
            outcome.warnings.push(format!(
                "{}: spreadsheet has {} columns, columns past {} ignored",
                job.name,
                job.sheet.width(),
                Column::ALL.len()
            ));
        }

        for (row_index, source_row) in job.sheet.rows.iter().enumerate() {
            outcome.source_rows += 1;

            let mut values = reconcile_row(source_row);
            if is_blank_row(&values) {
                outcome.blank_rows_dropped += 1;
                continue;
            }

            stamp_job_fields(&mut values, job, &work_order);

            let record = InspectionRecord::new(values);
            if record.timestamp().is_none() {
                outcome.warnings.push(format!(
                    "{}: row {} has no readable inspection date/time ({:?} {:?})",
                    job.name,
                    row_index + 2,
                    record.get(Column::InspectionDate).unwrap_or_default(),
                    record.get(Column::InspectionTime).unwrap_or_default(),
                ));
            }
            records.push(record);
        }
    }

    outcome.table = ConsolidatedTable::from_records(records);
    Ok(outcome)
}

fn stamp_job_fields(values: &mut NormalizedRow, job: &JobSource, work_order: &str) {
    values[Column::WorkOrder.index()] = Some(work_order.to_string());

    let child = &mut values[Column::ChildWorkOrder.index()];
    if child.is_none() {
        *child = Some(work_order.to_string());
    }

    let video = &mut values[Column::InspectionVideos.index()];
    if let Some(file_name) = video.take() {
        *video = Some(rebase(&job.video_dir, &file_name));
    }

    let pdf = &mut values[Column::SectionPdf.index()];
    *pdf = match pdf.take() {
        Some(file_name) => Some(rebase(&job.docu_dir, &file_name)),
        None => job
            .report_pdf
            .as_ref()
            .map(|path| path.display().to_string()),
    };
}

fn rebase(directory: &Path, file_name: &str) -> String {
    directory.join(file_name.trim()).display().to_string()
}
