use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use tracing::{info, warn};

use crate::cli::StageArgs;
use crate::commands::compile;
use crate::consolidate::{Column, InspectionRecord, parse_inspection_date, parse_inspection_time};
use crate::model::{ArchivedJob, StageCounts, StageRunManifest, StagedReport};
use crate::util::{
    copy_file, ensure_directory, file_name_string, move_dir, now_utc_string, utc_compact_string,
    write_json_pretty,
};
use crate::workbook;

/// Latest time of day still booked against the previous shift's date.
const NIGHT_SHIFT_END: (u32, u32) = (5, 30);

pub fn run(args: StageArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("stage-{}", utc_compact_string(started_ts));
    let local_now = Local::now();

    let workbook_path = args
        .workbook_path
        .clone()
        .unwrap_or_else(|| compile::default_output_path(&args.root));
    let snapshot_dir = args
        .snapshot_dir
        .clone()
        .unwrap_or_else(|| args.root.join("snapshots"));
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        args.root
            .join("manifests")
            .join(format!("stage_run_{}.json", utc_compact_string(started_ts)))
    });

    if !workbook_path.is_file() {
        bail!("consolidated workbook not found: {}", workbook_path.display());
    }

    info!(
        workbook = %workbook_path.display(),
        dry_run = args.dry_run,
        run_id = %run_id,
        "starting stage"
    );

    let table = workbook::read_consolidated(&workbook_path)?;

    let snapshot_path = snapshot_dir.join(format!(
        "COPY_{}.xlsx",
        local_now.format("%d%m%Y_%H%M")
    ));
    if args.dry_run {
        info!(path = %snapshot_path.display(), "would snapshot workbook");
    } else {
        copy_file(&workbook_path, &snapshot_path)?;
        info!(path = %snapshot_path.display(), "snapshotted workbook");
    }

    let mut counts = StageCounts {
        rows_read: table.len(),
        ..StageCounts::default()
    };
    let mut warnings = Vec::new();
    let mut reports = Vec::new();
    let mut job_folders = BTreeSet::new();

    for record in table.records() {
        if record.get(Column::InspectedLength).is_none() {
            counts.rows_without_length += 1;
            continue;
        }

        if let Some(folder) = job_folder_of(record) {
            job_folders.insert(folder);
        }

        match plan_report(record, &args.reports_dir) {
            Ok(report) => {
                if !args.dry_run {
                    copy_file(Path::new(&report.source), Path::new(&report.destination))?;
                }
                info!(
                    work_order = %report.work_order,
                    destination = %report.destination,
                    "staged report"
                );
                counts.reports_copied += 1;
                reports.push(report);
            }
            Err(reason) => {
                let warning = format!("{}: {reason}", record.work_order());
                warn!(warning = %warning, "report not staged");
                warnings.push(warning);
            }
        }
    }

    let archive_root = args
        .uploaded_root
        .join(local_now.format("%d%m%Y").to_string());
    let mut archived = Vec::new();
    if !job_folders.is_empty() && !args.dry_run {
        ensure_directory(&archive_root)?;
    }

    for folder in job_folders {
        let name = file_name_string(&folder)?;
        let destination = archive_root.join(&name);

        if destination.exists() {
            let warning = format!(
                "{} already exists, skipping move",
                destination.display()
            );
            warn!(warning = %warning, "job folder not archived");
            warnings.push(warning);
            counts.jobs_skipped += 1;
            continue;
        }
        if !folder.is_dir() {
            let warning = format!("job folder not found: {}", folder.display());
            warn!(warning = %warning, "job folder not archived");
            warnings.push(warning);
            counts.jobs_skipped += 1;
            continue;
        }

        if !args.dry_run {
            move_dir(&folder, &destination)?;
        }
        info!(
            source = %folder.display(),
            destination = %destination.display(),
            "archived job folder"
        );
        counts.jobs_archived += 1;
        archived.push(ArchivedJob {
            source: folder.display().to_string(),
            destination: destination.display().to_string(),
        });
    }

    let manifest = StageRunManifest {
        manifest_version: 1,
        run_id,
        started_at,
        updated_at: now_utc_string(),
        dry_run: args.dry_run,
        workbook_path: workbook_path.display().to_string(),
        snapshot_path: (!args.dry_run).then(|| snapshot_path.display().to_string()),
        counts,
        reports,
        archived,
        warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote stage run manifest");
    info!(
        reports = manifest.counts.reports_copied,
        archived = manifest.counts.jobs_archived,
        skipped = manifest.counts.jobs_skipped,
        "stage completed"
    );

    Ok(())
}

/// The date a report is filed under. Inspections finishing between midnight
/// and 05:30 belong to the previous day's shift.
pub fn report_date(date: NaiveDate, time: Option<NaiveTime>) -> NaiveDate {
    let (hour, minute) = NIGHT_SHIFT_END;
    let rollover = NaiveTime::from_hms_opt(hour, minute, 0);

    match (time, rollover) {
        (Some(time), Some(end)) if time <= end => date.pred_opt().unwrap_or(date),
        _ => date,
    }
}

pub fn report_file_name(work_order: &str, date: NaiveDate) -> String {
    format!("{work_order} CCTV REPORT {}.pdf", date.format("%d%m%Y"))
}

fn plan_report(record: &InspectionRecord, reports_dir: &Path) -> Result<StagedReport, String> {
    let source = record
        .get(Column::SectionPdf)
        .ok_or_else(|| "no section PDF recorded".to_string())?;
    if !Path::new(source).is_file() {
        return Err(format!("section PDF not found: {source}"));
    }

    let date = record
        .get(Column::InspectionDate)
        .and_then(parse_inspection_date)
        .ok_or_else(|| "no readable inspection date".to_string())?;
    let time = record.get(Column::InspectionTime).and_then(parse_inspection_time);

    let file_name = report_file_name(record.work_order(), report_date(date, time));
    Ok(StagedReport {
        work_order: record.work_order().to_string(),
        source: source.to_string(),
        destination: reports_dir.join(file_name).display().to_string(),
    })
}

/// `<job>/Video/Sec/<file>` for videos, `<job>/misc/docu/<file>` for reports.
fn job_folder_of(record: &InspectionRecord) -> Option<PathBuf> {
    [Column::InspectionVideos, Column::SectionPdf]
        .into_iter()
        .filter_map(|column| record.get(column))
        .find_map(|path| Path::new(path).ancestors().nth(3).map(Path::to_path_buf))
        .filter(|folder| !folder.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::consolidate::{ConsolidatedTable, positional_row};
    use crate::util::read_json;

    fn date(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn night_shift_inspections_roll_back_a_day() {
        assert_eq!(report_date(date(5, 3, 2024), time(3, 0)), date(4, 3, 2024));
        assert_eq!(report_date(date(5, 3, 2024), time(0, 0)), date(4, 3, 2024));
        assert_eq!(report_date(date(5, 3, 2024), time(5, 30)), date(4, 3, 2024));
        assert_eq!(report_date(date(5, 3, 2024), time(5, 31)), date(5, 3, 2024));
        assert_eq!(report_date(date(1, 3, 2024), time(1, 0)), date(29, 2, 2024));
        assert_eq!(report_date(date(5, 3, 2024), None), date(5, 3, 2024));
    }

    #[test]
    fn report_names_use_filing_date() {
        assert_eq!(
            report_file_name("12345678", report_date(date(5, 3, 2024), time(3, 0))),
            "12345678 CCTV REPORT 04032024.pdf"
        );

        let short_year = parse_inspection_date("05/03/24").expect("two-digit year");
        assert_eq!(
            report_file_name("12345678", report_date(short_year, time(3, 0))),
            "12345678 CCTV REPORT 04032024.pdf"
        );
    }

    fn staged_record(job: &Path, work_order: &str, length: Option<&str>) -> InspectionRecord {
        let mut row = positional_row(&[]);
        row[Column::WorkOrder.index()] = Some(work_order.to_string());
        row[Column::InspectionDate.index()] = Some("05/03/2024".to_string());
        row[Column::InspectionTime.index()] = Some("03:15:00".to_string());
        row[Column::InspectedLength.index()] = length.map(ToOwned::to_owned);
        row[Column::InspectionVideos.index()] = Some(
            job.join("Video").join("Sec").join("a.mp4").display().to_string(),
        );
        row[Column::SectionPdf.index()] = Some(
            job.join("misc").join("docu").join("report.pdf").display().to_string(),
        );
        InspectionRecord::new(row)
    }

    fn make_job(root: &Path, name: &str) -> PathBuf {
        let job = root.join("pending").join(name);
        fs::create_dir_all(job.join("Video").join("Sec")).expect("mkdir");
        fs::create_dir_all(job.join("misc").join("docu")).expect("mkdir");
        fs::write(job.join("misc").join("docu").join("report.pdf"), b"%PDF").expect("pdf");
        job
    }

    #[test]
    fn job_folder_prefers_video_path() {
        let job = Path::new("/pending/12345678 JOB");
        let record = staged_record(job, "12345678", Some("10"));
        assert_eq!(job_folder_of(&record), Some(job.to_path_buf()));
    }

    #[test]
    fn stage_copies_reports_and_archives_jobs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staged = make_job(dir.path(), "12345678 STAGED");
        let pending = make_job(dir.path(), "87654321 PENDING");

        let table = ConsolidatedTable::from_records(vec![
            staged_record(&staged, "12345678", Some("22.5")),
            staged_record(&pending, "87654321", None),
        ]);
        let workbook_path = dir.path().join("compiled_data.xlsx");
        workbook::write_consolidated(&workbook_path, &table).expect("write workbook");

        let reports_dir = dir.path().join("PDF REPORTS");
        let uploaded_root = dir.path().join("UPLOADED");
        let run_manifest_path = dir.path().join("stage.json");

        run(StageArgs {
            root: dir.path().to_path_buf(),
            workbook_path: None,
            snapshot_dir: None,
            reports_dir: reports_dir.clone(),
            uploaded_root: uploaded_root.clone(),
            run_manifest_path: Some(run_manifest_path.clone()),
            dry_run: false,
        })
        .expect("stage run");

        assert!(reports_dir.join("12345678 CCTV REPORT 04032024.pdf").is_file());
        assert!(!staged.exists());
        assert!(pending.exists());

        let manifest: StageRunManifest = read_json(&run_manifest_path).expect("manifest");
        assert_eq!(manifest.counts.rows_read, 2);
        assert_eq!(manifest.counts.rows_without_length, 1);
        assert_eq!(manifest.counts.reports_copied, 1);
        assert_eq!(manifest.counts.jobs_archived, 1);
        assert!(Path::new(&manifest.archived[0].destination).join("misc").is_dir());
        assert!(manifest.archived[0].destination.starts_with(&uploaded_root.display().to_string()));

        let snapshot = manifest.snapshot_path.expect("snapshot recorded");
        assert!(Path::new(&snapshot).is_file());
        assert!(file_name_string(Path::new(&snapshot)).expect("name").starts_with("COPY_"));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staged = make_job(dir.path(), "12345678 STAGED");
        let table =
            ConsolidatedTable::from_records(vec![staged_record(&staged, "12345678", Some("3"))]);
        let workbook_path = dir.path().join("compiled_data.xlsx");
        workbook::write_consolidated(&workbook_path, &table).expect("write workbook");

        let reports_dir = dir.path().join("PDF REPORTS");
        let run_manifest_path = dir.path().join("stage.json");
        run(StageArgs {
            root: dir.path().to_path_buf(),
            workbook_path: Some(workbook_path),
            snapshot_dir: None,
            reports_dir: reports_dir.clone(),
            uploaded_root: dir.path().join("UPLOADED"),
            run_manifest_path: Some(run_manifest_path.clone()),
            dry_run: true,
        })
        .expect("stage dry-run");

        assert!(staged.exists());
        assert!(!reports_dir.exists());
        assert!(!dir.path().join("snapshots").exists());

        let manifest: StageRunManifest = read_json(&run_manifest_path).expect("manifest");
        assert_eq!(manifest.counts.reports_copied, 1);
        assert_eq!(manifest.counts.jobs_archived, 1);
        assert!(manifest.snapshot_path.is_none());
    }
}
