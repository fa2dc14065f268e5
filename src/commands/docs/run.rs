use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::cli::DocsArgs;
use crate::model::{DocsRunManifest, SheetReport};
use crate::util::{
    copy_file, ensure_directory, file_name_string, list_dirs, list_files, now_utc_string,
    utc_compact_string, write_json_pretty,
};
use crate::workbook::{self, ClaimSheet};

use super::matching::near_miss_segment;
use super::naming::{ClaimDates, dotted_date, job_folder_name, timesheet_name};

struct DocsContext {
    output_dir: PathBuf,
    timesheet_root: PathBuf,
    contract: String,
    reports_dir: Option<PathBuf>,
    dates: ClaimDates,
}

pub(crate) fn run(args: DocsArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("docs-{}", utc_compact_string(started_ts));

    let workers = match args.workers {
        Some(0) => bail!("--workers must be at least 1"),
        Some(workers) => workers,
        None => std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1),
    };
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        args.output_dir
            .join("manifests")
            .join(format!("docs_run_{}.json", utc_compact_string(started_ts)))
    });

    let sheets = workbook::read_claim_sheets(&args.claim_workbook)?;
    info!(
        workbook = %args.claim_workbook.display(),
        sheets = sheets.len(),
        workers,
        run_id = %run_id,
        "starting supporting-docs filing"
    );

    ensure_directory(&args.output_dir)?;

    let context = DocsContext {
        output_dir: args.output_dir.clone(),
        timesheet_root: args.timesheet_root.clone(),
        contract: args.contract.clone(),
        reports_dir: args.reports_dir.clone(),
        dates: ClaimDates::new()?,
    };

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to build worker pool")?;
    let reports: Vec<SheetReport> =
        pool.install(|| sheets.par_iter().map(|sheet| process_sheet(sheet, &context)).collect());

    let failed_sheets = reports.iter().filter(|report| report.error.is_some()).count();
    let manifest = DocsRunManifest {
        manifest_version: 1,
        run_id,
        started_at,
        updated_at: now_utc_string(),
        claim_workbook: args.claim_workbook.display().to_string(),
        output_dir: args.output_dir.display().to_string(),
        workers,
        sheet_count: reports.len(),
        failed_sheets,
        sheets: reports,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    info!(path = %run_manifest_path.display(), "wrote docs run manifest");

    if failed_sheets > 0 {
        bail!(
            "{failed_sheets} of {} claim sheets failed; see {}",
            manifest.sheet_count,
            run_manifest_path.display()
        );
    }

    info!(sheets = manifest.sheet_count, "supporting-docs filing completed");
    Ok(())
}

fn process_sheet(sheet: &ClaimSheet, context: &DocsContext) -> SheetReport {
    let mut report = SheetReport {
        sheet: sheet.name.clone(),
        folder: None,
        dates: Vec::new(),
        timesheets_copied: Vec::new(),
        reports_copied: Vec::new(),
        warnings: Vec::new(),
        error: None,
    };

    match file_sheet(sheet, context, &mut report) {
        Ok(()) => info!(
            sheet = %sheet.name,
            timesheets = report.timesheets_copied.len(),
            reports = report.reports_copied.len(),
            "filed claim sheet"
        ),
        Err(err) => {
            error!(sheet = %sheet.name, error = %format!("{err:#}"), "claim sheet failed");
            report.error = Some(format!("{err:#}"));
        }
    }

    report
}

fn file_sheet(sheet: &ClaimSheet, context: &DocsContext, report: &mut SheetReport) -> Result<()> {
    let sheet_name = sheet.name.trim();
    let address = sheet
        .address
        .as_deref()
        .with_context(|| format!("sheet {sheet_name}: cell B6 (address) is empty"))?;
    let suburb = sheet
        .suburb
        .as_deref()
        .with_context(|| format!("sheet {sheet_name}: cell B5 (suburb) is empty"))?;
    let work_dates = sheet
        .work_dates
        .as_deref()
        .with_context(|| format!("sheet {sheet_name}: cell B9 (work dates) is empty"))?;

    let folder = context
        .output_dir
        .join(job_folder_name(sheet_name, address, suburb));
    ensure_directory(&folder)?;
    report.folder = Some(folder.display().to_string());

    for date in context.dates.extract(work_dates)? {
        let dotted = dotted_date(date);
        report.dates.push(dotted.clone());

        let copied = file_timesheets(sheet_name, date, &folder, context, report)?;
        if copied == 0 {
            push_warning(report, format!("no files found for {sheet_name} on {dotted}"));
        }
    }

    if let Some(reports_dir) = &context.reports_dir {
        for path in walk_files(reports_dir)? {
            let name = file_name_string(&path)?;
            if !name.contains(sheet_name) {
                continue;
            }
            copy_file(&path, &folder.join(&name))?;
            report.reports_copied.push(name);
        }
    }

    Ok(())
}

/// Copies the scanned timesheets for one work date into the job folder and
/// returns how many were copied.
fn file_timesheets(
    sheet_name: &str,
    date: NaiveDate,
    folder: &Path,
    context: &DocsContext,
    report: &mut SheetReport,
) -> Result<usize> {
    let dotted = dotted_date(date);
    let month = date.format("%B").to_string();
    let contract_dir = context
        .timesheet_root
        .join(date.format("%Y").to_string())
        .join(&context.contract);

    let mut copied = 0;
    for month_dir in list_dirs(&contract_dir)? {
        if !file_name_string(&month_dir)?.contains(&month) {
            continue;
        }
        if !contains_entry_named(&month_dir, &dotted)? {
            continue;
        }

        let date_dir = month_dir.join(&dotted);
        if !date_dir.is_dir() {
            continue;
        }

        for path in walk_files(&date_dir)? {
            let name = file_name_string(&path)?;
            if name.contains(sheet_name) {
                let renamed = timesheet_name(&name, sheet_name)?;
                let destination = folder.join(&renamed);
                if destination.exists() {
                    push_warning(
                        report,
                        format!("{name} on {dotted} overwrites existing {renamed}"),
                    );
                }
                copy_file(&path, &destination)?;
                report.timesheets_copied.push(renamed);
                copied += 1;
            } else if let Some(segment) = near_miss_segment(sheet_name, &name) {
                push_warning(
                    report,
                    format!("possible match for {sheet_name} on {dotted}: {name} (segment: {segment})"),
                );
            }
        }
    }

    Ok(copied)
}

fn contains_entry_named(dir: &Path, needle: &str) -> Result<bool> {
    let mut entries = list_dirs(dir)?;
    entries.extend(list_files(dir)?);

    for entry in entries {
        if file_name_string(&entry)?.contains(needle) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Regular files anywhere under `dir`, in file-name order per directory.
fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn push_warning(report: &mut SheetReport, warning: String) {
    warn!(sheet = %report.sheet, warning = %warning, "supporting-docs warning");
    report.warnings.push(warning);
}
