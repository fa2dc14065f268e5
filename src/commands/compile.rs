use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::CompileArgs;
use crate::commands::inventory;
use crate::consolidate::{
    ConsolidatedTable, JobSource, WorkOrderPattern, aggregate, remove_close_inspections,
};
use crate::model::{
    CompileCounts, CompilePaths, CompileRunManifest, JobEntry, SourceInventoryManifest,
};
use crate::util::{
    ensure_directory, now_utc_string, read_json, sha256_file, utc_compact_string,
    write_json_pretty,
};
use crate::workbook;

pub const OUTPUT_FILE_NAME: &str = "compiled_data.xlsx";

pub fn default_output_path(root: &Path) -> PathBuf {
    root.join(OUTPUT_FILE_NAME)
}

pub struct CompileOutcome {
    pub table: ConsolidatedTable,
    pub counts: CompileCounts,
    pub warnings: Vec<String>,
}

pub fn run(args: CompileArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("compile-{}", utc_compact_string(started_ts));

    if args.min_gap_seconds < 0 {
        bail!("--min-gap-seconds must not be negative");
    }

    let root = args.root.clone();
    let manifest_dir = root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&root));
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("compile_run_{}.json", utc_compact_string(started_ts)))
    });
    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| default_output_path(&root));

    info!(root = %root.display(), run_id = %run_id, "starting compile");

    let inventory = load_or_refresh_inventory(&root, &inventory_manifest_path, args.reuse_inventory)?;
    let mut outcome = compile_inventory(&inventory, args.min_gap_seconds)?;

    if args.dry_run {
        info!(
            rows = outcome.counts.rows_written,
            suppressed = outcome.counts.duplicates_suppressed,
            "compile dry-run complete"
        );
    } else {
        workbook::write_consolidated(&output_path, &outcome.table)?;
        info!(path = %output_path.display(), rows = outcome.table.len(), "wrote consolidated workbook");
    }

    if args.reuse_inventory {
        outcome.warnings.extend(changed_spreadsheets(&inventory.jobs));
    }

    let manifest = CompileRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        min_gap_seconds: args.min_gap_seconds,
        dry_run: args.dry_run,
        paths: CompilePaths {
            root: root.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            output_path: output_path.display().to_string(),
        },
        counts: outcome.counts,
        source_hashes: inventory.jobs,
        warnings: outcome.warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote compile run manifest");
    info!(
        work_orders = manifest.counts.work_orders,
        rows = manifest.counts.rows_written,
        "compile completed"
    );

    Ok(())
}

/// Reads every job spreadsheet, merges, deduplicates and returns the table
/// in ascending (work order, date, time) order. Nothing is written.
pub fn compile_inventory(
    inventory: &SourceInventoryManifest,
    min_gap_seconds: i64,
) -> Result<CompileOutcome> {
    let pattern = WorkOrderPattern::new().context("failed to compile work order patterns")?;

    let mut jobs = Vec::with_capacity(inventory.jobs.len());
    for entry in &inventory.jobs {
        let spreadsheet = Path::new(&entry.spreadsheet);
        let sheet = workbook::read_source_sheet(spreadsheet)
            .with_context(|| format!("failed to load spreadsheet for job {}", entry.name))?;

        info!(
            job = %entry.name,
            rows = sheet.rows.len(),
            columns = sheet.width(),
            "loaded job spreadsheet"
        );

        jobs.push(JobSource {
            name: entry.name.clone(),
            docu_dir: PathBuf::from(&entry.docu_dir),
            video_dir: PathBuf::from(&entry.video_dir),
            report_pdf: entry.report_pdf.as_ref().map(PathBuf::from),
            sheet,
        });
    }

    let aggregated = aggregate(&jobs, &pattern)?;
    for warning in &aggregated.warnings {
        warn!(warning = %warning, "aggregation warning");
    }

    let mut table = aggregated.table;
    table.sort_ascending();
    let aggregated_rows = table.len();

    let mut table = remove_close_inspections(table, min_gap_seconds);
    table.sort_ascending();
    if table.is_empty() {
        warn!("no inspection rows left to write");
    }

    let counts = CompileCounts {
        job_count: jobs.len(),
        source_rows: aggregated.source_rows,
        blank_rows_dropped: aggregated.blank_rows_dropped,
        aggregated_rows,
        work_orders: table.work_order_count(),
        duplicates_suppressed: aggregated_rows - table.len(),
        rows_written: table.len(),
    };

    info!(
        aggregated = counts.aggregated_rows,
        kept = counts.rows_written,
        suppressed = counts.duplicates_suppressed,
        blank_dropped = counts.blank_rows_dropped,
        "deduplicated inspections"
    );

    Ok(CompileOutcome {
        table,
        counts,
        warnings: aggregated.warnings,
    })
}

fn load_or_refresh_inventory(
    root: &Path,
    inventory_manifest_path: &Path,
    reuse_inventory: bool,
) -> Result<SourceInventoryManifest> {
    if !reuse_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(root)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            job_count = manifest.job_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let manifest: SourceInventoryManifest = read_json(inventory_manifest_path)?;
    if manifest.manifest_version != inventory::MANIFEST_VERSION {
        bail!(
            "unsupported inventory manifest version {} in {}",
            manifest.manifest_version,
            inventory_manifest_path.display()
        );
    }

    info!(
        path = %inventory_manifest_path.display(),
        job_count = manifest.job_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

/// Jobs whose spreadsheet no longer matches the hash recorded at inventory.
fn changed_spreadsheets(jobs: &[JobEntry]) -> Vec<String> {
    let mut warnings = Vec::new();
    for job in jobs {
        match sha256_file(Path::new(&job.spreadsheet)) {
            Ok(hash) if hash == job.spreadsheet_sha256 => {}
            Ok(_) => {
                let warning = format!("{}: spreadsheet changed since inventory", job.name);
                warn!(warning = %warning, "stale inventory");
                warnings.push(warning);
            }
            Err(err) => {
                let warning = format!("{}: could not hash spreadsheet: {err:#}", job.name);
                warn!(warning = %warning, "stale inventory");
                warnings.push(warning);
            }
        }
    }
    warnings
}
