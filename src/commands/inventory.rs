use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::cli::InventoryArgs;
use crate::consolidate::{WorkOrderPattern, single_spreadsheet};
use crate::model::{JobEntry, SourceInventoryManifest};
use crate::util::{
    file_name_string, has_extension, list_dirs, list_files, now_utc_string, sha256_file,
    write_json_pretty,
};

pub const MANIFEST_VERSION: u32 = 1;

const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

pub fn default_manifest_path(root: &Path) -> PathBuf {
    root.join("manifests").join("source_inventory.json")
}

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.root)?;

    if args.dry_run {
        info!(
            job_count = manifest.job_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(job_count = manifest.job_count, "inventory completed");

    Ok(())
}

/// Describes every job folder under `root` that has a `misc/docu` folder.
///
/// Each docu folder must hold exactly one spreadsheet and each folder name
/// must carry a work order number; either violation stops the scan.
pub fn build_manifest(root: &Path) -> Result<SourceInventoryManifest> {
    let pattern = WorkOrderPattern::new().context("failed to compile work order patterns")?;

    let mut jobs = Vec::new();
    for job_dir in list_dirs(root)? {
        let docu_dir = job_dir.join("misc").join("docu");
        if !docu_dir.is_dir() {
            debug!(path = %job_dir.display(), "skipping folder without misc/docu");
            continue;
        }

        jobs.push(describe_job(&job_dir, &docu_dir, &pattern)?);
    }

    if jobs.is_empty() {
        bail!("no job folders with misc/docu found in {}", root.display());
    }

    Ok(SourceInventoryManifest {
        manifest_version: MANIFEST_VERSION,
        generated_at: now_utc_string(),
        source_directory: root.display().to_string(),
        job_count: jobs.len(),
        jobs,
    })
}

fn describe_job(job_dir: &Path, docu_dir: &Path, pattern: &WorkOrderPattern) -> Result<JobEntry> {
    let name = file_name_string(job_dir)?;
    let files = list_files(docu_dir)?;

    let spreadsheets: Vec<PathBuf> = files
        .iter()
        .filter(|path| has_extension(path, &SPREADSHEET_EXTENSIONS))
        .cloned()
        .collect();
    let spreadsheet = single_spreadsheet(docu_dir, &spreadsheets)?;

    let work_order = pattern.extract(&name)?;

    let pdfs: Vec<&PathBuf> = files
        .iter()
        .filter(|path| has_extension(path, &["pdf"]))
        .collect();
    if pdfs.is_empty() {
        warn!(path = %docu_dir.display(), "job has no PDF report");
    }

    Ok(JobEntry {
        work_order,
        job_dir: job_dir.display().to_string(),
        docu_dir: docu_dir.display().to_string(),
        video_dir: job_dir.join("Video").join("Sec").display().to_string(),
        spreadsheet: spreadsheet.display().to_string(),
        spreadsheet_sha256: sha256_file(spreadsheet)?,
        report_pdf: pdfs.first().map(|path| path.display().to_string()),
        pdf_count: pdfs.len(),
        name,
    })
}
