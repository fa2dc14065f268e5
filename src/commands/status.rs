use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::{compile, inventory};
use crate::model::{CompileRunManifest, SourceInventoryManifest, StageRunManifest};
use crate::util::{file_name_string, list_files, read_json};
use crate::workbook;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.root.join("manifests");
    let inventory_path = inventory::default_manifest_path(&args.root);
    let output_path = compile::default_output_path(&args.root);

    info!(root = %args.root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: SourceInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            job_count = inventory.job_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_run_manifest(&manifest_dir, "compile_run_")? {
        Some(path) => {
            let compile: CompileRunManifest = read_json(&path)?;
            info!(
                run_id = %compile.run_id,
                status = %compile.status,
                updated_at = %compile.updated_at,
                work_orders = compile.counts.work_orders,
                rows_written = compile.counts.rows_written,
                duplicates_suppressed = compile.counts.duplicates_suppressed,
                warnings = compile.warnings.len(),
                "latest compile run"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no compile run recorded"),
    }

    match latest_run_manifest(&manifest_dir, "stage_run_")? {
        Some(path) => {
            let stage: StageRunManifest = read_json(&path)?;
            info!(
                run_id = %stage.run_id,
                updated_at = %stage.updated_at,
                dry_run = stage.dry_run,
                reports_copied = stage.counts.reports_copied,
                jobs_archived = stage.counts.jobs_archived,
                warnings = stage.warnings.len(),
                "latest stage run"
            );
        }
        None => info!("no stage run recorded"),
    }

    if output_path.exists() {
        match workbook::read_consolidated(&output_path) {
            Ok(table) => info!(
                path = %output_path.display(),
                rows = table.len(),
                work_orders = table.work_order_count(),
                "consolidated workbook status"
            ),
            Err(err) => warn!(
                path = %output_path.display(),
                error = %format!("{err:#}"),
                "consolidated workbook unreadable"
            ),
        }
    } else {
        warn!(path = %output_path.display(), "consolidated workbook missing");
    }

    Ok(())
}

/// Run manifests carry a compact UTC timestamp, so the greatest name is the
/// most recent run.
fn latest_run_manifest(manifest_dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<(String, PathBuf)> = None;
    for path in list_files(manifest_dir)? {
        let name = file_name_string(&path)?;
        if !name.starts_with(prefix) || !name.ends_with(".json") {
            continue;
        }
        if latest.as_ref().is_none_or(|(best, _)| name > *best) {
            latest = Some((name, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn latest_run_manifest_picks_newest_matching_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in [
            "compile_run_20240305T010000Z.json",
            "compile_run_20240306T010000Z.json",
            "stage_run_20240307T010000Z.json",
            "source_inventory.json",
        ] {
            fs::write(dir.path().join(name), b"{}").expect("write");
        }

        let latest = latest_run_manifest(dir.path(), "compile_run_").expect("scan");
        assert_eq!(
            latest,
            Some(dir.path().join("compile_run_20240306T010000Z.json"))
        );
        assert_eq!(
            latest_run_manifest(&dir.path().join("missing"), "stage_run_").expect("scan"),
            None
        );
    }
}
