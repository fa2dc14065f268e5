use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::consolidate::MIN_GAP_SECONDS;

#[derive(Parser, Debug)]
#[command(
    name = "cctv-records",
    version,
    about = "Consolidates contractor CCTV inspection records and files supporting documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record the pending job folders as a source manifest
    Inventory(InventoryArgs),
    /// Build the consolidated, deduplicated inspection workbook
    Compile(CompileArgs),
    /// Snapshot the reviewed workbook, copy dated reports and archive job folders
    Stage(StageArgs),
    /// File timesheets and dockets for every sheet of a claim workbook
    Docs(DocsArgs),
    /// Summarize the manifests under the pending root
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    /// Use an existing inventory manifest instead of rescanning the root
    #[arg(long, default_value_t = false)]
    pub reuse_inventory: bool,

    #[arg(long, default_value_t = MIN_GAP_SECONDS)]
    pub min_gap_seconds: i64,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StageArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long)]
    pub workbook_path: Option<PathBuf>,

    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    #[arg(long)]
    pub reports_dir: PathBuf,

    #[arg(long)]
    pub uploaded_root: PathBuf,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DocsArgs {
    #[arg(long)]
    pub claim_workbook: PathBuf,

    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub timesheet_root: PathBuf,

    #[arg(long, default_value = "NR")]
    pub contract: String,

    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}
