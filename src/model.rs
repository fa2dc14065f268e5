use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    pub name: String,
    pub work_order: String,
    pub job_dir: String,
    pub docu_dir: String,
    pub video_dir: String,
    pub spreadsheet: String,
    pub spreadsheet_sha256: String,
    pub report_pdf: Option<String>,
    pub pdf_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub job_count: usize,
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilePaths {
    pub root: String,
    pub inventory_manifest_path: String,
    pub output_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileCounts {
    pub job_count: usize,
    pub source_rows: usize,
    pub blank_rows_dropped: usize,
    pub aggregated_rows: usize,
    pub work_orders: usize,
    pub duplicates_suppressed: usize,
    pub rows_written: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub min_gap_seconds: i64,
    pub dry_run: bool,
    pub paths: CompilePaths,
    pub counts: CompileCounts,
    pub source_hashes: Vec<JobEntry>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedReport {
    pub work_order: String,
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedJob {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageCounts {
    pub rows_read: usize,
    pub rows_without_length: usize,
    pub reports_copied: usize,
    pub jobs_archived: usize,
    pub jobs_skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub dry_run: bool,
    pub workbook_path: String,
    pub snapshot_path: Option<String>,
    pub counts: StageCounts,
    pub reports: Vec<StagedReport>,
    pub archived: Vec<ArchivedJob>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetReport {
    pub sheet: String,
    pub folder: Option<String>,
    pub dates: Vec<String>,
    pub timesheets_copied: Vec<String>,
    pub reports_copied: Vec<String>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub claim_workbook: String,
    pub output_dir: String,
    pub workers: usize,
    pub sheet_count: usize,
    pub failed_sheets: usize,
    pub sheets: Vec<SheetReport>,
}
