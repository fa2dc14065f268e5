use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use regex::Regex;

/// Finds the `dd/mm/yyyy` work dates written into a claim sheet.
pub(super) struct ClaimDates {
    pattern: Regex,
}

impl ClaimDates {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"\d{2}/\d{2}/\d{4}").context("failed to compile date pattern")?,
        })
    }

    pub(super) fn extract(&self, text: &str) -> Result<Vec<NaiveDate>> {
        self.pattern
            .find_iter(text)
            .map(|found| {
                NaiveDate::parse_from_str(found.as_str(), "%d/%m/%Y")
                    .with_context(|| format!("invalid work date {:?}", found.as_str()))
            })
            .collect()
    }
}

/// Folder-name form of a work date, as used by the scanned timesheet tree.
pub(super) fn dotted_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub(super) fn job_folder_name(sheet_name: &str, address: &str, suburb: &str) -> String {
    format!("{sheet_name} {address}, {suburb}")
}

/// Claim-pack name for a scanned timesheet or traffic-control docket.
///
/// Dockets (`TC` and `DKT` both present) become `TC DKT <number>`; anything
/// else becomes `<sheet> JOBSHEET <second-last word> <last word>`.
pub(super) fn timesheet_name(file_name: &str, sheet_name: &str) -> Result<String> {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let renamed = if file_name.contains("DKT") && file_name.contains("TC") {
        let Some(number) = stem.split_whitespace().nth(1) else {
            bail!("docket filename has no number: {file_name}");
        };
        format!("TC DKT {}", number.trim_matches('-'))
    } else {
        let mut words = stem.rsplitn(3, ' ');
        let (Some(last), Some(second_last)) = (words.next(), words.next()) else {
            bail!("timesheet filename has too few words: {file_name}");
        };
        format!("{sheet_name} JOBSHEET {second_last} {last}")
    };

    Ok(format!("{renamed}{extension}"))
}
