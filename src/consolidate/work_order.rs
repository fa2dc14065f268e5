use regex::Regex;

use super::error::ConsolidateError;

pub struct WorkOrderPattern {
    leading: Regex,
    tagged: Regex,
}

impl WorkOrderPattern {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            leading: Regex::new(r"^(\d{8})")?,
            tagged: Regex::new(r"(?i)WO[\s_-]{0,2}(\d{8})")?,
        })
    }

    /// Leading digits win over a `WO` tag elsewhere in the name.
    pub fn find(&self, folder_name: &str) -> Option<String> {
        self.leading
            .captures(folder_name)
            .or_else(|| self.tagged.captures(folder_name))
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    }

    pub fn extract(&self, folder_name: &str) -> Result<String, ConsolidateError> {
        self.find(folder_name)
            .ok_or_else(|| ConsolidateError::MissingWorkOrder {
                folder: folder_name.to_string(),
            })
    }
}
