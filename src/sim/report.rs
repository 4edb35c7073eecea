use std::collections::HashMap;
use std::ops::Index;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::detectors::DetectorReport;

/// Detector results keyed by detector name.
///
/// Inserting under an existing name replaces the earlier entry.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Report {
    entries: HashMap<String, DetectorReport>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, report: DetectorReport) {
        self.entries.insert(name.to_string(), report);
    }

    pub fn get(&self, name: &str) -> Option<&DetectorReport> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, report)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DetectorReport)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize simulation report")
    }
}

impl Index<&str> for Report {
    type Output = DetectorReport;

    fn index(&self, name: &str) -> &DetectorReport {
        &self.entries[name]
    }
}
