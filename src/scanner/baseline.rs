//! Baseline files: secrets a repository has already accepted
//!
//! ```json
//! { "results": { "config.py": [ { "type": "Secret Keyword", "hashed_secret": "…", "line_number": 3 } ] } }
//! ```
//!
//! Extra fields (scanner version, audit flags, ...) are ignored on read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Finding, Findings};

use super::ScanError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct BaselineFile {
    #[serde(default)]
    results: BTreeMap<String, Vec<BaselineEntry>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BaselineEntry {
    #[serde(rename = "type")]
    secret_type: String,
    hashed_secret: String,
    #[serde(default)]
    line_number: usize,
}

/// Parse baseline file content into a comparable collection
pub fn decode(raw: &str) -> Result<Findings, ScanError> {
    let file: BaselineFile = serde_json::from_str(raw).map_err(ScanError::Baseline)?;

    Ok(file
        .results
        .into_iter()
        .flat_map(|(filename, entries)| {
            entries.into_iter().map(move |entry| {
                Finding::new(
                    entry.secret_type,
                    filename.clone(),
                    entry.hashed_secret,
                    entry.line_number,
                )
            })
        })
        .collect())
}

/// Render findings as a baseline file
pub fn encode(findings: &Findings) -> Result<String, ScanError> {
    let mut file = BaselineFile::default();
    for finding in findings.iter() {
        file.results
            .entry(finding.filename.clone())
            .or_default()
            .push(BaselineEntry {
                secret_type: finding.secret_type.clone(),
                hashed_secret: finding.hashed_secret.clone(),
                line_number: finding.line_number,
            });
    }
    serde_json::to_string_pretty(&file).map_err(ScanError::Baseline)
}
