//! Secret detectors
//!
//! Each detector looks at one added line and reports the secret values it
//! finds there. Values are hashed by the engine before they leave the scan.

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::model::{PluginConfig, PluginKind};

use super::ScanError;

/// A single detection plugin
pub trait Detector: Send + Sync {
    /// Label recorded on findings, e.g. "AWS Access Key"
    fn secret_type(&self) -> &'static str;

    /// Secret values present in `line`
    fn analyze_line<'a>(&self, line: &'a str) -> Vec<&'a str>;
}

/// Detectors built from a [`PluginConfig`]
pub struct DetectorSet {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorSet {
    pub fn from_config(config: &PluginConfig) -> Result<Self, ScanError> {
        let mut detectors: Vec<Box<dyn Detector>> = Vec::new();

        for (kind, limit) in config.iter() {
            let detector: Box<dyn Detector> = match kind {
                PluginKind::HexHighEntropyString => Box::new(HighEntropyString::hex(
                    limit.unwrap_or(crate::model::DEFAULT_HEX_LIMIT),
                )?),
                PluginKind::Base64HighEntropyString => Box::new(HighEntropyString::base64(
                    limit.unwrap_or(crate::model::DEFAULT_BASE64_LIMIT),
                )?),
                PluginKind::PrivateKeyDetector => Box::new(RegexDetector::new(
                    "Private Key",
                    r"BEGIN[ A-Z0-9_-]{0,100}PRIVATE KEY",
                    None,
                )?),
                PluginKind::AwsKeyDetector => Box::new(RegexDetector::new(
                    "AWS Access Key",
                    r"\b(?:A3T[A-Z0-9]|AKIA|AGPA|AIDA|AROA|AIPA|ANPA|ANVA|ASIA)[A-Z0-9]{16}\b",
                    None,
                )?),
                PluginKind::BasicAuthDetector => Box::new(RegexDetector::new(
                    "Basic Auth Credentials",
                    r"://[^:/?#\[\]@!$&'()*+,;=\s]+:([^:/?#\[\]@!$&'()*+,;=\s]+)@",
                    Some(1),
                )?),
                PluginKind::KeywordDetector => Box::new(RegexDetector::new(
                    "Secret Keyword",
                    r#"(?i)(?:api_?key|auth_?key|service_?key|account_?key|db_?key|database_?key|priv_?key|private_?key|client_?key|db_?pass|database_?pass|key_?pass|password|passwd|pwd|secret|token)\w*["']?\s*(?::|=|:=|=>)\s*["']([^"'\s]{4,})["']"#,
                    Some(1),
                )?),
            };
            detectors.push(detector);
        }

        Ok(Self { detectors })
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Detector> {
        self.detectors.iter().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

/// Pattern match, optionally reporting a capture group instead of the whole match
struct RegexDetector {
    secret_type: &'static str,
    re: Regex,
    group: Option<usize>,
}

impl RegexDetector {
    fn new(secret_type: &'static str, pattern: &str, group: Option<usize>) -> Result<Self, ScanError> {
        let re = Regex::new(pattern).map_err(|source| ScanError::InvalidPattern {
            detector: secret_type,
            source,
        })?;
        Ok(Self { secret_type, re, group })
    }
}

impl Detector for RegexDetector {
    fn secret_type(&self) -> &'static str {
        self.secret_type
    }

    fn analyze_line<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self.group {
            Some(group) => self
                .re
                .captures_iter(line)
                .filter_map(|caps| caps.get(group))
                .map(|m| m.as_str())
                .collect(),
            None => self.re.find_iter(line).map(|m| m.as_str()).collect(),
        }
    }
}

/// Quoted strings drawn from a charset whose Shannon entropy exceeds a limit
struct HighEntropyString {
    secret_type: &'static str,
    re: Regex,
    limit: f64,
    hex: bool,
}

impl HighEntropyString {
    fn hex(limit: f64) -> Result<Self, ScanError> {
        Self::new("Hex High Entropy String", r#"["']([0-9a-fA-F]+)["']"#, limit, true)
    }

    fn base64(limit: f64) -> Result<Self, ScanError> {
        Self::new(
            "Base64 High Entropy String",
            r#"["']([A-Za-z0-9+/_-]+={0,2})["']"#,
            limit,
            false,
        )
    }

    fn new(secret_type: &'static str, pattern: &str, limit: f64, hex: bool) -> Result<Self, ScanError> {
        let re = Regex::new(pattern).map_err(|source| ScanError::InvalidPattern {
            detector: secret_type,
            source,
        })?;
        Ok(Self { secret_type, re, limit, hex })
    }

    fn entropy(&self, value: &str) -> f64 {
        let mut entropy = shannon_entropy(value);
        // Long digit runs (ids, timestamps) look random but rarely are secrets
        if self.hex && value.len() > 1 && value.bytes().all(|b| b.is_ascii_digit()) {
            entropy -= 1.2 / (value.len() as f64).log2();
        }
        entropy
    }
}

impl Detector for HighEntropyString {
    fn secret_type(&self) -> &'static str {
        self.secret_type
    }

    fn analyze_line<'a>(&self, line: &'a str) -> Vec<&'a str> {
        self.re
            .captures_iter(line)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|value| self.entropy(value) > self.limit)
            .collect()
    }
}

/// Shannon entropy in bits per character
pub fn shannon_entropy(value: &str) -> f64 {
    let len = value.chars().count();
    if len == 0 {
        return 0.0;
    }

    let mut counts: FxHashMap<char, usize> = FxHashMap::default();
    for c in value.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }

    let len = len as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}
