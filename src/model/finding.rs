use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// A detected secret, tagged with where it was found
///
/// The raw secret is never kept, only its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub secret_type: String,
    pub filename: String,
    pub hashed_secret: String,
    pub line_number: usize,
    /// Checkpoint the diff was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// Identity of the repository the finding came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_filename: Option<String>,
}

/// What makes two findings "the same secret": same file, same detector, same
/// secret. Line numbers drift between commits and are deliberately left out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindingKey {
    pub filename: String,
    pub secret_type: String,
    pub hashed_secret: String,
}

impl Finding {
    pub fn new(
        secret_type: impl Into<String>,
        filename: impl Into<String>,
        hashed_secret: impl Into<String>,
        line_number: usize,
    ) -> Self {
        Self {
            secret_type: secret_type.into(),
            filename: filename.into(),
            hashed_secret: hashed_secret.into(),
            line_number,
            commit: None,
            repo: None,
            baseline_filename: None,
        }
    }

    pub fn key(&self) -> FindingKey {
        FindingKey {
            filename: self.filename.clone(),
            secret_type: self.secret_type.clone(),
            hashed_secret: self.hashed_secret.clone(),
        }
    }
}

/// Collection of findings, de-duplicated by [`FindingKey`]
///
/// Keeps insertion order; `keys` indexes `items`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    items: Vec<Finding>,
    keys: FxHashSet<FindingKey>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finding; returns false if the same secret is already present
    pub fn insert(&mut self, finding: Finding) -> bool {
        if !self.keys.insert(finding.key()) {
            return false;
        }
        self.items.push(finding);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.items.iter()
    }

    pub fn contains_key(&self, key: &FindingKey) -> bool {
        self.keys.contains(key)
    }

    /// Findings not matched by any entry of `baseline`
    pub fn difference(self, baseline: &Findings) -> Findings {
        let Findings { items, mut keys } = self;
        keys.retain(|key| !baseline.contains_key(key));
        Findings {
            items: items
                .into_iter()
                .filter(|finding| keys.contains(&finding.key()))
                .collect(),
            keys,
        }
    }
}

impl FromIterator<Finding> for Findings {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        let mut findings = Findings::new();
        for finding in iter {
            findings.insert(finding);
        }
        findings
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
