//! Card catalog and free-text matching.
//!
//! The catalog is loaded once at startup and never mutated. Assistant replies
//! mention cards in natural language ("현대카드 Summit", "the Deep Dream card"),
//! so [`Catalog::resolve`] maps such text back to a stable entry id:
//!
//! 1. Normalize: lowercase, keep only ASCII letters/digits and Hangul syllables.
//! 2. Exact pass: the normalized query equals the name or any alias.
//! 3. Substring pass: query contains a candidate, or a candidate contains the query.
//!
//! Within each pass the first entry in catalog order wins.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Stable identifier of a card offering (e.g. `"h-10"`).
pub type EntityId = String;

const BUILTIN_CARDS: &str = include_str!("../data/cards.json");

/// One card offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntityId,

    /// Issuer shown on the card face.
    #[serde(default)]
    pub company: String,

    /// Display name.
    pub name: String,

    /// Alternate names, in priority order.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company: String::new(),
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Read-only, ordered collection of catalog entries.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    /// Normalized name + aliases per entry, parallel to `entries`.
    keys: Vec<Vec<String>>,
}

impl Catalog {
    /// Build a catalog, rejecting empty input and duplicate ids.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }

        let keys = entries
            .iter()
            .map(|entry| {
                std::iter::once(&entry.name)
                    .chain(entry.aliases.iter())
                    .map(|s| normalize(s))
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .collect();

        Ok(Self { entries, keys })
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CARDS).expect("embedded cards.json must be a valid catalog")
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(entries)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), entries = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Slot of `id` in catalog order (the carousel lays cards out this way).
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Map free text to an entry id. Pure function of (query, catalog).
    pub fn resolve(&self, free_text: &str) -> Option<&str> {
        let query = normalize(free_text);
        if query.is_empty() {
            return None;
        }

        let exact = self
            .keys
            .iter()
            .position(|keys| keys.iter().any(|k| *k == query));

        // No special guard for short aliases: catalog order is the only tie-break.
        let found = exact.or_else(|| {
            self.keys.iter().position(|keys| {
                keys.iter()
                    .any(|k| query.contains(k.as_str()) || k.contains(query.as_str()))
            })
        });

        found.map(|i| self.entries[i].id.as_str())
    }

    /// First candidate (in the given order) that resolves; later ones are not consulted.
    pub fn resolve_first<I, S>(&self, candidates: I) -> Option<&str>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates
            .into_iter()
            .find_map(|c| self.resolve(c.as_ref()))
    }
}

/// Lowercase and strip everything except ASCII alphanumerics and Hangul syllables.
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || ('가'..='힣').contains(c))
        .collect()
}
