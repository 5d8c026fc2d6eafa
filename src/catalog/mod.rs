//! Product catalog — fuzzy name lookup against the known product list.
//!
//! The index is built wholesale from the catalog feed and replaced
//! atomically on refresh; lookups always observe one consistent snapshot.

pub mod feed;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

pub use feed::{CatalogFeed, HttpCatalogFeed};

/// Fraction of query characters allowed to differ on a fuzzy match.
const FUZZY_TOLERANCE: f64 = 0.2;

/// One product in the catalog. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub zh_name: String,
    pub en_name: String,
    #[serde(default)]
    pub tag: String,
    pub price: f64,
}

/// A searchable index over the catalog's name and tag fields.
///
/// Indexed terms keep their entry's insertion position, so ranking is
/// deterministic: lower edit distance wins, and among equal distances the
/// earlier entry wins.
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    terms: Vec<IndexedTerm>,
}

struct IndexedTerm {
    chars: Vec<char>,
    entry: usize,
}

impl CatalogIndex {
    /// Build an index over the `zh_name`, `en_name`, and `tag` fields of
    /// every entry.
    pub fn build(entries: Vec<CatalogEntry>) -> Self {
        let mut terms = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            for field in [&entry.zh_name, &entry.en_name, &entry.tag] {
                index_field(field, idx, &mut terms);
            }
        }
        Self { entries, terms }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fuzzy-match `term` against the indexed fields and return the
    /// top-ranked entry.
    ///
    /// Up to ~20% of the query's characters may differ (edit distance,
    /// rounded to the nearest whole edit). Returns `None` when no candidate
    /// clears the threshold — a normal outcome for mis-transcribed or
    /// unknown product names, not a fault.
    pub fn lookup(&self, term: &str) -> Option<&CatalogEntry> {
        let query: Vec<char> = term.trim().to_lowercase().chars().collect();
        if query.is_empty() {
            return None;
        }
        let max_edits = (query.len() as f64 * FUZZY_TOLERANCE).round() as usize;

        let mut best: Option<(usize, usize)> = None; // (distance, entry idx)
        for indexed in &self.terms {
            if indexed.chars.len().abs_diff(query.len()) > max_edits {
                continue;
            }
            let dist = levenshtein(&query, &indexed.chars);
            if dist > max_edits {
                continue;
            }
            // Strict < keeps the first-indexed entry on distance ties.
            if best.is_none_or(|(bd, _)| dist < bd) {
                best = Some((dist, indexed.entry));
                if dist == 0 {
                    break;
                }
            }
        }

        best.map(|(_, idx)| &self.entries[idx])
    }
}

/// Index a field: the whole lowercased value, plus each whitespace-separated
/// token when there are several (tags are often multi-word).
fn index_field(field: &str, entry: usize, terms: &mut Vec<IndexedTerm>) {
    let whole = field.trim().to_lowercase();
    if whole.is_empty() {
        return;
    }
    terms.push(IndexedTerm {
        chars: whole.chars().collect(),
        entry,
    });
    let tokens: Vec<&str> = whole.split_whitespace().collect();
    if tokens.len() > 1 {
        for token in tokens {
            terms.push(IndexedTerm {
                chars: token.chars().collect(),
                entry,
            });
        }
    }
}

/// Character-level Levenshtein edit distance (two-row DP).
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

// ── Shared handle ───────────────────────────────────────────────────

/// Shared, atomically replaceable catalog index.
///
/// Lookups clone out an `Arc` snapshot, so a refresh never tears an
/// in-progress lookup: callers see either the old index or the new one.
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<CatalogIndex>>>,
}

impl SharedCatalog {
    pub fn new(index: CatalogIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Current index snapshot.
    pub async fn snapshot(&self) -> Arc<CatalogIndex> {
        self.inner.read().await.clone()
    }

    /// Replace the index wholesale.
    pub async fn replace(&self, index: CatalogIndex) {
        let count = index.len();
        *self.inner.write().await = Arc::new(index);
        info!(products = count, "Catalog index replaced");
    }
}
