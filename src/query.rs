//! Conjunctive query evaluation: tokenize, intersect, score, rank.
//!
//! Every query term must resolve through the closed vocabulary and produce
//! a non-empty posting list for a document to match at all — this is a pure
//! AND engine, there is no OR/NOT operator and no query-time stemming.
//!
//! Term order for intersection is chosen by ascending posting-list size
//! (the rarest term first), and each subsequent list is merged in with a
//! two-pointer walk rather than a hash-based intersection: posting lists are
//! already sorted ascending by `doc_id` (see `inverted.rs`), so this is
//! linear in the sum of list lengths with no extra allocation per step.

use std::path::Path;

use crate::barrel;
use crate::config::{B, K1, MAX_RESULTS, PAGERANK_WEIGHT};
use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::metadata;
use crate::pagerank;
use crate::tokenizer::tokenize;
use crate::types::{MetadataRecord, Posting, SearchHit};
use crate::{forward, types::DocId};

/// Everything a query needs that isn't per-query: loaded once at startup
/// and swapped wholesale by the hot-swap coordinator.
pub struct QueryIndex {
    pub lexicon: Lexicon,
    pub doc_lengths: Vec<u32>,
    pub avgdl: f64,
    pub barrel_dir: std::path::PathBuf,
    pub words_per_barrel: u32,
    pub pagerank: Vec<f64>,
    pub metadata: Vec<MetadataRecord>,
}

impl QueryIndex {
    pub fn load(
        lexicon_path: &Path,
        lengths_path: &Path,
        pagerank_path: &Path,
        metadata_path: &Path,
        barrel_dir: &Path,
        words_per_barrel: u32,
    ) -> Result<Self> {
        barrel::check_barrel_dir(barrel_dir)?;
        let lexicon = Lexicon::load(lexicon_path)?;
        let doc_lengths = forward::read_doc_lengths(lengths_path)?;
        let avgdl = average(&doc_lengths);
        let pagerank = pagerank::load(pagerank_path, doc_lengths.len())?.unwrap_or_else(|| {
            vec![0.0; doc_lengths.len()]
        });
        let metadata = metadata::load(metadata_path)?;

        Ok(QueryIndex {
            lexicon,
            doc_lengths,
            avgdl,
            barrel_dir: barrel_dir.to_path_buf(),
            words_per_barrel,
            pagerank,
            metadata,
        })
    }

    pub fn num_docs(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Runs the conjunctive query, fusing BM25 with the PageRank prior, and
    /// optionally filtering by a category substring and sorting by date
    /// instead of score. Always truncates to `MAX_RESULTS`.
    pub fn search(
        &self,
        query_text: &str,
        category_filter: Option<&str>,
        sort_by_date: bool,
    ) -> Vec<SearchHit> {
        let mut candidates = self.matching_docs(query_text);

        if let Some(category) = category_filter {
            candidates.retain(|hit| {
                self.metadata
                    .get(hit.doc_id as usize)
                    .is_some_and(|m| m.category.contains(category))
            });
        }

        if sort_by_date {
            candidates.sort_by(|a, b| {
                let da = self.metadata.get(a.doc_id as usize).map(|m| m.date.as_str()).unwrap_or("");
                let db = self.metadata.get(b.doc_id as usize).map(|m| m.date.as_str()).unwrap_or("");
                db.cmp(da).then(b.score.total_cmp(&a.score))
            });
        } else {
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        }

        candidates.truncate(MAX_RESULTS);
        candidates
    }

    fn matching_docs(&self, query_text: &str) -> Vec<SearchHit> {
        let mut term_ids: Vec<u32> = Vec::new();
        for token in tokenize(query_text) {
            let Some(term_id) = self.lexicon.lookup(&token) else {
                // Any unresolved term empties the whole conjunction.
                return Vec::new();
            };
            if !term_ids.contains(&term_id.0) {
                term_ids.push(term_id.0);
            }
        }
        if term_ids.is_empty() {
            return Vec::new();
        }

        let mut lists: Vec<Vec<Posting>> = term_ids
            .iter()
            .map(|&t| barrel::fetch_postings(&self.barrel_dir, t, self.words_per_barrel))
            .collect();
        if lists.iter().any(Vec::is_empty) {
            return Vec::new();
        }
        lists.sort_by_key(Vec::len);

        let mut intersection = lists[0].clone();
        for list in &lists[1..] {
            intersection = intersect(&intersection, list);
            if intersection.is_empty() {
                return Vec::new();
            }
        }

        intersection
            .into_iter()
            .map(|first_term_posting| {
                let doc_id = first_term_posting.doc_id;
                let score = self.score(doc_id, &lists);
                SearchHit { doc_id, score }
            })
            .collect()
    }

    /// BM25, summed per query term using that term's own full posting list
    /// (not just the intersection-bearing one) so term frequency is exact,
    /// plus the linear PageRank prior.
    fn score(&self, doc_id: u32, lists: &[Vec<Posting>]) -> f64 {
        // A missing doc-id and a genuine zero-length document both fall back
        // to avgdl, so length normalization acts as a no-op rather than
        // zeroing out the B term.
        let doc_len = self
            .doc_lengths
            .get(doc_id as usize)
            .copied()
            .filter(|&l| l != 0)
            .map_or(self.avgdl, f64::from);
        let n = self.num_docs() as f64;

        let mut bm25 = 0.0;
        for list in lists {
            let Some(posting) = list.iter().find(|p| p.doc_id == doc_id) else {
                continue;
            };
            let df = list.len() as f64;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            let f = f64::from(posting.freq);
            let denom = f + K1 * (1.0 - B + B * doc_len / self.avgdl.max(1.0));
            bm25 += idf * (f * (K1 + 1.0)) / denom;
        }

        let pr = self.pagerank.get(doc_id as usize).copied().unwrap_or(0.0);
        bm25 + PAGERANK_WEIGHT * pr
    }

    pub fn metadata_for(&self, doc_id: DocId) -> Option<&MetadataRecord> {
        self.metadata.get(doc_id.as_usize())
    }
}

fn average(lengths: &[u32]) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    let total: u64 = lengths.iter().map(|&l| u64::from(l)).sum();
    total as f64 / lengths.len() as f64
}

/// Two-pointer intersection of posting lists already sorted ascending by
/// `doc_id`. Keeps postings from `a` (whichever list drives the merge) so
/// callers can chain repeated calls without losing frequency data.
fn intersect(a: &[Posting], b: &[Posting]) -> Vec<Posting> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].doc_id.cmp(&b[j].doc_id) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
