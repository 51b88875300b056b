//! Literal constants for the index format and ranking math.
//!
//! No runtime-named parameters and no environment variables — every tunable
//! here is a compile-time constant, matching the "small struct of literal
//! constants" design note. These are declared as module-level `pub const`
//! rather than fields of a struct instance: there is nothing to construct or
//! override at runtime, so a struct would only add a layer of indirection
//! nobody reads through.

/// Term-ids per barrel shard. Barrel `b` covers `[b * WORDS_PER_BARREL, (b+1) * WORDS_PER_BARREL)`.
pub const WORDS_PER_BARREL: u32 = 50_000;

/// BM25 term-frequency saturation parameter.
pub const K1: f64 = 1.5;

/// BM25 document-length normalization parameter.
pub const B: f64 = 0.75;

/// Linear weight applied to the PageRank prior when fused with BM25.
pub const PAGERANK_WEIGHT: f64 = 50.0;

/// PageRank damping factor.
pub const DAMPING: f64 = 0.85;

/// PageRank iteration cap.
pub const MAX_ITER: usize = 50;

/// PageRank convergence threshold on total absolute delta.
pub const TOL: f64 = 1e-9;

/// Minimum global term frequency for inclusion in the autocomplete trie.
pub const TRIE_FREQ_FLOOR: i32 = 50;

/// Maximum query results returned.
pub const MAX_RESULTS: usize = 20;

/// Maximum suggestions returned by autocomplete.
pub const MAX_SUGGESTIONS: usize = 5;
