// Copyright 2025-present Scholardex Contributors
// SPDX-License-Identifier: Apache-2.0

//! The building blocks of an index generation.
//!
//! # Invariants
//!
//! - **Lexicon**: ids are dense over `[0, W)`, assigned in insertion order;
//!   the mapping is a bijection.
//! - **Posting list**: sorted strictly ascending by `doc_id`. Every later
//!   stage (barrel writer, query engine) depends on this for two-pointer
//!   intersection and binary search — see `inverted.rs` and `query.rs`.
//! - **Forward-index record**: `(term_id, freq)` pairs ordered by
//!   `term_id` ascending.

/// Dense 32-bit term identifier, stable for the lifetime of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TermId(pub u32);

impl TermId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TermId {
    fn from(id: u32) -> Self {
        TermId(id)
    }
}

/// Dense 32-bit document identifier, stable for the lifetime of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct DocId(pub u32);

impl DocId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// `(doc-id, freq)` pair; element of a posting list. `freq >= 1` always
/// holds for postings emitted by this crate's builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: u32,
    pub freq: u32,
}

/// A term's full posting list, sorted ascending by `doc_id`.
pub type PostingList = Vec<Posting>;

/// One forward-index record: everything known about a single document's
/// token counts, keyed by dense `doc_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRecord {
    pub doc_id: u32,
    pub total_tokens: u32,
    /// `(term_id, freq)` pairs, ordered by `term_id` ascending.
    pub terms: Vec<(u32, u32)>,
}

/// A single scholarly-article metadata record, line-indexed by doc-id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pub external_id: String,
    pub title: String,
    pub authors: String,
    pub category: String,
    pub date: String,
}

/// A scored search result, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
}
