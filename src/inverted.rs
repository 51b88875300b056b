//! Pivot from document-centric to term-centric posting lists.
//!
//! # Invariant
//!
//! Because `forward_index.bin` is emitted in ascending `doc-id` order (see
//! `forward.rs`), appending to posting list `term_id` in forward-index scan
//! order yields a list that is *already* sorted ascending by `doc-id` —
//! no separate sort pass is needed, and none is performed. Every later
//! stage (barrel writer, query engine) trusts this.
//!
//! On-disk format: `[W:u32] [len:u32, (doc-id:u32,freq:u32); len] x W`.
//!
//! An out-of-memory fallback (an external-sort BSBI variant for
//! when `W` or total postings exceed RAM) is not implemented here — see
//! DESIGN.md. This is a pure in-memory pivot.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::binio::{read_u32, write_u32};
use crate::error::{Error, Result};
use crate::forward::ForwardIndexReader;
use crate::types::Posting;

/// Builds `inverted_index.bin` from `forward_index.bin`. `vocab_size` is the
/// lexicon's term count (`W`); every term id in `[0, W)` gets an entry, even
/// if its posting list ends up empty.
pub fn build(forward_path: &Path, vocab_size: u32, out_path: &Path) -> Result<()> {
    let mut lists: Vec<Vec<Posting>> = vec![Vec::new(); vocab_size as usize];

    for record in ForwardIndexReader::open(forward_path)? {
        let record = record?;
        for (term_id, freq) in record.terms {
            if let Some(list) = lists.get_mut(term_id as usize) {
                list.push(Posting {
                    doc_id: record.doc_id,
                    freq,
                });
            }
        }
    }

    let file = File::create(out_path)?;
    let mut w = BufWriter::new(file);
    write_u32(&mut w, vocab_size)?;
    for list in &lists {
        write_u32(&mut w, list.len() as u32)?;
        for p in list {
            write_u32(&mut w, p.doc_id)?;
            write_u32(&mut w, p.freq)?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Lazy, forward-only iterator over `inverted_index.bin` yielding one
/// posting list per term-id in ascending term-id order. Used by the barrel
/// writer to consume the monolithic index in fixed-width chunks.
pub struct InvertedIndexReader<R> {
    inner: R,
    remaining: u32,
}

impl InvertedIndexReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::missing(path)
            } else {
                Error::Io(e)
            }
        })?;
        let mut inner = BufReader::new(file);
        let w = read_u32(&mut inner)?;
        Ok(InvertedIndexReader { inner, remaining: w })
    }

    pub fn vocab_size(&self) -> u32 {
        self.remaining
    }
}

impl<R: Read> Iterator for InvertedIndexReader<R> {
    type Item = Result<Vec<Posting>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.read_list())
    }
}

impl<R: Read> InvertedIndexReader<R> {
    fn read_list(&mut self) -> Result<Vec<Posting>> {
        let len = read_u32(&mut self.inner)?;
        let mut list = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let doc_id = read_u32(&mut self.inner)?;
            let freq = read_u32(&mut self.inner)?;
            list.push(Posting { doc_id, freq });
        }
        Ok(list)
    }
}

/// Loads the whole monolithic index into memory, keyed by term-id. Used by
/// tests that check barrel fidelity against a ground truth and by small
/// corpora where memory isn't a concern.
pub fn load_all(path: &Path) -> Result<Vec<Vec<Posting>>> {
    InvertedIndexReader::open(path)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ForwardRecord;
    use tempfile::tempdir;

    fn write_forward(path: &Path, records: &[ForwardRecord]) {
        let file = File::create(path).unwrap();
        let mut w = BufWriter::new(file);
        for r in records {
            write_u32(&mut w, r.doc_id).unwrap();
            write_u32(&mut w, r.total_tokens).unwrap();
            write_u32(&mut w, r.terms.len() as u32).unwrap();
            for (t, f) in &r.terms {
                write_u32(&mut w, *t).unwrap();
                write_u32(&mut w, *f).unwrap();
            }
        }
    }

    #[test]
    fn pivots_preserving_doc_id_order() {
        let dir = tempdir().unwrap();
        let forward_path = dir.path().join("forward_index.bin");
        write_forward(
            &forward_path,
            &[
                ForwardRecord {
                    doc_id: 0,
                    total_tokens: 2,
                    terms: vec![(0, 1), (2, 1)],
                },
                ForwardRecord {
                    doc_id: 1,
                    total_tokens: 2,
                    terms: vec![(0, 1), (1, 2)],
                },
                ForwardRecord {
                    doc_id: 2,
                    total_tokens: 1,
                    terms: vec![(0, 3)],
                },
            ],
        );

        let out_path = dir.path().join("inverted_index.bin");
        build(&forward_path, 3, &out_path).unwrap();

        let lists = load_all(&out_path).unwrap();
        assert_eq!(lists.len(), 3);
        assert_eq!(
            lists[0],
            vec![
                Posting { doc_id: 0, freq: 1 },
                Posting { doc_id: 1, freq: 1 },
                Posting { doc_id: 2, freq: 3 },
            ]
        );
        assert_eq!(lists[1], vec![Posting { doc_id: 1, freq: 2 }]);
        assert_eq!(lists[2], vec![Posting { doc_id: 0, freq: 1 }]);

        // posting-list order invariant: strictly ascending by doc-id
        for list in &lists {
            for w in list.windows(2) {
                assert!(w[0].doc_id < w[1].doc_id);
            }
        }
    }
}
