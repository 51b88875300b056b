//! Bidirectional `term <-> term-id` map.
//!
//! # Invariants
//!
//! - Ids are dense over `[0, W)`.
//! - `inverse[lookup(term).unwrap()] == term` for every indexed term
//!   (a bijection).
//! - File order matches id order; the first term encountered during
//!   construction gets id 0.
//!
//! On-disk format: `[W:u32] [len:u32, bytes; len] x W`.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::binio::{read_string, read_u32, write_string, write_u32};
use crate::error::{Error, Result};
use crate::types::TermId;

/// Maximum length accepted for a single term when reading a lexicon file.
/// Guards against a corrupt length field forcing a huge allocation.
const MAX_TERM_LEN: u32 = 4096;

#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    by_term: HashMap<String, TermId>,
    by_id: Vec<String>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms assigned so far.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Builder-only: returns the existing id for `term`, or assigns the next
    /// dense id and appends `term` to the inverse table.
    pub fn get_or_assign(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.by_term.get(term) {
            return id;
        }
        let id = TermId(self.by_id.len() as u32);
        self.by_id.push(term.to_string());
        self.by_term.insert(term.to_string(), id);
        id
    }

    /// Lookup-only: used by the forward indexer and the query engine. The
    /// post-lexicon vocabulary is closed — callers skip tokens that miss.
    pub fn lookup(&self, term: &str) -> Option<TermId> {
        self.by_term.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.by_id.get(id.as_usize()).map(String::as_str)
    }

    pub fn terms(&self) -> impl Iterator<Item = (TermId, &str)> {
        self.by_id
            .iter()
            .enumerate()
            .map(|(i, t)| (TermId(i as u32), t.as_str()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::missing(path)
            } else {
                Error::Io(e)
            }
        })?;
        let mut r = BufReader::new(file);
        let w = read_u32(&mut r)?;
        let mut by_id = Vec::with_capacity(w as usize);
        let mut by_term = HashMap::with_capacity(w as usize);
        for i in 0..w {
            let word = read_string(&mut r, MAX_TERM_LEN)?;
            by_term.insert(word.clone(), TermId(i));
            by_id.push(word);
        }
        Ok(Lexicon { by_term, by_id })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        write_u32(&mut w, self.by_id.len() as u32)?;
        for word in &self.by_id {
            write_string(&mut w, word)?;
        }
        w.flush()?;
        Ok(())
    }

    /// Live add-document path: open an existing lexicon read/write, append
    /// any terms from `new_terms` not already present, then rewrite only
    /// the header count.
    ///
    /// If the process crashes between the term-body append and the header
    /// rewrite, the trailing bytes are orphaned: a reader stops at the
    /// count recorded in the header, so it never sees the half-written
    /// tail. A full rebuild is what reclaims that dead space — there is no
    /// write-ahead log here.
    pub fn append(path: &Path, new_terms: &[String]) -> Result<Vec<TermId>> {
        let mut lexicon = Self::load(path)?;
        let mut assigned = Vec::with_capacity(new_terms.len());
        let mut fresh = Vec::new();

        for term in new_terms {
            if let Some(id) = lexicon.lookup(term) {
                assigned.push(id);
                continue;
            }
            let id = lexicon.get_or_assign(term);
            assigned.push(id);
            fresh.push(term.clone());
        }

        if fresh.is_empty() {
            return Ok(assigned);
        }

        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        file.seek(SeekFrom::End(0))?;
        for term in &fresh {
            write_string(&mut file, term)?;
        }
        file.seek(SeekFrom::Start(0))?;
        write_u32(&mut file, lexicon.len() as u32)?;
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dense_bijective_ids() {
        let mut lex = Lexicon::new();
        let ids: Vec<_> = ["alpha", "beta", "gamma", "alpha"]
            .iter()
            .map(|t| lex.get_or_assign(t))
            .collect();
        assert_eq!(ids[0], ids[3]);
        assert_eq!(lex.len(), 3);
        for i in 0..lex.len() as u32 {
            let term = lex.term(TermId(i)).unwrap();
            assert_eq!(lex.lookup(term), Some(TermId(i)));
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lexicon.bin");
        let mut lex = Lexicon::new();
        for t in ["apple", "banana", "cherry"] {
            lex.get_or_assign(t);
        }
        lex.save(&path).unwrap();
        let loaded = Lexicon::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.lookup("banana"), Some(TermId(1)));
    }

    #[test]
    fn append_preserves_density_and_existing_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lexicon.bin");
        let mut lex = Lexicon::new();
        for t in ["apple", "banana"] {
            lex.get_or_assign(t);
        }
        lex.save(&path).unwrap();

        let ids = Lexicon::append(
            &path,
            &["banana".to_string(), "cherry".to_string(), "date".to_string()],
        )
        .unwrap();
        assert_eq!(ids[0], TermId(1)); // existing id preserved

        let reloaded = Lexicon::load(&path).unwrap();
        assert_eq!(reloaded.len(), 4);
        assert_eq!(reloaded.lookup("apple"), Some(TermId(0)));
        assert_eq!(reloaded.lookup("cherry"), Some(TermId(2)));
        assert_eq!(reloaded.lookup("date"), Some(TermId(3)));
    }

    #[test]
    fn missing_file_reports_missing_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.bin");
        match Lexicon::load(&path) {
            Err(Error::MissingInput { .. }) => {}
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }
}
