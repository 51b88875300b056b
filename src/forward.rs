//! Document-centric term-frequency records, keyed by dense `doc-id`.
//!
//! Builds `forward_index.bin` and `doc_lengths.bin` from `clean_dataset.txt`
//! (one `<external-id> TAB <content>` record per line) plus the id map and
//! lexicon built earlier in the pipeline.
//!
//! # Invariant
//!
//! Records are written to `forward_index.bin` in ascending `doc-id` order —
//! the inverter (`inverted.rs`) depends on this to produce posting lists
//! that are already sorted by `doc-id` without a separate sort pass.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::binio::{read_u32, write_u32};
use crate::error::{Error, Result};
use crate::id_map::IdMap;
use crate::lexicon::Lexicon;
use crate::tokenizer::tokenize;
use crate::types::ForwardRecord;

#[derive(Debug, Default, Clone, Copy)]
pub struct BuildStats {
    pub docs_written: usize,
    pub docs_skipped_unmapped: usize,
    pub total_tokens: u64,
}

/// Reads `clean_dataset.txt`, resolves each line to a `doc-id` via `id_map`,
/// tokenizes its content, resolves each token to a `term-id` via `lexicon`
/// (dropping tokens outside the closed vocabulary), and writes
/// `forward_index.bin` + `doc_lengths.bin`.
pub fn build(
    dataset_path: &Path,
    id_map: &IdMap,
    lexicon: &Lexicon,
    forward_out: &Path,
    lengths_out: &Path,
) -> Result<BuildStats> {
    let file = File::open(dataset_path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::missing(dataset_path)
        } else {
            Error::Io(e)
        }
    })?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().collect::<io::Result<_>>()?;

    let num_docs = id_map.len();
    let mut doc_lengths = vec![0u32; num_docs];
    let mut records: Vec<Option<ForwardRecord>> = vec![None; num_docs];
    let mut skipped_unmapped = 0usize;

    // Parallel tokenize + term resolution; the reduce step below is
    // sequential because it writes into doc-id-indexed slots (no
    // contention, but simplest to reason about single-threaded).
    let parsed: Vec<Option<(u32, ForwardRecord)>> = lines
        .par_iter()
        .map(|line| parse_and_tokenize(line, id_map, lexicon))
        .collect();

    for item in parsed {
        match item {
            Some((doc_id, record)) => {
                doc_lengths[doc_id as usize] = record.total_tokens;
                records[doc_id as usize] = Some(record);
            }
            None => skipped_unmapped += 1,
        }
    }

    let forward_file = File::create(forward_out)?;
    let mut fw = BufWriter::new(forward_file);
    let mut docs_written = 0usize;
    let mut total_tokens = 0u64;
    for record in records.into_iter().flatten() {
        write_record(&mut fw, &record)?;
        total_tokens += u64::from(record.total_tokens);
        docs_written += 1;
    }
    fw.flush()?;

    let lengths_file = File::create(lengths_out)?;
    let mut lw = BufWriter::new(lengths_file);
    write_u32(&mut lw, num_docs as u32)?;
    for len in &doc_lengths {
        write_u32(&mut lw, *len)?;
    }
    lw.flush()?;

    Ok(BuildStats {
        docs_written,
        docs_skipped_unmapped: skipped_unmapped,
        total_tokens,
    })
}

fn parse_and_tokenize(
    line: &str,
    id_map: &IdMap,
    lexicon: &Lexicon,
) -> Option<(u32, ForwardRecord)> {
    let (external_id, content) = line.split_once('\t')?;
    let doc_id = id_map.internal_id(external_id)?;

    let mut freqs: std::collections::BTreeMap<u32, u32> = std::collections::BTreeMap::new();
    let mut total_tokens = 0u32;
    for token in tokenize(content) {
        if let Some(term_id) = lexicon.lookup(&token) {
            *freqs.entry(term_id.0).or_insert(0) += 1;
            total_tokens += 1;
        }
    }

    let record = ForwardRecord {
        doc_id,
        total_tokens,
        terms: freqs.into_iter().collect(),
    };
    Some((doc_id, record))
}

fn write_record<W: Write>(w: &mut W, record: &ForwardRecord) -> io::Result<()> {
    write_u32(w, record.doc_id)?;
    write_u32(w, record.total_tokens)?;
    write_u32(w, record.terms.len() as u32)?;
    for (term_id, freq) in &record.terms {
        write_u32(w, *term_id)?;
        write_u32(w, *freq)?;
    }
    Ok(())
}

/// Appends one new record to `forward_index.bin`. Used by the live
/// add-document path; the caller is responsible for keeping the file's
/// doc-id ordering consistent (new documents always get the highest
/// doc-id, so append-at-tail preserves ascending order).
pub fn append_record(path: &Path, record: &ForwardRecord) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut w = BufWriter::new(file);
    write_record(&mut w, record)?;
    w.flush()?;
    Ok(())
}

pub fn read_doc_lengths(path: &Path) -> Result<Vec<u32>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::missing(path)
        } else {
            Error::Io(e)
        }
    })?;
    let mut r = BufReader::new(file);
    let d = read_u32(&mut r)?;
    let mut lengths = Vec::with_capacity(d as usize);
    for _ in 0..d {
        lengths.push(read_u32(&mut r)?);
    }
    Ok(lengths)
}

/// Live add-document path: bump the document count and append one length.
pub fn append_doc_length(path: &Path, len: u32) -> Result<u32> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let d = read_u32(&mut file)?;
    let new_doc_id = d;
    file.seek(SeekFrom::Start(0))?;
    write_u32(&mut file, d + 1)?;
    file.seek(SeekFrom::End(0))?;
    write_u32(&mut file, len)?;
    Ok(new_doc_id)
}

/// Lazy, forward-only iterator over `forward_index.bin`. Not restartable —
/// build a fresh reader (reopen the file) to scan again.
pub struct ForwardIndexReader<R> {
    inner: R,
    exhausted: bool,
}

impl ForwardIndexReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::missing(path)
            } else {
                Error::Io(e)
            }
        })?;
        Ok(ForwardIndexReader {
            inner: BufReader::new(file),
            exhausted: false,
        })
    }
}

impl<R: Read> Iterator for ForwardIndexReader<R> {
    type Item = Result<ForwardRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match read_u32(&mut self.inner) {
            Ok(doc_id) => Some(self.read_rest(doc_id)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(Error::Io(e)))
            }
        }
    }
}

impl<R: Read> ForwardIndexReader<R> {
    fn read_rest(&mut self, doc_id: u32) -> Result<ForwardRecord> {
        let total_tokens = read_u32(&mut self.inner)?;
        let unique = read_u32(&mut self.inner)?;
        let mut terms = Vec::with_capacity(unique as usize);
        for _ in 0..unique {
            let term_id = read_u32(&mut self.inner)?;
            let freq = read_u32(&mut self.inner)?;
            terms.push((term_id, freq));
        }
        Ok(ForwardRecord {
            doc_id,
            total_tokens,
            terms,
        })
    }
}
