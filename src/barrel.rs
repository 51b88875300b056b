//! Fixed-width, offset-indexed shards of the inverted index.
//!
//! Barrel `b` covers term-ids `[b * words_per_barrel, (b+1) * words_per_barrel)`.
//! Every barrel begins with a dense table of `words_per_barrel` absolute
//! byte offsets (one per local term-id, `0` meaning "no postings"), so a
//! query-time lookup is a single seek to the offset table, a single read of
//! one `u64`, then (if non-zero) a single seek-and-read of the posting list
//! itself. No sequential scan ever touches a barrel file.
//!
//! Determinism: given the same monolithic inverted index and the same
//! `words_per_barrel`, the writer produces byte-identical barrel files.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::binio::{read_u32, read_u64, write_u32, write_u64};
use crate::error::{Error, Result};
use crate::inverted::InvertedIndexReader;
use crate::types::Posting;

pub fn barrel_path(barrel_dir: &Path, barrel_id: u32) -> PathBuf {
    barrel_dir.join(format!("barrel_{barrel_id}.bin"))
}

/// Partitions `inverted_index.bin` into `barrel_<b>.bin` shards of
/// `words_per_barrel` term-ids each. Creates `barrel_dir` if absent and
/// removes any stale `barrel_<b>.bin` outside the valid range (a rebuild
/// with a smaller vocabulary would otherwise leave orphaned shards that a
/// query server might still try to read from).
pub fn write_barrels(inverted_path: &Path, words_per_barrel: u32, barrel_dir: &Path) -> Result<()> {
    fs::create_dir_all(barrel_dir)?;

    let mut reader = InvertedIndexReader::open(inverted_path)?;
    let vocab_size = reader.vocab_size();
    let num_barrels = vocab_size.div_ceil(words_per_barrel);

    for barrel_id in 0..num_barrels {
        let mut chunk = Vec::with_capacity(words_per_barrel as usize);
        for _ in 0..words_per_barrel {
            match reader.next() {
                Some(list) => chunk.push(list?),
                None => chunk.push(Vec::new()),
            }
        }
        write_one_barrel(&chunk, &barrel_path(barrel_dir, barrel_id))?;
    }

    remove_stale_barrels(barrel_dir, num_barrels)?;
    Ok(())
}

fn write_one_barrel(lists: &[Vec<Posting>], path: &Path) -> io::Result<()> {
    let table_bytes = lists.len() as u64 * 8;
    let mut offsets = vec![0u64; lists.len()];
    let mut cursor = table_bytes;
    for (i, list) in lists.iter().enumerate() {
        if list.is_empty() {
            continue;
        }
        offsets[i] = cursor;
        cursor += 4 + list.len() as u64 * 8;
    }

    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for offset in &offsets {
        write_u64(&mut w, *offset)?;
    }
    for list in lists {
        if list.is_empty() {
            continue;
        }
        write_u32(&mut w, list.len() as u32)?;
        for p in list {
            write_u32(&mut w, p.doc_id)?;
            write_u32(&mut w, p.freq)?;
        }
    }
    w.flush()
}

fn remove_stale_barrels(barrel_dir: &Path, num_barrels: u32) -> io::Result<()> {
    for entry in fs::read_dir(barrel_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(id) = parse_barrel_id(&name) {
            if id >= num_barrels {
                fs::remove_file(entry.path())?;
            }
        }
    }
    Ok(())
}

fn parse_barrel_id(filename: &str) -> Option<u32> {
    filename
        .strip_prefix("barrel_")?
        .strip_suffix(".bin")?
        .parse()
        .ok()
}

/// O(1)-seek fetch of a single term's posting list. This is the query
/// engine's sole I/O path into a barrel — no sequential scan. An I/O
/// failure while opening, seeking, or reading is reported as an empty list:
/// under AND-semantics an empty list already empties the result, so a
/// transient read failure and a genuinely absent term look the same to the
/// caller.
pub fn fetch_postings(barrel_dir: &Path, term_id: u32, words_per_barrel: u32) -> Vec<Posting> {
    fetch_postings_fallible(barrel_dir, term_id, words_per_barrel).unwrap_or_default()
}

fn fetch_postings_fallible(
    barrel_dir: &Path,
    term_id: u32,
    words_per_barrel: u32,
) -> io::Result<Vec<Posting>> {
    let barrel_id = term_id / words_per_barrel;
    let local_id = term_id % words_per_barrel;

    let file = File::open(barrel_path(barrel_dir, barrel_id))?;
    let mut r = BufReader::new(file);
    r.seek(SeekFrom::Start(local_id as u64 * 8))?;
    let offset = read_u64(&mut r)?;
    if offset == 0 {
        return Ok(Vec::new());
    }

    r.seek(SeekFrom::Start(offset))?;
    let len = read_u32(&mut r)?;
    let mut list = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let doc_id = read_u32(&mut r)?;
        let freq = read_u32(&mut r)?;
        list.push(Posting { doc_id, freq });
    }
    Ok(list)
}

/// Validates that `barrel_dir` exists and holds at least one barrel file;
/// used at query-server startup where a missing barrel directory is fatal.
pub fn check_barrel_dir(barrel_dir: &Path) -> Result<()> {
    if !barrel_dir.is_dir() {
        return Err(Error::missing(barrel_dir));
    }
    Ok(())
}
