//! Append-only pipe-delimited document metadata.
//!
//! Line index `i` describes internal `doc-id` i; this alignment is the
//! entire point of the format; a reader must never drop a line, or every
//! subsequent doc-id shifts out from under it. A line with fewer than five
//! `|`-separated segments still produces a record — the missing trailing
//! fields are just empty strings, per the design's "readers ignore
//! malformed lines" rule, which means *tolerate*, not *skip*.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::id_map::IdMap;
use crate::types::MetadataRecord;

pub fn load(path: &Path) -> Result<Vec<MetadataRecord>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::missing(path)
        } else {
            Error::Io(e)
        }
    })?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        records.push(parse_line(&line?));
    }
    Ok(records)
}

fn parse_line(line: &str) -> MetadataRecord {
    let mut fields = line.splitn(5, '|');
    MetadataRecord {
        external_id: fields.next().unwrap_or("").to_string(),
        title: fields.next().unwrap_or("").to_string(),
        authors: fields.next().unwrap_or("").to_string(),
        category: fields.next().unwrap_or("").to_string(),
        date: fields.next().unwrap_or("").to_string(),
    }
}

pub fn format_line(record: &MetadataRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        record.external_id, record.title, record.authors, record.category, record.date
    )
}

/// Appends one record to the metadata file, creating it if absent.
pub fn append(path: &Path, record: &MetadataRecord) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut w = BufWriter::new(file);
    writeln!(w, "{}", format_line(record))?;
    w.flush()?;
    Ok(())
}

/// Bulk-build input: `clean_dataset.txt` carries only `<external-id> TAB
/// <content>`, with no title/authors/category/date fields. If the operator
/// hasn't supplied a pre-built `doc_metadata.txt` of their own, this writes
/// one line per doc-id (in `id_map` order) with only `external_id`
/// populated, so line-index/doc-id alignment holds from the very first
/// generation. Leaves an existing file untouched.
pub fn ensure_exists(path: &Path, id_map: &IdMap) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for doc_id in 0..id_map.len() as u32 {
        let external_id = id_map.external_id(doc_id).unwrap_or("");
        writeln!(
            w,
            "{}",
            format_line(&MetadataRecord {
                external_id: external_id.to_string(),
                ..Default::default()
            })
        )?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn well_formed_line_round_trips() {
        let rec = MetadataRecord {
            external_id: "1234.5678".into(),
            title: "A Paper".into(),
            authors: "A. Author".into(),
            category: "cs.LG cs.AI".into(),
            date: "2023-10-27".into(),
        };
        assert_eq!(parse_line(&format_line(&rec)), rec);
    }

    #[test]
    fn short_line_fills_empty_tail_without_dropping_the_record() {
        let rec = parse_line("1234|Only Title");
        assert_eq!(rec.external_id, "1234");
        assert_eq!(rec.title, "Only Title");
        assert_eq!(rec.authors, "");
        assert_eq!(rec.category, "");
        assert_eq!(rec.date, "");
    }

    #[test]
    fn line_index_stays_aligned_with_doc_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_metadata.txt");
        for rec in [
            MetadataRecord {
                external_id: "a".into(),
                ..Default::default()
            },
            MetadataRecord::default(), // malformed/empty line
            MetadataRecord {
                external_id: "c".into(),
                ..Default::default()
            },
        ] {
            append(&path, &rec).unwrap();
        }
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].external_id, "a");
        assert_eq!(loaded[2].external_id, "c");
    }

    #[test]
    fn ensure_exists_synthesizes_aligned_placeholder_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_metadata.txt");
        let id_map = IdMap::build(["b", "a"]);
        ensure_exists(&path, &id_map).unwrap();
        let records = load(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].external_id, "a");
        assert_eq!(records[1].external_id, "b");
    }

    #[test]
    fn ensure_exists_leaves_a_preexisting_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_metadata.txt");
        std::fs::write(&path, "custom|Title|Authors|cat|2020-01-01\n").unwrap();
        let id_map = IdMap::build(["a"]);
        ensure_exists(&path, &id_map).unwrap();
        let records = load(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].external_id, "custom");
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        match load(&dir.path().join("missing.txt")) {
            Err(Error::MissingInput { .. }) => {}
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }
}
