//! External-string-id &lt;-&gt; internal dense-uint32 map.
//!
//! Produced by sorting all external ids lexicographically and assigning
//! dense 0-based ids in that order. Used by the forward-index builder to
//! align tokens with a stable `doc-id`, and by PageRank to align the
//! citation graph's node numbering with the same space.
//!
//! On-disk format: UTF-8 text, one `<external-id> <internal-id>` pair per
//! line (`id_map.txt`).

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone)]
pub struct IdMap {
    external_to_internal: HashMap<String, u32>,
    internal_to_external: Vec<String>,
}

impl IdMap {
    /// Builds a map from a set of external ids: sort lexicographically, then
    /// assign dense 0-based internal ids in that order. Duplicate external
    /// ids collapse to a single internal id.
    pub fn build<I, S>(external_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sorted: Vec<String> = external_ids.into_iter().map(Into::into).collect();
        sorted.sort();
        sorted.dedup();

        let external_to_internal = sorted
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u32))
            .collect();

        IdMap {
            external_to_internal,
            internal_to_external: sorted,
        }
    }

    pub fn len(&self) -> usize {
        self.internal_to_external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internal_to_external.is_empty()
    }

    pub fn internal_id(&self, external: &str) -> Option<u32> {
        self.external_to_internal.get(external).copied()
    }

    pub fn external_id(&self, internal: u32) -> Option<&str> {
        self.internal_to_external
            .get(internal as usize)
            .map(String::as_str)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::missing(path)
            } else {
                Error::Io(e)
            }
        })?;
        let reader = BufReader::new(file);
        let mut external_to_internal = HashMap::new();
        let mut by_internal: Vec<(u32, String)> = Vec::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.rsplitn(2, ' ');
            let internal_str = parts.next();
            let external_str = parts.next();
            let (external, internal) = match (external_str, internal_str) {
                (Some(e), Some(i)) => (e, i),
                _ => {
                    return Err(Error::corrupt(
                        "id_map.txt line",
                        format!("line {lineno}: {line:?} is not `<external> <internal>`"),
                    ))
                }
            };
            let internal: u32 = internal.parse().map_err(|_| {
                Error::corrupt(
                    "id_map.txt line",
                    format!("line {lineno}: internal id {internal:?} is not a u32"),
                )
            })?;
            external_to_internal.insert(external.to_string(), internal);
            by_internal.push((internal, external.to_string()));
        }

        by_internal.sort_by_key(|(internal, _)| *internal);
        let internal_to_external = by_internal.into_iter().map(|(_, e)| e).collect();

        Ok(IdMap {
            external_to_internal,
            internal_to_external,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        for (internal, external) in self.internal_to_external.iter().enumerate() {
            writeln!(w, "{external} {internal}")?;
        }
        w.flush()?;
        Ok(())
    }

    /// Live add-document path: appends one external id at the tail with the
    /// next dense internal id, instead of re-sorting the whole map. This
    /// breaks the "internal ids follow lexicographic external-id order"
    /// invariant for documents added after the bulk build, in exchange for
    /// O(1) appends and doc-ids that only ever grow. Idempotent: re-adding
    /// an id already present returns its existing internal id without
    /// touching the file.
    pub fn append(path: &Path, external_id: &str) -> Result<u32> {
        let existing = Self::load(path)?;
        if let Some(id) = existing.internal_id(external_id) {
            return Ok(id);
        }
        let new_id = existing.len() as u32;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{external_id} {new_id}")?;
        Ok(new_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dense_assignment_is_lexicographic() {
        let map = IdMap::build(["zeta", "alpha", "mu", "alpha"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.internal_id("alpha"), Some(0));
        assert_eq!(map.internal_id("mu"), Some(1));
        assert_eq!(map.internal_id("zeta"), Some(2));
        assert_eq!(map.external_id(0), Some("alpha"));
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("id_map.txt");
        let map = IdMap::build(["doc-b", "doc-a", "doc-c"]);
        map.save(&path).unwrap();
        let loaded = IdMap::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.internal_id("doc-a"), Some(0));
        assert_eq!(loaded.external_id(2), Some("doc-c"));
    }

    #[test]
    fn append_assigns_next_id_without_resorting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("id_map.txt");
        IdMap::build(["zeta", "alpha"]).save(&path).unwrap();

        let new_id = IdMap::append(&path, "aaa-comes-first-lexicographically").unwrap();
        assert_eq!(new_id, 2); // appended, not re-sorted to the front

        let reloaded = IdMap::load(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.internal_id("alpha"), Some(0));
    }

    #[test]
    fn append_is_idempotent_for_an_existing_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("id_map.txt");
        IdMap::build(["alpha"]).save(&path).unwrap();
        let id = IdMap::append(&path, "alpha").unwrap();
        assert_eq!(id, 0);
        assert_eq!(IdMap::load(&path).unwrap().len(), 1);
    }
}
