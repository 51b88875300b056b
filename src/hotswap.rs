// Copyright 2025-present Scholardex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Signal-file-mediated hot swap between the builder and a running query
//! server.
//!
//! The builder (or the live add-document path) finishes writing a complete,
//! self-consistent set of index files into a directory, then — as its very
//! last step — creates the signal file, whose contents are the path to the
//! barrel directory that should now be live. That ordering is the whole
//! protocol: the signal file's existence is the happens-before edge between
//! "new generation fully written" and "query server may start reading it".
//!
//! The query server polls for the signal file before serving each query. On
//! seeing one, it reloads the lexicon, doc lengths, pagerank scores,
//! metadata, and autocomplete trie from `data_dir`, rebinds to the barrel
//! directory named in the signal file, and only then deletes the signal
//! file. A crash between reload and deletion just means the next poll
//! reloads the same generation again — reload is idempotent.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::Result;
use crate::query::QueryIndex;
use crate::trie::{self, FlatNode};
use crate::types::SearchHit;

struct Generation {
    query: QueryIndex,
    trie: Option<Vec<FlatNode>>,
}

/// The query server's full live state, swappable as a unit.
pub struct LiveIndex {
    data_dir: PathBuf,
    signal_path: PathBuf,
    words_per_barrel: u32,
    generation: RwLock<Generation>,
}

impl LiveIndex {
    pub fn load(
        data_dir: &Path,
        barrel_dir: &Path,
        signal_path: &Path,
        words_per_barrel: u32,
    ) -> Result<Self> {
        let generation = load_generation(data_dir, barrel_dir, words_per_barrel)?;
        Ok(LiveIndex {
            data_dir: data_dir.to_path_buf(),
            signal_path: signal_path.to_path_buf(),
            words_per_barrel,
            generation: RwLock::new(generation),
        })
    }

    /// Checks for a pending signal file and, if present, reloads before
    /// answering. Reload failures are swallowed (the signal file is left in
    /// place so the next poll retries) rather than breaking the query path —
    /// the currently-live generation keeps serving.
    pub fn poll_and_maybe_swap(&self) {
        let Ok(contents) = fs::read_to_string(&self.signal_path) else {
            return;
        };
        let new_barrel_dir = PathBuf::from(contents.trim());
        if new_barrel_dir.as_os_str().is_empty() {
            return;
        }
        match load_generation(&self.data_dir, &new_barrel_dir, self.words_per_barrel) {
            Ok(next) => {
                *self.generation.write().unwrap() = next;
                let _ = fs::remove_file(&self.signal_path);
            }
            Err(_) => {
                // Leave the signal file; a partially-written new generation
                // (builder still mid-flight, or a transient I/O error) gets
                // another chance on the next poll.
            }
        }
    }

    pub fn search(
        &self,
        query_text: &str,
        category_filter: Option<&str>,
        sort_by_date: bool,
    ) -> Vec<SearchHit> {
        self.poll_and_maybe_swap();
        let generation = self.generation.read().unwrap();
        generation.query.search(query_text, category_filter, sort_by_date)
    }

    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        self.poll_and_maybe_swap();
        let generation = self.generation.read().unwrap();
        match &generation.trie {
            Some(nodes) => trie::suggest(nodes, prefix),
            None => Vec::new(),
        }
    }

    pub fn title_for(&self, doc_id: u32) -> Option<String> {
        let generation = self.generation.read().unwrap();
        generation
            .query
            .metadata_for(doc_id.into())
            .map(|m| m.title.clone())
    }
}

fn load_generation(data_dir: &Path, barrel_dir: &Path, words_per_barrel: u32) -> Result<Generation> {
    let query = QueryIndex::load(
        &data_dir.join("lexicon.bin"),
        &data_dir.join("doc_lengths.bin"),
        &data_dir.join("pagerank_scores.txt"),
        &data_dir.join("doc_metadata.txt"),
        barrel_dir,
        words_per_barrel,
    )?;
    let trie = trie::load(&data_dir.join("trie.bin"))?;
    Ok(Generation { query, trie })
}

/// Writer side: called after a rebuild has finished writing every file
/// under `new_barrel_dir`. Creating the signal file is the last write of
/// the whole rebuild — nothing may touch `new_barrel_dir` after this call.
pub fn signal_new_generation(signal_path: &Path, new_barrel_dir: &Path) -> Result<()> {
    fs::write(signal_path, new_barrel_dir.to_string_lossy().as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_map::IdMap;
    use crate::lexicon::Lexicon;
    use crate::{barrel, forward, inverted};
    use std::fs::File;

    fn build_generation(dir: &Path, barrel_dir: &Path, term: &str) {
        let mut lexicon = Lexicon::new();
        lexicon.get_or_assign(term);
        lexicon.save(&dir.join("lexicon.bin")).unwrap();

        let id_map = IdMap::build(["A"]);
        let dataset = dir.join("clean_dataset.txt");
        std::fs::write(&dataset, format!("A\t{term}\n")).unwrap();

        let forward_path = dir.join("forward_index.bin");
        let lengths_path = dir.join("doc_lengths.bin");
        forward::build(&dataset, &id_map, &lexicon, &forward_path, &lengths_path).unwrap();

        let inverted_path = dir.join("inverted_index.bin");
        inverted::build(&forward_path, 1, &inverted_path).unwrap();
        barrel::write_barrels(&inverted_path, 50_000, barrel_dir).unwrap();

        // pagerank/metadata/trie are all optional at load time; leave absent.
        let _ = File::create(dir.join("doc_metadata.txt"));
    }

    #[test]
    fn signal_file_triggers_rebind_then_self_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let barrel_a = dir.path().join("barrels_a");
        let barrel_b = dir.path().join("barrels_b");
        build_generation(dir.path(), &barrel_a, "alpha");

        let signal_path = dir.path().join("rebuild.signal");
        let live = LiveIndex::load(dir.path(), &barrel_a, &signal_path, 50_000).unwrap();
        assert!(live.search("alpha", None, false).len() == 1);

        build_generation(dir.path(), &barrel_b, "beta");
        signal_new_generation(&signal_path, &barrel_b).unwrap();

        let hits = live.search("beta", None, false);
        assert_eq!(hits.len(), 1);
        assert!(!signal_path.exists());
    }

    #[test]
    fn no_signal_file_leaves_generation_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let barrel_a = dir.path().join("barrels_a");
        build_generation(dir.path(), &barrel_a, "alpha");
        let signal_path = dir.path().join("rebuild.signal");
        let live = LiveIndex::load(dir.path(), &barrel_a, &signal_path, 50_000).unwrap();
        assert_eq!(live.search("alpha", None, false).len(), 1);
        assert_eq!(live.search("alpha", None, false).len(), 1);
    }
}
