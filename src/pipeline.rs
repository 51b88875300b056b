// Copyright 2025-present Scholardex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orchestration of the builder stages and the live add-document path.
//!
//! The on-disk design treats the builder as "a chain of separate processes
//! that run to completion in order" — id-map, lexicon, forward index,
//! inverter, barrels, pagerank, trie. This crate keeps that sequencing
//! guarantee but runs every stage as an in-process function call from one
//! binary rather than shelling out: launching child processes is an outer
//! concern (who schedules the pipeline, what retries a failed stage) that
//! this crate doesn't own.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::WORDS_PER_BARREL;
use crate::error::{Error, Result};
use crate::id_map::IdMap;
use crate::lexicon::Lexicon;
use crate::tokenizer::tokenize;
use crate::types::{ForwardRecord, MetadataRecord};
use crate::{barrel, forward, hotswap, inverted, metadata, pagerank, trie};

pub struct BuildAllStats {
    pub docs: usize,
    pub terms: usize,
    pub forward: forward::BuildStats,
}

/// Runs the full bulk pipeline: id-map, lexicon, forward index, inverted
/// index, barrels, PageRank, and the autocomplete trie, in that order.
/// `dataset` is `clean_dataset.txt` (`<external-id> TAB <content>` per
/// line); `graph` is the citation graph consumed by PageRank.
pub fn build_all(
    dataset: &Path,
    graph: &Path,
    id_map_path: &Path,
    data_dir: &Path,
    barrel_dir: &Path,
) -> Result<BuildAllStats> {
    std::fs::create_dir_all(data_dir)?;

    let external_ids = read_external_ids(dataset)?;
    let id_map = IdMap::build(external_ids);
    id_map.save(id_map_path)?;

    let lexicon = build_lexicon(dataset)?;
    let lexicon_path = data_dir.join("lexicon.bin");
    lexicon.save(&lexicon_path)?;

    let forward_path = data_dir.join("forward_index.bin");
    let lengths_path = data_dir.join("doc_lengths.bin");
    let forward_stats = forward::build(dataset, &id_map, &lexicon, &forward_path, &lengths_path)?;

    let inverted_path = data_dir.join("inverted_index.bin");
    inverted::build(&forward_path, lexicon.len() as u32, &inverted_path)?;

    barrel::write_barrels(&inverted_path, WORDS_PER_BARREL, barrel_dir)?;

    let pg_graph = pagerank::load_graph(graph)?;
    let scores = pagerank::compute(&pg_graph);
    pagerank::save(&data_dir.join("pagerank_scores.txt"), &scores)?;

    let flat_trie = trie::build(&lexicon, &forward_path)?;
    trie::save(&data_dir.join("trie.bin"), &flat_trie)?;

    metadata::ensure_exists(&data_dir.join("doc_metadata.txt"), &id_map)?;

    Ok(BuildAllStats {
        docs: id_map.len(),
        terms: lexicon.len(),
        forward: forward_stats,
    })
}

/// Reads just the `<external-id>` column of `clean_dataset.txt`, in file
/// order. Used both by `build_all` and by the standalone `build-lexicon`
/// CLI stage, which builds the id map and the lexicon in one pass.
pub fn read_external_ids(dataset: &Path) -> Result<Vec<String>> {
    let file = File::open(dataset).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::missing(dataset)
        } else {
            Error::Io(e)
        }
    })?;
    let mut ids = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some((id, _)) = line.split_once('\t') {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Tokenizes every line of `clean_dataset.txt` and assigns dense term ids in
/// first-seen order. The standalone `build-lexicon` CLI stage and
/// `build_all` share this.
pub fn build_lexicon(dataset: &Path) -> Result<Lexicon> {
    let file = File::open(dataset).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::missing(dataset)
        } else {
            Error::Io(e)
        }
    })?;
    let mut lexicon = Lexicon::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some((_, content)) = line.split_once('\t') {
            for token in tokenize(content) {
                lexicon.get_or_assign(&token);
            }
        }
    }
    Ok(lexicon)
}

/// Parameters for the live add-document path, gathered from CLI flags.
pub struct NewDocument<'a> {
    pub external_id: &'a str,
    pub title: &'a str,
    pub authors: &'a str,
    pub category: &'a str,
    pub date: &'a str,
}

/// Adds one document without a full rebuild: appends to the id map,
/// lexicon, forward index, doc-lengths, and metadata store, then rebuilds
/// the inverted index and barrels into `staging_barrel_dir` and signals the
/// query server to swap to it. PageRank and the trie's noise floor are not
/// recomputed incrementally — the new document gets a PageRank prior of 0.0
/// (see `pagerank::load`) and won't surface in `/suggest` until the next
/// bulk rebuild crosses `TRIE_FREQ_FLOOR` for its terms.
pub fn add_document(
    data_dir: &Path,
    id_map_path: &Path,
    staging_barrel_dir: &Path,
    signal_path: &Path,
    file_path: &Path,
    doc: NewDocument,
) -> Result<u32> {
    let content = std::fs::read_to_string(file_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::missing(file_path)
        } else {
            Error::Io(e)
        }
    })?;

    let doc_id = IdMap::append(id_map_path, doc.external_id)?;

    let lexicon_path = data_dir.join("lexicon.bin");
    let tokens = tokenize(&content);
    let term_ids = Lexicon::append(&lexicon_path, &tokens)?;

    let mut freqs: std::collections::BTreeMap<u32, u32> = std::collections::BTreeMap::new();
    for id in &term_ids {
        *freqs.entry(id.0).or_insert(0) += 1;
    }
    let total_tokens = tokens.len() as u32;

    let forward_path = data_dir.join("forward_index.bin");
    let lengths_path = data_dir.join("doc_lengths.bin");
    forward::append_record(
        &forward_path,
        &ForwardRecord {
            doc_id,
            total_tokens,
            terms: freqs.into_iter().collect(),
        },
    )?;
    forward::append_doc_length(&lengths_path, total_tokens)?;

    metadata::append(
        &data_dir.join("doc_metadata.txt"),
        &MetadataRecord {
            external_id: doc.external_id.to_string(),
            title: doc.title.to_string(),
            authors: doc.authors.to_string(),
            category: doc.category.to_string(),
            date: doc.date.to_string(),
        },
    )?;

    let lexicon = Lexicon::load(&lexicon_path)?;
    let inverted_path = data_dir.join("inverted_index.bin");
    inverted::build(&forward_path, lexicon.len() as u32, &inverted_path)?;
    barrel::write_barrels(&inverted_path, WORDS_PER_BARREL, staging_barrel_dir)?;

    let flat_trie = trie::build(&lexicon, &forward_path)?;
    trie::save(&data_dir.join("trie.bin"), &flat_trie)?;

    hotswap::signal_new_generation(signal_path, staging_barrel_dir)?;

    Ok(doc_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_all_produces_a_queryable_index() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("clean_dataset.txt");
        std::fs::write(
            &dataset,
            "doc-a\tgraph algorithms for search engines\n\
             doc-b\tpagerank algorithms and link analysis\n",
        )
        .unwrap();
        let graph = dir.path().join("graph.txt");
        std::fs::write(&graph, "2\n0 1 1\n1 1 0\n").unwrap();

        let id_map_path = dir.path().join("id_map.txt");
        let data_dir = dir.path().join("data");
        let barrel_dir = dir.path().join("barrels");

        let stats = build_all(&dataset, &graph, &id_map_path, &data_dir, &barrel_dir).unwrap();
        assert_eq!(stats.docs, 2);
        assert!(stats.terms > 0);

        let index = crate::query::QueryIndex::load(
            &data_dir.join("lexicon.bin"),
            &data_dir.join("doc_lengths.bin"),
            &data_dir.join("pagerank_scores.txt"),
            &data_dir.join("doc_metadata.txt"),
            &barrel_dir,
            WORDS_PER_BARREL,
        )
        .unwrap();
        let hits = index.search("algorithms", None, false);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn add_document_is_queryable_after_signal() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("clean_dataset.txt");
        std::fs::write(&dataset, "doc-a\tgraph algorithms\n").unwrap();
        let graph = dir.path().join("graph.txt");
        std::fs::write(&graph, "1\n0 0\n").unwrap();

        let id_map_path = dir.path().join("id_map.txt");
        let data_dir = dir.path().join("data");
        let barrel_dir = dir.path().join("barrels");
        build_all(&dataset, &graph, &id_map_path, &data_dir, &barrel_dir).unwrap();

        let staging = dir.path().join("barrels_staging");
        let signal_path = dir.path().join("rebuild.signal");
        let new_file = dir.path().join("new_doc.txt");
        std::fs::write(&new_file, "pagerank and citation analysis").unwrap();

        let doc_id = add_document(
            &data_dir,
            &id_map_path,
            &staging,
            &signal_path,
            &new_file,
            NewDocument {
                external_id: "doc-b",
                title: "A New Paper",
                authors: "A. Author",
                category: "cs.IR",
                date: "2024-01-01",
            },
        )
        .unwrap();
        assert_eq!(doc_id, 1);
        assert!(signal_path.exists());

        let live = hotswap::LiveIndex::load(&data_dir, &barrel_dir, &signal_path, WORDS_PER_BARREL).unwrap();
        let hits = live.search("citation", None, false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 1);
        assert!(!signal_path.exists());
    }
}
