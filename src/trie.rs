//! Frequency-weighted autocomplete trie, stored flat.
//!
//! Construction keeps a conventional pointer tree (`BuildNode`) — simplest
//! to insert into — and only flattens to the first-child/next-sibling array
//! form (`FlatNode`) that is actually persisted. The flat form is the
//! contract; the pointer tree never touches disk.
//!
//! Flattening is a pre-order DFS: sort each node's children ascending by
//! key, assign the current node a dense index, recursively flatten each
//! child, and chain the children together via `sibling_index`. Index `0` is
//! always the root (`key = 0`, never itself a terminal term).

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::config::{MAX_SUGGESTIONS, TRIE_FREQ_FLOOR};
use crate::error::{Error, Result};
use crate::forward::ForwardIndexReader;
use crate::lexicon::Lexicon;

const NO_INDEX: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatNode {
    pub key: u8,
    pub frequency: i32,
    pub child_index: i32,
    pub sibling_index: i32,
    pub is_end: bool,
}

struct BuildNode {
    key: u8,
    frequency: i32,
    is_end: bool,
    children: Vec<BuildNode>,
}

impl BuildNode {
    fn new(key: u8) -> Self {
        BuildNode {
            key,
            frequency: 0,
            is_end: false,
            children: Vec::new(),
        }
    }

    fn child_mut(&mut self, key: u8) -> &mut BuildNode {
        if let Some(pos) = self.children.iter().position(|c| c.key == key) {
            &mut self.children[pos]
        } else {
            self.children.push(BuildNode::new(key));
            self.children.last_mut().unwrap()
        }
    }

    fn insert(&mut self, word: &[u8], frequency: i32) {
        let mut node = self;
        for &byte in word {
            node = node.child_mut(byte);
        }
        node.is_end = true;
        node.frequency = frequency;
    }
}

/// Computes each term's global frequency by summing forward-index postings
/// (already case-folded: the tokenizer never emits anything but lowercase),
/// drops terms under `TRIE_FREQ_FLOOR`, and builds the flat trie.
pub fn build(lexicon: &Lexicon, forward_path: &Path) -> Result<Vec<FlatNode>> {
    let mut freqs: HashMap<u32, i64> = HashMap::new();
    for record in ForwardIndexReader::open(forward_path)? {
        let record = record?;
        for (term_id, freq) in record.terms {
            *freqs.entry(term_id).or_insert(0) += i64::from(freq);
        }
    }

    let mut root = BuildNode::new(0);
    let mut inserted = 0usize;
    for (term_id, total) in freqs {
        if total < i64::from(TRIE_FREQ_FLOOR) {
            continue;
        }
        let Some(term) = lexicon.term(term_id.into()) else {
            continue;
        };
        let frequency = total.min(i32::MAX as i64) as i32;
        root.insert(term.as_bytes(), frequency);
        inserted += 1;
    }
    let _ = inserted;

    let mut flat = Vec::new();
    flatten(&mut root, &mut flat);
    Ok(flat)
}

fn flatten(node: &mut BuildNode, out: &mut Vec<FlatNode>) -> i32 {
    let my_index = out.len() as i32;
    out.push(FlatNode {
        key: node.key,
        frequency: if node.is_end { node.frequency } else { 0 },
        child_index: NO_INDEX,
        sibling_index: NO_INDEX,
        is_end: node.is_end,
    });

    node.children.sort_by_key(|c| c.key);

    let mut first_child = NO_INDEX;
    let mut prev_child = NO_INDEX;
    for child in &mut node.children {
        let child_index = flatten(child, out);
        if first_child == NO_INDEX {
            first_child = child_index;
        }
        if prev_child != NO_INDEX {
            out[prev_child as usize].sibling_index = child_index;
        }
        prev_child = child_index;
    }
    out[my_index as usize].child_index = first_child;
    my_index
}

pub fn save(path: &Path, nodes: &[FlatNode]) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for n in nodes {
        write_node(&mut w, n)?;
    }
    w.flush()?;
    Ok(())
}

fn write_node<W: Write>(w: &mut W, n: &FlatNode) -> io::Result<()> {
    w.write_all(&[n.key])?;
    w.write_all(&n.frequency.to_le_bytes())?;
    w.write_all(&n.child_index.to_le_bytes())?;
    w.write_all(&n.sibling_index.to_le_bytes())?;
    w.write_all(&[n.is_end as u8])
}

/// Trie absence is non-fatal: callers get `Ok(None)` and
/// disable `/suggest` rather than failing startup.
pub fn load(path: &Path) -> Result<Option<Vec<FlatNode>>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };
    let mut r = BufReader::new(file);
    let mut nodes = Vec::new();
    loop {
        let mut key_buf = [0u8; 1];
        match r.read(&mut key_buf)? {
            0 => break,
            _ => {}
        }
        let mut freq_buf = [0u8; 4];
        r.read_exact(&mut freq_buf)?;
        let mut child_buf = [0u8; 4];
        r.read_exact(&mut child_buf)?;
        let mut sib_buf = [0u8; 4];
        r.read_exact(&mut sib_buf)?;
        let mut end_buf = [0u8; 1];
        r.read_exact(&mut end_buf)?;
        nodes.push(FlatNode {
            key: key_buf[0],
            frequency: i32::from_le_bytes(freq_buf),
            child_index: i32::from_le_bytes(child_buf),
            sibling_index: i32::from_le_bytes(sib_buf),
            is_end: end_buf[0] != 0,
        });
    }
    Ok(Some(nodes))
}

/// Walks from the root's first child, matching `prefix` byte by byte and
/// failing fast on mismatch, then collects the matched node (if terminal)
/// and every reachable descendant, sorted by frequency descending,
/// returning up to `MAX_SUGGESTIONS` term strings.
pub fn suggest(nodes: &[FlatNode], prefix: &str) -> Vec<String> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let prefix_bytes = prefix.as_bytes();
    let mut current = 0usize; // root
    for &byte in prefix_bytes {
        match find_child(nodes, current, byte) {
            Some(idx) => current = idx,
            None => return Vec::new(),
        }
    }

    let mut matches: Vec<(i32, String)> = Vec::new();
    collect(nodes, current, prefix.to_string(), &mut matches);
    matches.sort_by(|a, b| b.0.cmp(&a.0));
    matches
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, term)| term)
        .collect()
}

fn find_child(nodes: &[FlatNode], parent: usize, key: u8) -> Option<usize> {
    let mut idx = nodes[parent].child_index;
    while idx != NO_INDEX {
        let node = &nodes[idx as usize];
        if node.key == key {
            return Some(idx as usize);
        }
        idx = node.sibling_index;
    }
    None
}

fn collect(nodes: &[FlatNode], index: usize, word: String, out: &mut Vec<(i32, String)>) {
    let node = &nodes[index];
    if node.is_end && node.frequency > 0 {
        out.push((node.frequency, word.clone()));
    }
    let mut child = node.child_index;
    while child != NO_INDEX {
        let child_node = &nodes[child as usize];
        let mut next_word = word.clone();
        next_word.push(child_node.key as char);
        collect(nodes, child as usize, next_word, out);
        child = child_node.sibling_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_from_pairs(pairs: &[(&str, i32)]) -> Vec<FlatNode> {
        let mut root = BuildNode::new(0);
        for (term, freq) in pairs {
            root.insert(term.as_bytes(), *freq);
        }
        let mut flat = Vec::new();
        flatten(&mut root, &mut flat);
        flat
    }

    #[test]
    fn suggests_by_frequency_descending() {
        let nodes = build_from_pairs(&[("algorithm", 120), ("algebra", 80), ("alpha", 40)]);
        let got = suggest(&nodes, "alg");
        assert_eq!(got, vec!["algorithm", "algebra"]);
    }

    #[test]
    fn unmatched_prefix_yields_no_suggestions() {
        let nodes = build_from_pairs(&[("hello", 100)]);
        assert!(suggest(&nodes, "xyz").is_empty());
    }

    #[test]
    fn exact_term_is_included_among_its_own_descendants() {
        let nodes = build_from_pairs(&[("cat", 60), ("catalog", 70)]);
        let got = suggest(&nodes, "cat");
        assert_eq!(got.len(), 2);
        assert!(got.contains(&"cat".to_string()));
        assert!(got.contains(&"catalog".to_string()));
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trie.bin");
        let nodes = build_from_pairs(&[("algorithm", 120), ("algebra", 80)]);
        save(&path, &nodes).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.len(), nodes.len());
        let got = suggest(&loaded, "alg");
        assert_eq!(got, vec!["algorithm", "algebra"]);
    }

    #[test]
    fn missing_trie_file_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("nope.bin")).unwrap().is_none());
    }
}
