//! Damped random-walk authority over the citation graph.
//!
//! Input: `graph.txt`, `N` on line 1, then one line per source node with
//! out-degree and targets: `u deg v1 v2 ... v_deg`. Missing or repeated
//! edges are accepted verbatim — this module does not validate graph
//! well-formedness beyond parsing it.
//!
//! Dangling nodes (out-degree 0) are handled by a separate accumulator
//! rather than a self-loop or sentinel edge: summing `PR[i]` over dangling
//! `i` each iteration and redistributing that mass evenly keeps the total
//! probability mass conserved without mutating the adjacency list.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::config::{DAMPING, MAX_ITER, TOL};
use crate::error::{Error, Result};

pub struct Graph {
    pub n: usize,
    pub adjacency: Vec<Vec<u32>>,
}

pub fn load_graph(path: &Path) -> Result<Graph> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::missing(path)
        } else {
            Error::Io(e)
        }
    })?;
    let mut lines = BufReader::new(file).lines();

    let first = lines
        .next()
        .ok_or_else(|| Error::corrupt("graph.txt", "empty file"))??;
    let n: usize = first
        .trim()
        .parse()
        .map_err(|_| Error::corrupt("graph.txt", format!("node count {first:?} is not a usize")))?;

    let mut adjacency = vec![Vec::new(); n];
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let u: usize = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::corrupt("graph.txt", format!("bad source node in {line:?}")))?;
        let deg: usize = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::corrupt("graph.txt", format!("bad degree in {line:?}")))?;
        let mut targets = Vec::with_capacity(deg);
        for _ in 0..deg {
            let v: u32 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Error::corrupt("graph.txt", format!("bad target in {line:?}")))?;
            targets.push(v);
        }
        if u < n {
            adjacency[u].extend(targets);
        }
    }

    Ok(Graph { n, adjacency })
}

/// Runs the iterative update to convergence (or `MAX_ITER` iterations,
/// whichever comes first) and returns one score per node, in id order.
pub fn compute(graph: &Graph) -> Vec<f64> {
    let n = graph.n;
    if n == 0 {
        return Vec::new();
    }
    let out_degree: Vec<usize> = graph.adjacency.iter().map(Vec::len).collect();

    let mut pr = vec![1.0 / n as f64; n];
    let base = (1.0 - DAMPING) / n as f64;

    for _ in 0..MAX_ITER {
        let dangling: f64 = (0..n)
            .into_par_iter()
            .filter(|&i| out_degree[i] == 0)
            .map(|i| pr[i])
            .sum();
        let dangling_share = DAMPING * dangling / n as f64;

        let mut next_pr = vec![base + dangling_share; n];
        // Sequential accumulation: each source fans out to its own targets,
        // and targets are not partitioned, so a parallel scatter would need
        // synchronization that isn't worth it at this node count.
        for i in 0..n {
            if out_degree[i] == 0 {
                continue;
            }
            let share = pr[i] / out_degree[i] as f64;
            for &v in &graph.adjacency[i] {
                if (v as usize) < n {
                    next_pr[v as usize] += DAMPING * share;
                }
            }
        }

        let delta: f64 = pr
            .iter()
            .zip(next_pr.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        pr = next_pr;
        if delta < TOL {
            break;
        }
    }

    pr
}

pub fn save(path: &Path, scores: &[f64]) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for (i, score) in scores.iter().enumerate() {
        writeln!(w, "{i} {score}")?;
    }
    w.flush()?;
    Ok(())
}

/// PageRank absence is non-fatal — callers default missing scores to
/// `0.0`. This returns `Ok(None)` rather than an error on a
/// missing file so the caller can make that decision explicitly.
pub fn load(path: &Path, num_docs: usize) -> Result<Option<Vec<f64>>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };
    let mut scores = vec![0.0; num_docs];
    for line in BufReader::new(file).lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (id, score) = match (fields.next(), fields.next()) {
            (Some(id), Some(score)) => (id, score),
            _ => continue, // malformed line: skip, don't abort the load
        };
        let (id, score): (usize, f64) = match (id.parse(), score.parse()) {
            (Ok(id), Ok(score)) => (id, score),
            _ => continue,
        };
        if id < num_docs {
            scores[id] = score;
        }
        // doc-id beyond the lengths array: out of range, silently dropped,
        // leaving that document's prior at its default 0.0.
    }
    Ok(Some(scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_graph_with_dangling_node() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.txt");
        std::fs::write(&path, "3\n0 1 1\n1 1 2\n").unwrap();
        let graph = load_graph(&path).unwrap();
        assert_eq!(graph.n, 3);
        assert_eq!(graph.adjacency, vec![vec![1], vec![2], vec![]]);
    }

    #[test]
    fn scores_sum_close_to_n_and_favor_authority() {
        // A 3-cycle plus one extra inbound edge to node 0 makes node 0 the
        // most-linked-to node.
        let graph = Graph {
            n: 3,
            adjacency: vec![vec![1], vec![2, 0], vec![0]],
        };
        let scores = compute(&graph);
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
        let total: f64 = scores.iter().sum();
        assert!((total - 3.0).abs() < 1e-6, "total={total}");
    }

    #[test]
    fn all_dangling_nodes_keep_uniform_scores() {
        let graph = Graph {
            n: 4,
            adjacency: vec![vec![]; 4],
        };
        let scores = compute(&graph);
        for s in &scores {
            assert!((s - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_pagerank_file_is_non_fatal() {
        let dir = tempdir().unwrap();
        let result = load(&dir.path().join("nope.txt"), 10).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pagerank_scores.txt");
        save(&path, &[0.1, 0.2, 0.3]).unwrap();
        let loaded = load(&path, 3).unwrap().unwrap();
        assert!((loaded[1] - 0.2).abs() < 1e-12);
    }
}
