// Copyright 2025-present Scholardex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-line surface: one subcommand per builder stage, plus `build-all`,
//! `query`, and `add-document`. Each stage can be run in isolation (the
//! original design is a chain of independent steps), and `build-all` chains
//! them for the common case.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "scholardex", version, about = "Full-text search over a static scholarly-article corpus")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Tokenize the dataset and build the closed-vocabulary lexicon.
    BuildLexicon {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        id_map: PathBuf,
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Build the forward index and doc-lengths table.
    BuildForward {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        id_map: PathBuf,
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Pivot the forward index into the monolithic inverted index.
    Invert {
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Shard the inverted index into fixed-width barrels.
    BuildBarrels {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        barrel_dir: PathBuf,
    },
    /// Compute PageRank scores from a citation graph.
    Pagerank {
        #[arg(long)]
        graph: PathBuf,
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Build the autocomplete trie.
    BuildTrie {
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Run every builder stage in order.
    BuildAll {
        dataset: PathBuf,
        graph: PathBuf,
        id_map: PathBuf,
        data_dir: PathBuf,
        barrel_dir: PathBuf,
    },
    /// Start an interactive query REPL against a built index.
    Query {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        barrel_dir: PathBuf,
        #[arg(long)]
        signal: Option<PathBuf>,
    },
    /// Add a single document to a live index and trigger a hot swap.
    AddDocument {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        authors: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        date: String,
    },
}
