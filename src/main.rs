// Copyright 2025-present Scholardex Contributors
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use scholardex::cli::{Cli, Command};
use scholardex::config::WORDS_PER_BARREL;
use scholardex::error::Result;
use scholardex::{barrel, forward, hotswap, id_map::IdMap, inverted, lexicon::Lexicon, pagerank, pipeline, trie};

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::BuildLexicon {
            dataset,
            id_map,
            data_dir,
        } => {
            std::fs::create_dir_all(&data_dir)?;
            let pb = spinner("Building id map and lexicon...");
            let external_ids = pipeline::read_external_ids(&dataset)?;
            IdMap::build(external_ids).save(&id_map)?;
            let lexicon = pipeline::build_lexicon(&dataset)?;
            let count = lexicon.len();
            lexicon.save(&data_dir.join("lexicon.bin"))?;
            pb.finish_with_message(format!("wrote {count} terms to {}", data_dir.join("lexicon.bin").display()));
            Ok(())
        }
        Command::BuildForward {
            dataset,
            id_map,
            data_dir,
        } => {
            let pb = spinner("Building forward index...");
            let id_map = IdMap::load(&id_map)?;
            let lexicon = Lexicon::load(&data_dir.join("lexicon.bin"))?;
            let stats = forward::build(
                &dataset,
                &id_map,
                &lexicon,
                &data_dir.join("forward_index.bin"),
                &data_dir.join("doc_lengths.bin"),
            )?;
            pb.finish_with_message(format!(
                "wrote {} documents ({} skipped, {} tokens total)",
                stats.docs_written, stats.docs_skipped_unmapped, stats.total_tokens
            ));
            Ok(())
        }
        Command::Invert { data_dir } => {
            let pb = spinner("Inverting forward index...");
            let lexicon = Lexicon::load(&data_dir.join("lexicon.bin"))?;
            inverted::build(
                &data_dir.join("forward_index.bin"),
                lexicon.len() as u32,
                &data_dir.join("inverted_index.bin"),
            )?;
            pb.finish_with_message("wrote inverted_index.bin");
            Ok(())
        }
        Command::BuildBarrels { data_dir, barrel_dir } => {
            let pb = spinner("Sharding posting lists into barrels...");
            barrel::write_barrels(
                &data_dir.join("inverted_index.bin"),
                WORDS_PER_BARREL,
                &barrel_dir,
            )?;
            pb.finish_with_message(format!("wrote barrels to {}", barrel_dir.display()));
            Ok(())
        }
        Command::Pagerank { graph, data_dir } => {
            let pb = spinner("Computing PageRank...");
            let graph = pagerank::load_graph(&graph)?;
            let scores = pagerank::compute(&graph);
            pagerank::save(&data_dir.join("pagerank_scores.txt"), &scores)?;
            pb.finish_with_message(format!("wrote pagerank scores for {} nodes", scores.len()));
            Ok(())
        }
        Command::BuildTrie { data_dir } => {
            let pb = spinner("Building autocomplete trie...");
            let lexicon = Lexicon::load(&data_dir.join("lexicon.bin"))?;
            let flat = trie::build(&lexicon, &data_dir.join("forward_index.bin"))?;
            trie::save(&data_dir.join("trie.bin"), &flat)?;
            pb.finish_with_message(format!("wrote {} trie nodes", flat.len()));
            Ok(())
        }
        Command::BuildAll {
            dataset,
            graph,
            id_map,
            data_dir,
            barrel_dir,
        } => {
            let pb = spinner("Running full build pipeline...");
            let stats = pipeline::build_all(&dataset, &graph, &id_map, &data_dir, &barrel_dir)?;
            pb.finish_with_message(format!(
                "built {} documents, {} terms ({} skipped)",
                stats.docs, stats.terms, stats.forward.docs_skipped_unmapped
            ));
            Ok(())
        }
        Command::Query {
            data_dir,
            barrel_dir,
            signal,
        } => {
            let signal_path = signal.unwrap_or_else(|| data_dir.join("rebuild.signal"));
            let live = hotswap::LiveIndex::load(&data_dir, &barrel_dir, &signal_path, WORDS_PER_BARREL)?;
            run_repl(&live)
        }
        Command::AddDocument {
            data_dir,
            file,
            id,
            title,
            authors,
            category,
            date,
        } => {
            let id_map_path = data_dir.join("id_map.txt");
            let staging_barrel_dir = data_dir.join("barrels_staging");
            let signal_path = data_dir.join("rebuild.signal");
            let doc_id = pipeline::add_document(
                &data_dir,
                &id_map_path,
                &staging_barrel_dir,
                &signal_path,
                &file,
                pipeline::NewDocument {
                    external_id: &id,
                    title: &title,
                    authors: &authors,
                    category: &category,
                    date: &date,
                },
            )?;
            eprintln!("added document {id} as doc-id {doc_id}");
            Ok(())
        }
    }
}

/// Reads queries from stdin until `exit`. Recognizes `/date` (sort by date
/// instead of score), `/cat:<substring>` (filter to matching categories),
/// and `/suggest <prefix>` (autocomplete); any other non-empty line is run
/// as a conjunctive term query.
fn run_repl(live: &hotswap::LiveIndex) -> Result<()> {
    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush().ok();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            print!("> ");
            io::stdout().flush().ok();
            continue;
        }
        if line == "exit" {
            break;
        }
        if let Some(prefix) = line.strip_prefix("/suggest ") {
            for term in live.suggest(prefix.trim()) {
                println!("{term}");
            }
            print!("> ");
            io::stdout().flush().ok();
            continue;
        }

        let mut sort_by_date = false;
        let mut category: Option<String> = None;
        let mut terms = Vec::new();
        for word in line.split_whitespace() {
            if word == "/date" {
                sort_by_date = true;
            } else if let Some(cat) = word.strip_prefix("/cat:") {
                category = Some(cat.to_string());
            } else {
                terms.push(word);
            }
        }
        let query_text = terms.join(" ");

        let hits = live.search(&query_text, category.as_deref(), sort_by_date);
        if hits.is_empty() {
            println!("(no results)");
        } else {
            for hit in &hits {
                let title = live.title_for(hit.doc_id).unwrap_or_default();
                println!("{:>8.4}  doc {:>6}  {}", hit.score, hit.doc_id, title);
            }
        }
        print!("> ");
        io::stdout().flush().ok();
    }
    Ok(())
}
