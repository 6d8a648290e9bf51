//! Attestor CLI — resolve an annotation graph and write the claim report.
//!
//! Usage:
//!   attestor report --graph <triples.json> [--corpus path] [--out dir] [--verbose] [--persist]
//!   attestor corpus import --jsonl <file> [--db path]

use attestor::resolve::persist_inferences;
use attestor::{
    Hypothesis, MemoryGraph, ReportOptions, ReportWriter, SqliteCorpus,
};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "attestor",
    version,
    about = "Claim-evidence report engine for semantic annotation graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an annotation graph and write the HTML report
    Report {
        /// Annotation graph as a JSON triple list
        #[arg(long)]
        graph: PathBuf,
        /// Path to the SQLite corpus database
        #[arg(long)]
        corpus: Option<PathBuf>,
        /// Directory to write the report into
        #[arg(long, default_value = "./attestor_report")]
        out: PathBuf,
        /// List names, handles and types per record
        #[arg(long, short)]
        verbose: bool,
        /// Write inferred Place triples back into the graph file
        #[arg(long)]
        persist: bool,
    },
    /// Manage the document corpus
    Corpus {
        #[command(subcommand)]
        action: CorpusAction,
        /// Path to the SQLite corpus database
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CorpusAction {
    /// Import documents from JSONL (one document object per line)
    Import {
        /// JSONL file to import
        #[arg(required = true)]
        jsonl: PathBuf,
    },
}

/// Get the default corpus path (~/.local/share/attestor/corpus.db)
fn default_corpus_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let attestor_dir = data_dir.join("attestor");
    std::fs::create_dir_all(&attestor_dir).ok();
    attestor_dir.join("corpus.db")
}

fn cmd_report(
    graph_path: PathBuf,
    corpus_path: Option<PathBuf>,
    out_dir: PathBuf,
    verbose: bool,
    persist: bool,
) -> i32 {
    let graph_file = match File::open(&graph_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: cannot open graph {}: {}", graph_path.display(), e);
            return 1;
        }
    };
    let mut graph = match MemoryGraph::from_json_reader(graph_file) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: cannot load graph {}: {}", graph_path.display(), e);
            return 1;
        }
    };

    let corpus_path = corpus_path.unwrap_or_else(default_corpus_path);
    let corpus = match SqliteCorpus::open(&corpus_path) {
        Ok(corpus) => corpus,
        Err(e) => {
            eprintln!("Error: cannot open corpus {}: {}", corpus_path.display(), e);
            return 1;
        }
    };

    let hypothesis = match Hypothesis::from_graph(&graph) {
        Ok(hypothesis) => hypothesis,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let writer = ReportWriter::new(&corpus, ReportOptions { verbose });
    let report_path = match writer.write_to_dir(&hypothesis, &out_dir) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if persist && !hypothesis.inferred_places.is_empty() {
        let appended = persist_inferences(&mut graph, &hypothesis.inferred_places);
        let result = File::create(&graph_path)
            .map_err(attestor::GraphError::from)
            .and_then(|file| graph.to_json_writer(file));
        match result {
            Ok(()) => println!(
                "Appended {} inferred triples to {}",
                appended,
                graph_path.display()
            ),
            Err(e) => {
                eprintln!("Error: cannot write graph {}: {}", graph_path.display(), e);
                return 1;
            }
        }
    }

    for warning in &hypothesis.warnings {
        eprintln!("warning: {}", warning);
    }
    println!(
        "Report: {} ({} events, {} relations, {} inferred places, {} warnings)",
        report_path.display(),
        hypothesis.events.len(),
        hypothesis.relations.len(),
        hypothesis.inferred_places.len(),
        hypothesis.warnings.len()
    );
    0
}

fn cmd_corpus_import(db: Option<PathBuf>, jsonl: PathBuf) -> i32 {
    let db_path = db.unwrap_or_else(default_corpus_path);
    let corpus = match SqliteCorpus::open(&db_path) {
        Ok(corpus) => corpus,
        Err(e) => {
            eprintln!("Error: cannot open corpus {}: {}", db_path.display(), e);
            return 1;
        }
    };
    let file = match File::open(&jsonl) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", jsonl.display(), e);
            return 1;
        }
    };
    match corpus.import_jsonl(file) {
        Ok(count) => {
            println!("Imported {} documents into {}", count, db_path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Report {
            graph,
            corpus,
            out,
            verbose,
            persist,
        } => cmd_report(graph, corpus, out, verbose, persist),
        Commands::Corpus { action, db } => match action {
            CorpusAction::Import { jsonl } => cmd_corpus_import(db, jsonl),
        },
    };
    std::process::exit(code);
}
