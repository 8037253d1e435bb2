use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use docqa_cli::{init_logging, load_config, App};

#[derive(Parser)]
#[command(name = "docqa", version, about = "Chunk, embed and search local text documents")]
struct Cli {
    /// Directory holding config.toml; relative index paths resolve here
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Print outcomes as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index .txt/.md files or directories, replacing earlier versions
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Rank indexed chunks against a question
    Query {
        text: String,
        /// Only search this document
        #[arg(long)]
        doc: Option<String>,
        /// Number of results (default: retrieval.top_k)
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Remove every vector of a document
    Delete { id: String },
    /// Show indexed documents
    List,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli.config_dir)?;
    let settings = config.settings()?;
    init_logging(&settings.logging);
    let app = App::open(&config)?.with_progress(!cli.json);

    let ok = match cli.command {
        Command::Ingest { paths } => {
            let outcomes = app.ingest(&paths)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for o in &outcomes {
                    let mark = if !o.success { "❌" } else if o.skipped_count > 0 { "⚠️ " } else { "✅" };
                    println!("{} {}: {}", mark, o.document_id, o.message);
                    for f in &o.failures { println!("     chunk {}: {}", f.position, f.reason); }
                }
                let indexed: usize = outcomes.iter().map(|o| o.inserted_count).sum();
                println!("📊 {} files, {} chunks indexed", outcomes.len(), indexed);
            }
            outcomes.iter().all(|o| o.success)
        }
        Command::Query { text, doc, k } => {
            let outcome = app.query(&text, doc.as_deref(), k);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if !outcome.success {
                eprintln!("❌ {}", outcome.message);
            } else {
                println!("🔍 Found {} results for: \"{}\"", outcome.results.len(), text);
                for (i, r) in outcome.results.iter().enumerate() {
                    println!("\n  {}. score={:.4}  doc={}  chunk={}", i + 1, r.score, r.document_id, r.position);
                    println!("     📝 {}", r.text);
                }
                if outcome.skipped > 0 {
                    println!("\n⚠️  {} chunks skipped: embedding dimension differs from the query", outcome.skipped);
                }
            }
            outcome.success
        }
        Command::Delete { id } => {
            let outcome = app.delete(&id);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if outcome.success {
                println!("🗑️  {}: {}", outcome.document_id, outcome.message);
            } else {
                eprintln!("❌ {}: {}", outcome.document_id, outcome.message);
            }
            outcome.success
        }
        Command::List => {
            let docs = app.list()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&docs)?);
            } else if docs.is_empty() {
                println!("Index is empty");
            } else {
                for d in &docs {
                    let dim = d.dimension.map(|n| n.to_string()).unwrap_or_else(|| "mixed".to_string());
                    println!("{}  chunks={}  dim={}", d.document_id, d.chunk_count, dim);
                }
            }
            true
        }
    };
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
