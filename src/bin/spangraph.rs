//! spangraph CLI: span-chunking knowledge graph builder with MCP server.
//!
//! Usage:
//!   spangraph enrich <documents.json> [--index] [--output path] [--config path]
//!   spangraph suggest|graph|summarize|explore ... [--config path]
//!   spangraph preflabel <show|count|reset> [--config path]
//!   spangraph mcp [--transport stdio] [--config path]

use clap::{Parser, Subcommand};
use spangraph::{
    default_data_dir, AnnotatedDocument, Config, Enricher, EnrichmentBatch, FacetLimits, GraphQuery, IndexQuery,
    IndexSchema, OpenStore, PreflabelStore, SqlitePreflabelStore, DEFAULT_SUGGESTIONS,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spangraph",
    version,
    about = "Span-chunking knowledge graph builder"
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, group and canonicalize a JSON array of annotated documents
    Enrich {
        /// File holding the annotated documents
        input: PathBuf,
        /// Index the groups and enriched documents into the backend
        #[arg(long)]
        index: bool,
        /// Write the enriched payloads to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Suggest concept (or predicate) labels for a prefix
    Suggest {
        prefix: String,
        /// Suggest predicates instead of concepts
        #[arg(long)]
        predicates: bool,
        #[arg(long, default_value_t = DEFAULT_SUGGESTIONS)]
        count: usize,
    },
    /// Print the subject → predicate → object tree of a concept
    Graph {
        subject: String,
        #[arg(long, default_value_t = 10)]
        branches: usize,
        #[arg(long, default_value_t = 5)]
        objects: usize,
        /// Print JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },
    /// Top concept and predicate labels of the graph index
    Summarize {
        #[arg(long, default_value_t = 1)]
        min_count: u64,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Walk the concepts suggested for a prefix and the verbs near each
    Explore {
        prefix: String,
        #[arg(long, default_value_t = DEFAULT_SUGGESTIONS)]
        count: usize,
        #[arg(long, default_value_t = 10)]
        branches: usize,
    },
    /// Inspect or reset the preflabel store
    Preflabel {
        #[command(subcommand)]
        action: PreflabelAction,
    },
    /// Start the MCP (Model Context Protocol) server
    Mcp {
        /// Transport type (currently only stdio)
        #[arg(long, default_value = "stdio")]
        transport: String,
    },
}

#[derive(Subcommand)]
enum PreflabelAction {
    /// Show the stored record for a key
    Show { key: String },
    /// Number of stored keys
    Count,
    /// Delete every stored preflabel
    Reset,
}

/// Default config location (~/.local/share/spangraph/config.yaml)
fn default_config_path() -> PathBuf {
    default_data_dir().join("config.yaml")
}

fn load_config(path: Option<PathBuf>) -> Result<Config, String> {
    let path = path.unwrap_or_else(default_config_path);
    Config::load(&path).map_err(|e| format!("Failed to load config {}: {}", path.display(), e))
}

fn open_store(config: &Config) -> Result<SqlitePreflabelStore, String> {
    let path = config.preflabel_db_path();
    SqlitePreflabelStore::open(&path).map_err(|e| format!("Failed to open preflabel store {}: {}", path.display(), e))
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create tokio runtime: {}", e))
}

fn read_documents(path: &Path) -> Result<Vec<AnnotatedDocument>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid documents in {}: {}", path.display(), e))
}

fn print_batch(batch: &EnrichmentBatch) {
    println!(
        "{} documents, {} concept groups, {} predicate groups",
        batch.documents.len(),
        batch.concept_groups.len(),
        batch.predicate_groups.len()
    );
    for error in &batch.errors {
        eprintln!("Warning: {}", error);
    }
}

async fn index_batch(config: &Config, batch: &EnrichmentBatch) -> Result<(), String> {
    let graph = GraphQuery::connect(config).map_err(|e| e.to_string())?;
    graph
        .ensure_index(&IndexSchema::default())
        .await
        .map_err(|e| format!("Failed to create graph index: {}", e))?;
    let outcome = graph.index(batch).await;
    if let Err(e) = &outcome.predicates {
        eprintln!("Error: predicate indexing failed: {}", e);
    }
    if let Err(e) = &outcome.concepts {
        eprintln!("Error: concept indexing failed: {}", e);
    }

    let content = IndexQuery::connect(config).map_err(|e| e.to_string())?;
    content
        .ensure_index()
        .await
        .map_err(|e| format!("Failed to create content index: {}", e))?;
    let report = content.index_batch(batch).await.map_err(|e| e.to_string())?;
    println!("Indexed {} graph documents, {} content documents", outcome.indexed(), report.indexed);

    if outcome.is_complete() && report.is_complete() {
        Ok(())
    } else {
        Err("some documents were not indexed".to_string())
    }
}

fn cmd_enrich(config: &Config, input: &Path, index: bool, output: Option<&Path>) -> i32 {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let documents = match read_documents(input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let enricher = Enricher::new(config.enrich.clone(), Arc::new(store));
        let batch = match enricher.enrich_concurrent(documents).await {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };
        print_batch(&batch);

        if let Some(path) = output {
            let written = serde_json::to_string_pretty(&batch.documents)
                .map_err(|e| e.to_string())
                .and_then(|text| std::fs::write(path, text).map_err(|e| e.to_string()));
            if let Err(e) = written {
                eprintln!("Error: failed to write {}: {}", path.display(), e);
                return 1;
            }
        }

        if index {
            if let Err(e) = index_batch(config, &batch).await {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        0
    })
}

fn with_graph<F, Fut>(config: &Config, f: F) -> i32
where
    F: FnOnce(GraphQuery) -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    let graph = match GraphQuery::connect(config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match rt.block_on(f(graph)) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_suggest(config: &Config, prefix: String, predicates: bool, count: usize) -> i32 {
    with_graph(config, |graph| async move {
        let result = if predicates {
            graph.suggest_predicates(&prefix, count).await
        } else {
            graph.suggest_concepts(&prefix, count).await
        };
        for s in result.map_err(|e| e.to_string())? {
            println!("{} ({})", s.term, s.weight);
        }
        Ok(())
    })
}

fn cmd_graph(config: &Config, subject: String, branches: usize, objects: usize, json: bool) -> i32 {
    with_graph(config, |graph| async move {
        let tree = graph
            .graph(&subject, branches, objects)
            .await
            .map_err(|e| e.to_string())?;
        if json {
            println!("{}", serde_json::to_string_pretty(&tree).map_err(|e| e.to_string())?);
        } else if tree.is_empty() {
            println!("No predicates found for '{}'", subject);
        } else {
            print!("{}", tree.render());
        }
        Ok(())
    })
}

fn cmd_summarize(config: &Config, limits: FacetLimits) -> i32 {
    with_graph(config, |graph| async move {
        let summary = graph.summarize(limits).await.map_err(|e| e.to_string())?;
        println!("Concepts:");
        for c in &summary.concepts {
            println!("  {} ({})", c.term, c.count);
        }
        println!("Predicates:");
        for p in &summary.predicates {
            println!("  {} ({})", p.term, p.count);
        }
        Ok(())
    })
}

fn cmd_explore(config: &Config, prefix: String, count: usize, branches: usize) -> i32 {
    with_graph(config, |graph| async move {
        let found = graph
            .explore(&prefix, count, branches)
            .await
            .map_err(|e| e.to_string())?;
        for entry in found {
            let verbs: Vec<String> = entry
                .verbs
                .iter()
                .map(|v| format!("{}({})", v.term, v.count))
                .collect();
            println!("{} ({})", entry.concept.term, entry.concept.weight);
            println!("    {}", verbs.join(", "));
        }
        Ok(())
    })
}

fn cmd_preflabel(config: &Config, action: PreflabelAction) -> i32 {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let result = match action {
        PreflabelAction::Show { key } => store.record(&key).map(|record| match record {
            Some(r) => println!("{}\t{}\t{}\t{}", r.key, r.preflabel, r.total, r.created_at.to_rfc3339()),
            None => println!("No preflabel for '{}'", key),
        }),
        PreflabelAction::Count => store.count().map(|n| println!("{}", n)),
        PreflabelAction::Reset => store.reset().map(|()| println!("Preflabel store reset")),
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "spangraph=info".parse() {
        filter = filter.add_directive(directive);
    }
    // stdout carries command output and MCP traffic
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = match load_config(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Enrich { input, index, output } => cmd_enrich(&config, &input, index, output.as_deref()),
        Commands::Suggest {
            prefix,
            predicates,
            count,
        } => cmd_suggest(&config, prefix, predicates, count),
        Commands::Graph {
            subject,
            branches,
            objects,
            json,
        } => cmd_graph(&config, subject, branches, objects, json),
        Commands::Summarize { min_count, limit } => cmd_summarize(&config, FacetLimits { min_count, limit }),
        Commands::Explore {
            prefix,
            count,
            branches,
        } => cmd_explore(&config, prefix, count, branches),
        Commands::Preflabel { action } => cmd_preflabel(&config, action),
        Commands::Mcp { transport } => {
            if transport != "stdio" {
                eprintln!("error: only 'stdio' transport is currently supported");
                std::process::exit(1);
            }
            spangraph::mcp::run_mcp_server(&config)
        }
    };
    std::process::exit(code);
}
