//! conceptgraph CLI: load, inspect and query a concept knowledge graph.
//!
//! Usage:
//!   conceptgraph import <file> [--replace] [--db path]
//!   conceptgraph path <from> <to>
//!   conceptgraph learn <start> [--depth N]
//!   conceptgraph --memory --load <file> stats

use clap::{Parser, Subcommand};
use conceptgraph::interchange::{GraphDocument, ImportReport};
use conceptgraph::{
    export_graph, import_graph, replace_graph, BackendKind, Config, Direction, NodeFilter, NodeId,
    NodeType, QueryEngine, RelationshipFilter, RelationshipType,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "conceptgraph",
    version,
    about = "Knowledge graph of computer-science concepts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file
    #[arg(long, global = true, conflicts_with = "memory")]
    db: Option<PathBuf>,
    /// Use a throwaway in-memory graph. It starts empty on every run, so
    /// pair it with --load to query a document without a database.
    #[arg(long, global = true)]
    memory: bool,
    /// Import this document into the in-memory graph before the command runs
    #[arg(long, global = true, requires = "memory")]
    load: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a JSON graph document
    Import {
        /// Document to read
        file: PathBuf,
        /// Clear the store first instead of adding to it
        #[arg(long)]
        replace: bool,
    },
    /// Export the whole graph as a JSON document
    Export {
        /// Destination file
        file: PathBuf,
    },
    /// Show node and relationship counts
    Stats,
    /// Show a single node
    Node {
        /// Node id
        id: String,
    },
    /// Find the shortest path between two nodes
    Path {
        from: String,
        to: String,
    },
    /// Derive a learning path from a starting concept
    Learn {
        start: String,
        /// Maximum hops from the start
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Search nodes by text, type or language
    Search {
        /// Case-insensitive text matched against name and description
        text: Option<String>,
        /// Node type (concept, language, technology, library, tool)
        #[arg(long = "type")]
        node_type: Option<NodeType>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List relationships, optionally by type and endpoint
    Relationships {
        /// Relationship type (e.g. depends_on)
        #[arg(long = "type")]
        relationship_type: Option<RelationshipType>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Delete every node and relationship
    Clear,
    /// List relationships around a node
    Neighbors {
        id: String,
        /// outgoing, incoming or both
        #[arg(long, default_value = "both")]
        direction: Direction,
    },
}

fn load_config(cli: &Cli) -> Result<Config, String> {
    let mut config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(ref db) = cli.db {
        config.backend = BackendKind::Persistent;
        config.persistent.path = Some(db.clone());
    }
    if cli.memory {
        config.backend = BackendKind::Memory;
    }
    Ok(config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_document(engine: &QueryEngine, file: &Path, replace: bool) -> Result<ImportReport, String> {
    let document = GraphDocument::from_path(file)
        .map_err(|e| format!("cannot read '{}': {}", file.display(), e))?;

    let issues = document.validate();
    for warning in &issues.warnings {
        eprintln!("Warning: {}", warning);
    }

    if replace {
        replace_graph(engine.store(), &document).map_err(|e| e.to_string())
    } else {
        Ok(import_graph(engine.store(), &document))
    }
}

fn cmd_import(engine: &QueryEngine, file: &Path, replace: bool) -> i32 {
    let report = match load_document(engine, file, replace) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    for error in &report.errors {
        eprintln!("Error: {}", error);
    }
    println!(
        "Imported {} nodes, {} relationships ({} errors)",
        report.nodes,
        report.relationships,
        report.errors.len()
    );
    if report.errors.is_empty() {
        0
    } else {
        1
    }
}

fn cmd_export(engine: &QueryEngine, file: &Path) -> i32 {
    let result = export_graph(engine.store())
        .map_err(|e| e.to_string())
        .and_then(|doc| {
            doc.write_to_path(file).map_err(|e| e.to_string())?;
            Ok(doc)
        });
    match result {
        Ok(doc) => {
            println!(
                "Exported {} nodes, {} relationships to '{}'",
                doc.nodes.len(),
                doc.relationships.len(),
                file.display()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_counts(title: &str, counts: &std::collections::BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    println!("{}:", title);
    for (key, count) in counts {
        println!("  {:<24}  {:>7}", key, count);
    }
}

fn cmd_stats(engine: &QueryEngine) -> i32 {
    match engine.statistics() {
        Ok(stats) => {
            println!("Nodes:          {}", stats.node_count);
            println!("Relationships:  {}", stats.relationship_count);
            println!("Components:     {}", stats.component_count);
            print_counts("By node type", &stats.counts_by_node_type);
            print_counts("By relationship type", &stats.counts_by_relationship_type);
            print_counts("By difficulty", &stats.counts_by_difficulty_level);
            print_counts("By language", &stats.counts_by_language);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_node(engine: &QueryEngine, id: &str) -> i32 {
    let result = engine
        .store()
        .get_node(&NodeId::from(id))
        .map_err(|e| e.to_string())
        .and_then(|node| serde_json::to_string_pretty(&node).map_err(|e| e.to_string()));
    match result {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_path(engine: &QueryEngine, from: &str, to: &str) -> i32 {
    match engine.shortest_path(&NodeId::from(from), &NodeId::from(to)) {
        Ok(path) => {
            let names: Vec<&str> = path.nodes.iter().map(|n| n.id.as_str()).collect();
            println!("{}", names.join(" -> "));
            println!("({} hops)", path.length);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_learn(engine: &QueryEngine, start: &str, depth: Option<usize>) -> i32 {
    match engine.learning_path(&NodeId::from(start), depth) {
        Ok(path) => {
            for step in &path.steps {
                println!(
                    "{}{} ({})",
                    "  ".repeat(step.depth),
                    step.node.name,
                    step.node.id
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_search(engine: &QueryEngine, filter: NodeFilter) -> i32 {
    match engine.search(&filter) {
        Ok(nodes) => {
            if nodes.is_empty() {
                println!("No matching nodes.");
                return 0;
            }
            println!("{:<28}  {:<12}  {:<10}  {}", "ID", "TYPE", "LANGUAGE", "NAME");
            println!("{}", "-".repeat(78));
            for node in nodes {
                println!(
                    "{:<28}  {:<12}  {:<10}  {}",
                    node.id.as_str(),
                    node.node_type.as_str(),
                    node.language.as_deref().unwrap_or("-"),
                    node.name
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_relationships(engine: &QueryEngine, filter: RelationshipFilter) -> i32 {
    match engine.relationships(&filter) {
        Ok(relationships) => {
            if relationships.is_empty() {
                println!("No matching relationships.");
                return 0;
            }
            for rel in relationships {
                println!(
                    "{:<16}  {} -> {}  ({})",
                    rel.id.as_str(),
                    rel.source_id,
                    rel.target_id,
                    rel.relationship_type
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_clear(engine: &QueryEngine) -> i32 {
    match engine.store().clear() {
        Ok(()) => {
            println!("Cleared graph");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_neighbors(engine: &QueryEngine, id: &str, direction: Direction) -> i32 {
    let node_id = NodeId::from(id);
    match engine.neighbors(&node_id, direction) {
        Ok(pairs) => {
            if pairs.is_empty() {
                println!("No relationships.");
                return 0;
            }
            for (rel, other) in pairs {
                let arrow = if rel.source_id == node_id { "->" } else { "<-" };
                println!("{} {} {} ({})", arrow, rel.relationship_type, other.id, other.name);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log_level);

    let engine = match config.open_store() {
        Ok(store) => QueryEngine::new(store),
        Err(e) => {
            eprintln!("Error: failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(ref file) = cli.load {
        match load_document(&engine, file, false) {
            Ok(report) if report.errors.is_empty() => {}
            Ok(report) => {
                for error in &report.errors {
                    eprintln!("Error: {}", error);
                }
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let code = match cli.command {
        Commands::Import { file, replace } => cmd_import(&engine, &file, replace),
        Commands::Export { file } => cmd_export(&engine, &file),
        Commands::Stats => cmd_stats(&engine),
        Commands::Node { id } => cmd_node(&engine, &id),
        Commands::Path { from, to } => cmd_path(&engine, &from, &to),
        Commands::Learn { start, depth } => cmd_learn(&engine, &start, depth),
        Commands::Search {
            text,
            node_type,
            language,
            limit,
        } => {
            let mut filter = NodeFilter::new();
            filter.search_text = text;
            filter.node_type = node_type;
            filter.language = language;
            filter.limit = limit;
            cmd_search(&engine, filter)
        }
        Commands::Relationships {
            relationship_type,
            from,
            to,
        } => cmd_relationships(
            &engine,
            RelationshipFilter {
                relationship_type,
                source: from.map(NodeId::from),
                target: to.map(NodeId::from),
            },
        ),
        Commands::Clear => cmd_clear(&engine),
        Commands::Neighbors { id, direction } => cmd_neighbors(&engine, &id, direction),
    };
    std::process::exit(code);
}
