//! sheetgraph CLI: validate spreadsheets and load them as graphs.
//!
//! Usage:
//!   sheetgraph inspect <file>
//!   sheetgraph validate <file> [--schema path | --saved name]
//!   sheetgraph ingest <file> [--schema path | --saved name] [--cypher]
//!   sheetgraph schema <save|show|delete|list> [--db path]

use clap::{Parser, Subcommand};
use serde::Serialize;
use sheetgraph::{
    infer_schema, CellValue, Config, CypherSink, GraphSink, GraphStore, IngestError,
    IngestPipeline, IngestState, OpenStore, SchemaDescriptor, SpreadsheetParser, SqliteStore,
    Upload, ValidationReport,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "sheetgraph",
    version,
    about = "Spreadsheet to graph mapping and validation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct SchemaSource {
    /// Schema descriptor file (.json, .yaml or .yml)
    #[arg(long, conflicts_with = "saved")]
    schema: Option<PathBuf>,
    /// Name of a schema saved with `schema save`
    #[arg(long)]
    saved: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a spreadsheet and print its inferred schema
    Inspect {
        /// Spreadsheet to read (.xlsx, .xls or .csv)
        file: PathBuf,
    },
    /// Validate a spreadsheet, optionally against a schema
    Validate {
        file: PathBuf,
        #[command(flatten)]
        source: SchemaSource,
    },
    /// Validate, map and persist a spreadsheet
    Ingest {
        file: PathBuf,
        #[command(flatten)]
        source: SchemaSource,
        /// Print Cypher statements instead of writing to the database
        #[arg(long)]
        cypher: bool,
    },
    /// Manage saved schemas
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
}

#[derive(Subcommand)]
enum SchemaAction {
    /// Save a schema descriptor under a name
    Save {
        name: String,
        /// Schema descriptor file (.json, .yaml or .yml)
        file: PathBuf,
    },
    /// Print a saved schema as JSON
    Show { name: String },
    /// Delete a saved schema
    Delete { name: String },
    /// List saved schemas
    List,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Get the default database path (~/.local/share/sheetgraph/sheetgraph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("sheetgraph").join("sheetgraph.db")
}

fn open_store(db: Option<&Path>, config: &Config) -> Result<SqliteStore, String> {
    let db_path = db
        .map(Path::to_path_buf)
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path)
        .map_err(|e| format!("Failed to open database {}: {}", db_path.display(), e))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
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

fn read_upload(file: &Path) -> Result<Upload, String> {
    Upload::from_path(file).map_err(|e| format!("cannot read '{}': {}", file.display(), e))
}

/// Resolve `--schema` / `--saved`; `None` when neither was given.
fn load_schema(
    source: &SchemaSource,
    db: Option<&Path>,
    config: &Config,
) -> Result<Option<SchemaDescriptor>, String> {
    if let Some(path) = &source.schema {
        return SchemaDescriptor::from_path(path)
            .map(Some)
            .map_err(|e| format!("cannot load schema '{}': {}", path.display(), e));
    }
    if let Some(name) = &source.saved {
        let store = open_store(db, config)?;
        return match store.load_schema(name) {
            Ok(Some(schema)) => Ok(Some(schema)),
            Ok(None) => Err(format!("saved schema '{}' not found", name)),
            Err(e) => Err(e.to_string()),
        };
    }
    Ok(None)
}

#[derive(Serialize)]
struct Inspection {
    schema: SchemaDescriptor,
    report: ValidationReport,
    sample: Vec<SheetSample>,
}

#[derive(Serialize)]
struct SheetSample {
    sheet_name: String,
    rows: usize,
    first_row: Vec<(String, CellValue)>,
}

fn cmd_inspect(config: &Config, file: &Path) -> i32 {
    let upload = match read_upload(file) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let parser = SpreadsheetParser::from_config(config);
    let workbook = match parser.parse(&upload.bytes, &upload.filename) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let sample = workbook
        .sheets()
        .iter()
        .map(|table| SheetSample {
            sheet_name: table.name().to_string(),
            rows: table.row_count(),
            first_row: table
                .row(0)
                .map(|row| {
                    row.cells()
                        .map(|(column, value)| (column.to_string(), value.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();
    print_json(&Inspection {
        schema: infer_schema(&workbook),
        report: ValidationReport::collect(&workbook, None),
        sample,
    })
}

fn cmd_validate(config: &Config, db: Option<&Path>, file: &Path, source: &SchemaSource) -> i32 {
    let schema = match load_schema(source, db, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let upload = match read_upload(file) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let parser = SpreadsheetParser::from_config(config);
    let workbook = match parser.parse(&upload.bytes, &upload.filename) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let report = ValidationReport::collect(&workbook, schema.as_ref());
    if print_json(&report) != 0 {
        return 1;
    }
    if report.is_clean() {
        0
    } else {
        eprintln!("{}", report);
        1
    }
}

fn cmd_ingest(
    config: &Config,
    db: Option<&Path>,
    file: &Path,
    source: &SchemaSource,
    cypher: bool,
) -> i32 {
    let schema = match load_schema(source, db, config) {
        Ok(s) => s.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let upload = match read_upload(file) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let cypher_sink = cypher.then(|| Arc::new(CypherSink::new()));
    let sink: Arc<dyn GraphSink> = match &cypher_sink {
        Some(sink) => sink.clone() as Arc<dyn GraphSink>,
        None => match open_store(db, config) {
            Ok(store) => Arc::new(store) as Arc<dyn GraphSink>,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };
    let pipeline = IngestPipeline::new(config, sink);
    match rt.block_on(pipeline.ingest(upload, &schema)) {
        Ok(outcome) => {
            if let Some(sink) = cypher_sink {
                match sink.statements() {
                    Ok(statements) => {
                        for statement in statements {
                            match serde_json::to_string(&statement) {
                                Ok(line) => println!("{}", line),
                                Err(e) => {
                                    eprintln!("Error: {}", e);
                                    return 1;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return 1;
                    }
                }
                eprintln!(
                    "Batch {}: {} nodes, {} relationships",
                    outcome.batch_id, outcome.node_count, outcome.relationship_count
                );
                0
            } else {
                print_json(&outcome)
            }
        }
        Err(IngestError::Validation(report)) => {
            // Exit status is 1 on this path whether or not the report printed
            let _ = print_json(&report);
            eprintln!("Error: {} ({})", IngestState::ValidationFailed, report);
            1
        }
        Err(e) => {
            eprintln!("Error: {} ({})", e.state(), e);
            1
        }
    }
}

fn cmd_schema_save(store: &SqliteStore, name: &str, file: &Path) -> i32 {
    let schema = match SchemaDescriptor::from_path(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot load schema '{}': {}", file.display(), e);
            return 1;
        }
    };
    match store.save_schema(name, &schema) {
        Ok(()) => {
            println!("Saved schema '{}'", name);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_schema_show(store: &SqliteStore, name: &str) -> i32 {
    match store.load_schema(name) {
        Ok(Some(schema)) => print_json(&schema),
        Ok(None) => {
            eprintln!("Error: schema '{}' not found", name);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_schema_delete(store: &SqliteStore, name: &str) -> i32 {
    match store.delete_schema(name) {
        Ok(true) => {
            println!("Deleted schema '{}'", name);
            0
        }
        Ok(false) => {
            eprintln!("Error: schema '{}' not found", name);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_schema_list(store: &SqliteStore) -> i32 {
    let schemas = match store.list_schemas() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if schemas.is_empty() {
        println!("No schemas saved.");
        return 0;
    }
    println!("{:<32}  {:<25}", "NAME", "SAVED");
    println!("{}", "-".repeat(59));
    for schema in schemas {
        println!("{:<32}  {:<25}", schema.name, schema.saved_at.to_rfc3339());
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: cannot load config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    let db = cli.db.as_deref();

    let code = match cli.command {
        Commands::Inspect { file } => cmd_inspect(&config, &file),
        Commands::Validate { file, source } => cmd_validate(&config, db, &file, &source),
        Commands::Ingest {
            file,
            source,
            cypher,
        } => cmd_ingest(&config, db, &file, &source, cypher),
        Commands::Schema { action } => {
            let store = match open_store(db, &config) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match action {
                SchemaAction::Save { name, file } => cmd_schema_save(&store, &name, &file),
                SchemaAction::Show { name } => cmd_schema_show(&store, &name),
                SchemaAction::Delete { name } => cmd_schema_delete(&store, &name),
                SchemaAction::List => cmd_schema_list(&store),
            }
        }
    };
    std::process::exit(code);
}
