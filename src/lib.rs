//! sheetgraph: spreadsheet to graph mapping and validation
//!
//! Takes an uploaded workbook plus a schema descriptor (which sheets join on
//! which key, which columns point at rows of another sheet), validates it,
//! and turns every row into a node and every link into a typed relationship.
//!
//! # Core Concepts
//!
//! - **Workbook**: parsed sheets, each an ordered table of typed cells
//! - **SchemaDescriptor**: sheet connections and sheet references
//! - **ValidationReport**: every type, uniqueness and schema problem at once
//! - **GraphModel**: the nodes and relationships handed to a `GraphSink`
//!
//! # Example
//!
//! ```
//! use sheetgraph::{map, parse, validate, SchemaDescriptor};
//!
//! let csv = "REACTION_ID,temperature\nR1,25\nR2,30\n";
//! let workbook = parse(csv.as_bytes(), "reactions.csv").unwrap();
//! let schema = SchemaDescriptor::new();
//! validate(&workbook, Some(&schema)).unwrap();
//! let (model, _report) = map(&workbook, &schema).unwrap();
//! assert_eq!(model.node_count(), 2);
//! ```

pub mod config;
pub mod graph;
pub mod ingest;
pub mod mapper;
pub mod parser;
pub mod schema;
pub mod sheet;
pub mod sink;
pub mod storage;
pub mod validate;

pub use config::{Config, ConfigError};
pub use graph::{GraphModel, Node, NodeId, NodeKey, Relationship};
pub use ingest::{IngestError, IngestOutcome, IngestPipeline, IngestReport, IngestState, Upload};
pub use mapper::{map, GraphMapper, MappingError, MappingReport};
pub use parser::{parse, ParseError, SpreadsheetFormat, SpreadsheetParser};
pub use schema::{DataType, SchemaDescriptor, SchemaError, SheetConnection, SheetReference};
pub use sheet::{CellValue, SheetTable, ValueKind, Workbook};
pub use sink::{persist, CypherSink, GraphSink, MemorySink, PersistResult, SinkError};
pub use storage::{GraphStore, OpenStore, SqliteStore, StorageError, StorageResult};
pub use validate::{infer_schema, validate, ValidationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
