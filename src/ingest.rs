//! Ingest pipeline
//!
//! One request: `ingest(upload, schema) -> IngestOutcome`.
//!
//! Pipeline steps:
//! 1. Parse the upload into a workbook
//! 2. Validate it against the schema; any finding stops the request
//! 3. Map rows onto nodes and relationships
//! 4. Persist the graph through the configured sink
//!
//! Nothing is retried. A failed request is resubmitted by the caller once the
//! spreadsheet or schema has been corrected.

use crate::config::Config;
use crate::mapper::{DanglingReference, DuplicateKeyMatch, GraphMapper, MappingError};
use crate::parser::{ParseError, SpreadsheetParser};
use crate::schema::SchemaDescriptor;
use crate::sink::{persist, GraphSink, SinkError};
use crate::validate::{
    SchemaProblem, TypeInconsistency, UniquenessViolation, ValidationReport,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Where a request is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IngestState {
    Uploaded,
    Parsed,
    Validated,
    Mapped,
    Persisted,
    ParseFailed,
    ValidationFailed,
    MappingFailed,
    PersistFailed,
}

impl IngestState {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::ParseFailed | Self::ValidationFailed | Self::MappingFailed | Self::PersistFailed
        )
    }
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Mapping failed: {0}")]
    Mapping(#[from] MappingError),

    #[error("Persisting failed: {0}")]
    Persist(#[from] SinkError),
}

impl IngestError {
    /// The terminal state the request stopped in.
    pub fn state(&self) -> IngestState {
        match self {
            Self::Parse(_) => IngestState::ParseFailed,
            Self::Validation(_) => IngestState::ValidationFailed,
            Self::Mapping(_) => IngestState::MappingFailed,
            Self::Persist(_) => IngestState::PersistFailed,
        }
    }
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }
}

/// Every finding of a request, flattened for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub type_inconsistencies: Vec<TypeInconsistency>,
    pub uniqueness_violations: Vec<UniquenessViolation>,
    pub schema_problems: Vec<SchemaProblem>,
    pub dangling_references: Vec<DanglingReference>,
    pub duplicate_key_matches: Vec<DuplicateKeyMatch>,
}

/// A request that reached `Persisted`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub batch_id: Uuid,
    pub state: IngestState,
    pub node_count: usize,
    pub relationship_count: usize,
    pub report: IngestReport,
}

pub struct IngestPipeline {
    parser: SpreadsheetParser,
    mapper: GraphMapper,
    sink: Arc<dyn GraphSink>,
}

impl IngestPipeline {
    pub fn new(config: &Config, sink: Arc<dyn GraphSink>) -> Self {
        Self {
            parser: SpreadsheetParser::from_config(config),
            mapper: GraphMapper::from_config(config),
            sink,
        }
    }

    /// Run one upload through parse, validate, map and persist.
    pub async fn ingest(
        &self,
        upload: Upload,
        schema: &SchemaDescriptor,
    ) -> Result<IngestOutcome, IngestError> {
        let batch_id = Uuid::new_v4();
        let filename = upload.filename.as_str();
        tracing::info!(%batch_id, filename, state = %IngestState::Uploaded, "ingest started");

        let result = self.run(batch_id, &upload, schema).await;
        if let Err(e) = &result {
            tracing::warn!(%batch_id, filename, state = %e.state(), error = %e, "ingest failed");
        }
        result
    }

    async fn run(
        &self,
        batch_id: Uuid,
        upload: &Upload,
        schema: &SchemaDescriptor,
    ) -> Result<IngestOutcome, IngestError> {
        let workbook = self.parser.parse(&upload.bytes, &upload.filename)?;
        tracing::info!(%batch_id, sheets = workbook.len(), state = %IngestState::Parsed, "ingest advanced");

        let validation = ValidationReport::collect(&workbook, Some(schema));
        if !validation.is_clean() {
            return Err(IngestError::Validation(validation));
        }
        tracing::info!(%batch_id, state = %IngestState::Validated, "ingest advanced");

        let (model, mapping) = self.mapper.map(&workbook, schema)?;
        tracing::info!(
            %batch_id,
            nodes = model.node_count(),
            relationships = model.relationship_count(),
            state = %IngestState::Mapped,
            "ingest advanced"
        );
        for dangling in &mapping.dangling_references {
            tracing::warn!(%batch_id, "dangling reference: {}", dangling);
        }

        let written = persist(&model, self.sink.as_ref()).await?;
        tracing::info!(
            %batch_id,
            nodes = written.nodes_written,
            relationships = written.relationships_written,
            state = %IngestState::Persisted,
            "ingest finished"
        );

        Ok(IngestOutcome {
            batch_id,
            state: IngestState::Persisted,
            node_count: written.nodes_written,
            relationship_count: written.relationships_written,
            report: IngestReport {
                type_inconsistencies: validation.type_inconsistencies,
                uniqueness_violations: validation.uniqueness_violations,
                schema_problems: validation.schema_problems,
                dangling_references: mapping.dangling_references,
                duplicate_key_matches: mapping.duplicate_key_matches,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    const REACTIONS: &str = "REACTION_ID,has_substrate\nR1,\"Molecule A, Molecule Z\"\n";

    #[tokio::test]
    async fn csv_upload_reaches_persisted() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = IngestPipeline::new(&Config::default(), sink.clone());
        let outcome = pipeline
            .ingest(Upload::new("reactions.csv", REACTIONS), &SchemaDescriptor::new())
            .await
            .unwrap();
        assert_eq!(outcome.state, IngestState::Persisted);
        assert_eq!(outcome.node_count, 1);
        assert_eq!(sink.node_count(), 1);
    }

    #[tokio::test]
    async fn unsupported_file_is_parse_failed() {
        let pipeline = IngestPipeline::new(&Config::default(), Arc::new(MemorySink::new()));
        let err = pipeline
            .ingest(Upload::new("notes.txt", "hello"), &SchemaDescriptor::new())
            .await
            .unwrap_err();
        assert_eq!(err.state(), IngestState::ParseFailed);
        assert!(err.state().is_failure());
    }

    #[tokio::test]
    async fn duplicate_ids_are_validation_failed() {
        let pipeline = IngestPipeline::new(&Config::default(), Arc::new(MemorySink::new()));
        let err = pipeline
            .ingest(
                Upload::new("reactions.csv", "REACTION_ID\nR1\nR1\n"),
                &SchemaDescriptor::new(),
            )
            .await
            .unwrap_err();
        let IngestError::Validation(report) = err else {
            panic!("expected validation failure, got {:?}", err);
        };
        assert_eq!(report.uniqueness_violations[0].duplicates[0].rows, vec![2, 3]);
    }

    #[test]
    fn upload_from_path_keeps_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reactions.csv");
        std::fs::write(&path, REACTIONS).unwrap();
        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.filename, "reactions.csv");
        assert_eq!(upload.bytes, REACTIONS.as_bytes());
    }
}
