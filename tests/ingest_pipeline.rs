//! End-to-end ingest: upload bytes through to a sink

mod common;

use common::{reaction_csv, reaction_xlsx, substrate_schema};
use sheetgraph::storage::NodeFilter;
use sheetgraph::{
    CellValue, CypherSink, GraphStore, IngestError, IngestPipeline, IngestState, MemorySink,
    NodeId, OpenStore, SchemaDescriptor, SqliteStore, Upload,
};
use std::sync::Arc;

#[tokio::test]
async fn test_xlsx_upload_into_memory_sink() {
    let sink = Arc::new(MemorySink::new());
    let pipeline = IngestPipeline::new(&Default::default(), sink.clone());

    let outcome = pipeline
        .ingest(Upload::new("reactions.xlsx", reaction_xlsx()), &substrate_schema())
        .await
        .unwrap();

    assert_eq!(outcome.state, IngestState::Persisted);
    assert_eq!(outcome.node_count, 4);
    // R1 -> A, B; R2 -> A
    assert_eq!(outcome.relationship_count, 3);
    assert_eq!(outcome.report.dangling_references.len(), 1);
    assert_eq!(outcome.report.dangling_references[0].value, "Molecule Z");
    assert!(outcome.report.type_inconsistencies.is_empty());

    let r1 = sink
        .node(&NodeId::for_key("Reaction", "REACTION_ID", "R1"))
        .unwrap();
    assert_eq!(
        r1.property("has_substrate"),
        Some(&CellValue::Text("Molecule A, Molecule B".into()))
    );
    assert_eq!(r1.property("temperature"), Some(&CellValue::Number(25.0)));
    assert_eq!(sink.relationships_of_type("HAS_SUBSTRATE").len(), 3);
}

#[tokio::test]
async fn test_xlsx_upload_into_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("graph.db")).unwrap());
    let pipeline = IngestPipeline::new(&Default::default(), store.clone());
    let schema = substrate_schema();

    pipeline
        .ingest(Upload::new("reactions.xlsx", reaction_xlsx()), &schema)
        .await
        .unwrap();
    // Re-ingesting the same upload upserts rather than duplicating
    pipeline
        .ingest(Upload::new("reactions.xlsx", reaction_xlsx()), &schema)
        .await
        .unwrap();

    let molecules = store.find_nodes(&NodeFilter::new().with_type("Molecule")).unwrap();
    assert_eq!(molecules.len(), 2);
    let reactions = store.find_nodes(&NodeFilter::new().with_type("Reaction")).unwrap();
    assert_eq!(reactions.len(), 2);

    let r1 = NodeId::for_key("Reaction", "REACTION_ID", "R1");
    assert_eq!(store.relationships_from(&r1).unwrap().len(), 2);
}

#[tokio::test]
async fn test_csv_upload_with_blank_reference() {
    let sink = Arc::new(MemorySink::new());
    let pipeline = IngestPipeline::new(&Default::default(), sink.clone());
    // a CSV upload is a single Reaction sheet
    let schema = SchemaDescriptor::new();

    let outcome = pipeline
        .ingest(Upload::new("Reaction.csv", reaction_csv(None)), &schema)
        .await
        .unwrap();
    assert_eq!(outcome.node_count, 2);
    assert_eq!(outcome.relationship_count, 0);

    let r2 = sink
        .node(&NodeId::for_key("Reaction", "REACTION_ID", "R2"))
        .unwrap();
    assert!(r2.property("has_substrate").is_none());
    assert_eq!(r2.property("temperature"), Some(&CellValue::Number(30.0)));
}

#[tokio::test]
async fn test_distinct_uploads_of_keyless_sheet_both_survive() {
    let sink = Arc::new(MemorySink::new());
    let pipeline = IngestPipeline::new(&Default::default(), sink.clone());
    let schema = SchemaDescriptor::new();

    for csv in ["NAME,mass\nwater,18\n", "NAME,mass\nethanol,46\n"] {
        pipeline
            .ingest(Upload::new("Molecule.csv", csv), &schema)
            .await
            .unwrap();
    }

    let mut names: Vec<CellValue> = sink
        .nodes_of_type("Molecule")
        .into_iter()
        .filter_map(|n| n.property("NAME").cloned())
        .collect();
    names.sort_by_key(|v| v.to_string());
    assert_eq!(names, vec![CellValue::from("ethanol"), CellValue::from("water")]);
}

#[tokio::test]
async fn test_validation_failure_reports_every_problem() {
    let sink = Arc::new(MemorySink::new());
    let pipeline = IngestPipeline::new(&Default::default(), sink.clone());

    let err = pipeline
        .ingest(
            Upload::new("Reaction.csv", reaction_csv(Some("R1,,warm"))),
            &substrate_schema(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.state(), IngestState::ValidationFailed);
    let IngestError::Validation(report) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(report.type_inconsistencies.len(), 1);
    assert_eq!(report.type_inconsistencies[0].rows, vec![4]);
    assert_eq!(report.uniqueness_violations.len(), 1);
    // Molecule sheet is missing from a single-sheet CSV
    assert_eq!(report.schema_problems.len(), 1);
    assert_eq!(sink.node_count(), 0);
}

#[tokio::test]
async fn test_cypher_sink_receives_nodes_then_relationships() {
    let sink = Arc::new(CypherSink::new());
    let pipeline = IngestPipeline::new(&Default::default(), sink.clone());

    pipeline
        .ingest(Upload::new("reactions.xlsx", reaction_xlsx()), &substrate_schema())
        .await
        .unwrap();

    let statements = sink.statements().unwrap();
    assert_eq!(statements.len(), 7);
    assert!(statements[..4].iter().all(|s| s.query.starts_with("MERGE (n:")));
    assert!(statements[4..].iter().all(|s| s.query.starts_with("MATCH ")));
}

#[tokio::test]
async fn test_concurrent_ingests_share_a_store() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let pipeline = Arc::new(IngestPipeline::new(&Default::default(), store.clone()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline
                .ingest(Upload::new("reactions.xlsx", reaction_xlsx()), &substrate_schema())
                .await
                .map(|o| o.batch_id)
        }));
    }

    let mut batches = Vec::new();
    for handle in handles {
        batches.push(handle.await.unwrap().unwrap());
    }
    batches.sort();
    batches.dedup();
    assert_eq!(batches.len(), 4);
    assert_eq!(store.find_nodes(&NodeFilter::new()).unwrap().len(), 4);
}
