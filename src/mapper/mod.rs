//! Graph mapping
//!
//! Turns a validated workbook and its schema descriptor into a [`GraphModel`]:
//! one node per row, one relationship per joined row pair of a sheet
//! connection, one relationship per resolved value of a sheet reference.
//! Data-level surprises (dangling references, duplicate join keys) are
//! reported, never fatal.

mod report;

pub use report::{DanglingReference, DuplicateKeyMatch, MappingReport};

use crate::config::Config;
use crate::graph::{GraphModel, Node, NodeId, Properties, Relationship};
use crate::schema::{is_identifier_column, SchemaDescriptor, SheetConnection, SheetReference};
use crate::sheet::{Row, SheetTable, Workbook};
use crate::validate::{check_relations, SchemaProblem};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Schema does not match workbook: {}", join_problems(.0))]
    SchemaMismatch(Vec<SchemaProblem>),
}

fn join_problems(problems: &[SchemaProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Row indices of a sheet grouped by the canonical value of one column,
/// in first-seen order.
struct ValueIndex {
    order: Vec<String>,
    rows: HashMap<String, Vec<usize>>,
}

impl ValueIndex {
    fn build(table: &SheetTable, column: &str) -> Self {
        let mut index = Self {
            order: Vec::new(),
            rows: HashMap::new(),
        };
        for row in table.rows() {
            if let Some(value) = row.get(column).canonical() {
                let entry = index.rows.entry(value.clone()).or_default();
                if entry.is_empty() {
                    index.order.push(value);
                }
                entry.push(row.index());
            }
        }
        index
    }

    fn get(&self, value: &str) -> &[usize] {
        self.rows.get(value).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct GraphMapper {
    reference_delimiter: char,
    key_suffixes: Vec<String>,
}

impl Default for GraphMapper {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl GraphMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            reference_delimiter: config.reference_delimiter,
            key_suffixes: config.key_suffixes.clone(),
        }
    }

    /// Map a workbook onto a graph.
    ///
    /// Fails only when a connection or reference names a sheet or column the
    /// workbook lacks.
    pub fn map(
        &self,
        workbook: &Workbook,
        schema: &SchemaDescriptor,
    ) -> Result<(GraphModel, MappingReport), MappingError> {
        let problems = check_relations(workbook, schema);
        if !problems.is_empty() {
            return Err(MappingError::SchemaMismatch(problems));
        }

        let mut model = GraphModel::new();
        let mut report = MappingReport::default();
        let mut ids: HashMap<&str, Vec<NodeId>> = HashMap::new();

        for table in workbook.sheets() {
            let key_column = self.primary_key(table);
            let mut seen_keys = HashSet::new();
            let sheet_ids = table
                .rows()
                .map(|row| {
                    let node = row_node(table, key_column, row, &mut seen_keys);
                    let id = node.id;
                    model.add_node(node);
                    id
                })
                .collect();
            tracing::debug!(
                sheet = table.name(),
                key = key_column.unwrap_or("<row>"),
                rows = table.row_count(),
                "mapped rows to nodes"
            );
            ids.insert(table.name(), sheet_ids);
        }

        for connection in &schema.sheet_connections {
            self.map_connection(workbook, connection, &ids, &mut model, &mut report);
        }
        for reference in &schema.sheet_references {
            self.map_reference(workbook, reference, &ids, &mut model, &mut report);
        }

        tracing::debug!(
            nodes = model.node_count(),
            relationships = model.relationship_count(),
            dangling = report.dangling_references.len(),
            duplicate_keys = report.duplicate_key_matches.len(),
            "mapped workbook"
        );
        Ok((model, report))
    }

    /// The sheet's single identifier column ending in a key suffix, if any.
    fn primary_key<'a>(&self, table: &'a SheetTable) -> Option<&'a str> {
        let candidates: Vec<&str> = table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| is_identifier_column(c))
            .filter(|c| self.key_suffixes.iter().any(|s| c.ends_with(s.as_str())))
            .collect();
        match candidates.as_slice() {
            [] => None,
            [single] => Some(*single),
            many => {
                tracing::warn!(
                    sheet = table.name(),
                    candidates = ?many,
                    "several primary key columns, identifying rows by row number"
                );
                None
            }
        }
    }

    fn map_connection(
        &self,
        workbook: &Workbook,
        connection: &SheetConnection,
        ids: &HashMap<&str, Vec<NodeId>>,
        model: &mut GraphModel,
        report: &mut MappingReport,
    ) {
        let (Some(source), Some(target)) = (
            workbook.sheet(&connection.source_sheet_name),
            workbook.sheet(&connection.target_sheet_name),
        ) else {
            return;
        };
        let (Some(source_ids), Some(target_ids)) = (ids.get(source.name()), ids.get(target.name()))
        else {
            return;
        };

        let rel_type = connection.relationship_type();
        let source_index = ValueIndex::build(source, &connection.key);
        let target_index = ValueIndex::build(target, &connection.key);
        let mut emitted = 0usize;

        for value in &source_index.order {
            let sources = source_index.get(value);
            let targets = target_index.get(value);
            if targets.is_empty() {
                continue;
            }
            for &s in sources {
                let key_value = source.row(s).map(|r| r.get(&connection.key).clone());
                for &t in targets {
                    let mut rel = Relationship::new(source_ids[s], target_ids[t], rel_type.clone());
                    if let Some(key_value) = &key_value {
                        rel = rel.with_property(connection.key.clone(), key_value.clone());
                    }
                    model.add_relationship(rel);
                    emitted += 1;
                }
            }
            if sources.len() > 1 || targets.len() > 1 {
                report.duplicate_key_matches.push(DuplicateKeyMatch {
                    source_sheet_name: source.name().to_string(),
                    target_sheet_name: target.name().to_string(),
                    key: connection.key.clone(),
                    value: value.clone(),
                    source_count: sources.len(),
                    target_count: targets.len(),
                });
            }
        }
        tracing::debug!(edge = %rel_type, relationships = emitted, "mapped sheet connection");
    }

    fn map_reference(
        &self,
        workbook: &Workbook,
        reference: &SheetReference,
        ids: &HashMap<&str, Vec<NodeId>>,
        model: &mut GraphModel,
        report: &mut MappingReport,
    ) {
        let (Some(source), Some(target)) = (
            workbook.sheet(&reference.source_sheet_name),
            workbook.sheet(&reference.target_sheet_name),
        ) else {
            return;
        };
        let (Some(source_ids), Some(target_ids)) = (ids.get(source.name()), ids.get(target.name()))
        else {
            return;
        };

        let rel_type = reference.relationship_type();
        let lookup = ValueIndex::build(target, &reference.target_column_name);
        let mut emitted = 0usize;

        for row in source.rows() {
            let Some(cell) = row.get(&reference.source_column_name).canonical() else {
                continue;
            };
            for piece in cell
                .split(self.reference_delimiter)
                .map(str::trim)
                .filter(|p| !p.is_empty())
            {
                let matches = lookup.get(piece);
                if matches.is_empty() {
                    report.dangling_references.push(DanglingReference {
                        sheet_name: source.name().to_string(),
                        column: reference.source_column_name.clone(),
                        row: row.number(),
                        value: piece.to_string(),
                        target_sheet_name: target.name().to_string(),
                        target_column_name: reference.target_column_name.clone(),
                    });
                    continue;
                }
                for &t in matches {
                    model.add_relationship(Relationship::new(
                        source_ids[row.index()],
                        target_ids[t],
                        rel_type.clone(),
                    ));
                    emitted += 1;
                }
            }
        }
        tracing::debug!(edge = %rel_type, relationships = emitted, "mapped sheet reference");
    }
}

/// Node for one row, keyed by the primary key value when there is one.
///
/// A key value already used by an earlier row of the sheet falls back to row
/// identity, so every row stays its own node.
fn row_node(
    table: &SheetTable,
    key_column: Option<&str>,
    row: Row<'_>,
    seen_keys: &mut HashSet<String>,
) -> Node {
    let properties: Properties = row
        .cells()
        .filter(|(_, value)| !value.is_blank())
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect();

    if let Some(column) = key_column {
        let value = row.get(column);
        if let Some(canonical) = value.canonical() {
            if seen_keys.insert(canonical) {
                let mut node = Node::keyed(table.name(), column, value.clone());
                node.properties = properties;
                return node;
            }
            tracing::warn!(
                sheet = table.name(),
                column,
                row = row.number(),
                value = %value,
                "repeated primary key, identifying row by row number"
            );
        }
    }
    Node::for_row(table.name(), row.number(), properties)
}

/// Map with the default delimiter and key suffixes.
pub fn map(
    workbook: &Workbook,
    schema: &SchemaDescriptor,
) -> Result<(GraphModel, MappingReport), MappingError> {
    GraphMapper::new().map(workbook, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKey;
    use crate::sheet::CellValue;

    fn reactions() -> SheetTable {
        SheetTable::from_rows(
            "Reaction",
            &["REACTION_ID", "has_substrate", "temperature"],
            vec![
                vec!["R1".into(), "Molecule A, Molecule B".into(), CellValue::Number(25.0)],
                vec!["R2".into(), CellValue::Blank, CellValue::Blank],
            ],
        )
    }

    fn molecules() -> SheetTable {
        SheetTable::from_rows(
            "Molecule",
            &["NAME", "mass"],
            vec![
                vec!["Molecule A".into(), CellValue::Number(18.0)],
                vec!["Molecule B".into(), CellValue::Number(44.0)],
            ],
        )
    }

    fn substrate_schema() -> SchemaDescriptor {
        SchemaDescriptor::new().with_reference(SheetReference::new(
            "Reaction",
            "has_substrate",
            "Molecule",
            "NAME",
        ))
    }

    #[test]
    fn one_node_per_row_without_blank_properties() {
        let wb = Workbook::from_tables([reactions(), molecules()]);
        let (model, _) = map(&wb, &SchemaDescriptor::new()).unwrap();
        assert_eq!(model.node_count(), 4);
        assert_eq!(model.relationship_count(), 0);

        let r2 = model
            .nodes_of_type("Reaction")
            .find(|n| n.property("REACTION_ID") == Some(&"R2".into()))
            .unwrap();
        assert_eq!(r2.properties.len(), 1);
        assert!(matches!(&r2.key, NodeKey::Column { column, .. } if column == "REACTION_ID"));
    }

    #[test]
    fn sheet_without_key_suffix_uses_row_identity() {
        let wb = Workbook::from_tables([molecules()]);
        let (model, _) = map(&wb, &SchemaDescriptor::new()).unwrap();
        let first = &model.nodes()[0];
        assert_eq!(first.key, NodeKey::Row { number: 2 });
        assert_eq!(first.id, NodeId::for_row("Molecule", 2, &first.properties));
    }

    #[test]
    fn repeated_primary_key_keeps_one_node_per_row() {
        let table = SheetTable::from_rows(
            "Reaction",
            &["REACTION_ID", "temperature"],
            vec![
                vec!["R1".into(), CellValue::Number(25.0)],
                vec!["R1".into(), CellValue::Number(30.0)],
            ],
        );
        let (model, _) = map(&Workbook::from_tables([table]), &SchemaDescriptor::new()).unwrap();
        assert_eq!(model.node_count(), 2);

        let first = &model.nodes()[0];
        assert_eq!(first.id, NodeId::for_key("Reaction", "REACTION_ID", "R1"));
        assert_eq!(first.property("temperature"), Some(&CellValue::Number(25.0)));
        let second = &model.nodes()[1];
        assert_eq!(second.key, NodeKey::Row { number: 3 });
        assert_eq!(second.property("temperature"), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn rows_without_keys_differ_across_uploads() {
        let upload = |name: &str| {
            let table = SheetTable::from_rows("Molecule", &["NAME"], vec![vec![name.into()]]);
            Workbook::from_tables([table])
        };
        let schema = SchemaDescriptor::new();
        let (first, _) = map(&upload("water"), &schema).unwrap();
        let (second, _) = map(&upload("ethanol"), &schema).unwrap();
        let (again, _) = map(&upload("water"), &schema).unwrap();
        assert_ne!(first.nodes()[0].id, second.nodes()[0].id);
        assert_eq!(first.nodes()[0].id, again.nodes()[0].id);
    }

    #[test]
    fn several_key_candidates_fall_back_to_rows() {
        let table = SheetTable::from_rows(
            "Sample",
            &["SAMPLE_ID", "BATCH_ID"],
            vec![vec!["S1".into(), "B1".into()]],
        );
        let (model, _) = map(&Workbook::from_tables([table]), &SchemaDescriptor::new()).unwrap();
        assert_eq!(model.nodes()[0].key, NodeKey::Row { number: 2 });
    }

    #[test]
    fn reference_splits_cell_on_delimiter() {
        let wb = Workbook::from_tables([reactions(), molecules()]);
        let (model, report) = map(&wb, &substrate_schema()).unwrap();
        assert!(report.is_empty());
        let rels: Vec<&Relationship> = model.relationships_of_type("HAS_SUBSTRATE").collect();
        assert_eq!(rels.len(), 2);
        let r1 = NodeId::for_key("Reaction", "REACTION_ID", "R1");
        assert!(rels.iter().all(|r| r.source == r1));
    }

    #[test]
    fn custom_delimiter_from_config() {
        let mut table = reactions();
        table.push_row(4, vec!["R3".into(), "Molecule A; Molecule B".into()]);
        let wb = Workbook::from_tables([table, molecules()]);
        let config = Config {
            reference_delimiter: ';',
            ..Config::default()
        };
        let (model, report) = GraphMapper::from_config(&config)
            .map(&wb, &substrate_schema())
            .unwrap();
        let r3 = NodeId::for_key("Reaction", "REACTION_ID", "R3");
        assert_eq!(model.relationships_from(&r3).count(), 2);
        // R1's "Molecule A, Molecule B" is now one unmatched value
        assert_eq!(report.dangling_references.len(), 1);
    }

    #[test]
    fn connection_joins_on_key_and_carries_it() {
        let measurements = SheetTable::from_rows(
            "Measurement",
            &["MEASUREMENT_ID", "REACTION_ID", "value"],
            vec![
                vec!["M1".into(), "R1".into(), CellValue::Number(0.5)],
                vec!["M2".into(), "R9".into(), CellValue::Number(0.7)],
            ],
        );
        let wb = Workbook::from_tables([reactions(), measurements]);
        let schema = SchemaDescriptor::new().with_connection(SheetConnection::new(
            "Reaction",
            "Measurement",
            "measured_by",
            "REACTION_ID",
        ));
        let (model, report) = map(&wb, &schema).unwrap();
        assert!(report.duplicate_key_matches.is_empty());
        let rels: Vec<&Relationship> = model.relationships_of_type("MEASURED_BY").collect();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].properties.get("REACTION_ID"), Some(&"R1".into()));
        // MEASUREMENT_ID and REACTION_ID are both key candidates
        let target = model.node(&rels[0].target).unwrap();
        assert_eq!(target.key, NodeKey::Row { number: 2 });
        assert_eq!(target.property("MEASUREMENT_ID"), Some(&"M1".into()));
    }

    #[test]
    fn numeric_keys_join_canonically() {
        let left = SheetTable::from_rows("Left", &["lot"], vec![vec![CellValue::Number(7.0)]]);
        let right = SheetTable::from_rows("Right", &["lot"], vec![vec!["7".into()]]);
        let schema = SchemaDescriptor::new()
            .with_connection(SheetConnection::new("Left", "Right", "same_lot", "lot"));
        let (model, _) = map(&Workbook::from_tables([left, right]), &schema).unwrap();
        assert_eq!(model.relationship_count(), 1);
    }

    #[test]
    fn missing_sheet_is_schema_mismatch() {
        let wb = Workbook::from_tables([reactions()]);
        let err = map(&wb, &substrate_schema()).unwrap_err();
        let MappingError::SchemaMismatch(problems) = err;
        assert_eq!(problems.len(), 1);
    }
}
