//! Legacy formulation migration.
//!
//! Three retired schema formats described a clinical diagram with whole sections: a
//! `cross_sectional` five-areas model, a `vicious_flower` (radial) model and a `longitudinal`
//! (vertical flow) model. [`migrate`] converts them into the formulation diagram model:
//!
//! - sections that do not feed the diagram are kept, in their original order,
//! - the converted nodes and connections are wrapped into a single `formulation` field inside
//!   one new section appended after them,
//! - the schema-level `layout` tag is cleared.
//!
//! Migration never fails. A legacy schema that lacks the expected sections produces fewer
//! nodes, and connections whose endpoints were not produced are dropped. The output is a
//! function of the input alone, so repeated runs serialise identically, and a migrated schema
//! is returned unchanged by a second run.

mod cross_sectional;
mod radial;
mod vertical_flow;

use crate::constants::{FORMULATION_FIELD_ID, FORMULATION_SECTION_ID};
use std::collections::HashSet;
use worksheet_schema::{
    Field, FormulationConfig, FormulationConnection, FormulationField, FormulationLayout,
    FormulationNode, LegacyLayout, NonEmptyText, PlainSection, Section, WorksheetSchema,
};

/// Nodes and connections produced from the legacy sections of one schema.
pub(crate) struct Conversion {
    pub layout: FormulationLayout,
    pub title: &'static str,
    /// Indexes of the sections absorbed into the diagram.
    pub consumed: HashSet<usize>,
    pub nodes: Vec<FormulationNode>,
    pub connections: Vec<FormulationConnection>,
}

impl Conversion {
    pub fn new(layout: FormulationLayout, title: &'static str) -> Self {
        Self {
            layout,
            title,
            consumed: HashSet::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }
}

/// Upgrades a legacy formulation schema to the current model.
///
/// Schemas without a recognised legacy `layout` tag are returned unchanged.
pub fn migrate(schema: &WorksheetSchema) -> WorksheetSchema {
    let Some(legacy) = schema.legacy_layout() else {
        return schema.clone();
    };

    let conversion = match legacy {
        LegacyLayout::CrossSectional => cross_sectional::convert(&schema.sections),
        LegacyLayout::ViciousFlower => radial::convert(&schema.sections),
        LegacyLayout::Longitudinal => vertical_flow::convert(&schema.sections),
    };

    let migrated = assemble(schema, conversion);
    tracing::info!(
        legacy = %legacy,
        sections = migrated.sections.len(),
        "migrated legacy formulation schema"
    );
    migrated
}

fn assemble(schema: &WorksheetSchema, conversion: Conversion) -> WorksheetSchema {
    let Conversion {
        layout,
        title,
        consumed,
        nodes,
        connections,
    } = conversion;

    let mut sections: Vec<Section> = schema
        .sections
        .iter()
        .enumerate()
        .filter(|(index, _)| !consumed.contains(index))
        .map(|(_, section)| section.clone())
        .collect();

    let section_ids: HashSet<&str> = sections.iter().map(Section::id).collect();
    let field_ids: HashSet<&str> = sections
        .iter()
        .flat_map(|section| section.fields().iter().map(Field::id))
        .collect();
    let section_id = unique_id(FORMULATION_SECTION_ID, &section_ids);
    let field_id = unique_id(FORMULATION_FIELD_ID, &field_ids);

    let mut formulation = FormulationField {
        id: field_id,
        label: label_text(title),
        required: None,
        layout,
        formulation_config: FormulationConfig {
            title: title.to_string(),
            show_title: true,
        },
        nodes,
        connections,
    };
    let dropped = formulation.retain_resolved_connections();
    if dropped > 0 {
        tracing::debug!(
            dropped,
            layout = %layout,
            "dropped connections to nodes missing from the legacy schema"
        );
    }

    sections.push(Section::Plain(PlainSection::new(
        section_id,
        Some(title.to_string()),
        vec![Field::Formulation(formulation)],
    )));

    WorksheetSchema {
        version: schema.version,
        sections,
        layout: None,
    }
}

/// Returns `base`, or the first of `base_2`, `base_3`, ... that is not already taken.
pub(crate) fn unique_id(base: &str, taken: &HashSet<&str>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Copies the fields a node can hold: simple inputs with an id not yet used in the node.
pub(crate) fn node_inputs(fields: &[Field], node_id: &str) -> Vec<Field> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::with_capacity(fields.len());
    for field in fields {
        if !field.kind().is_simple_input() {
            tracing::debug!(
                node = node_id,
                field = field.id(),
                kind = %field.kind(),
                "dropped field that a formulation node cannot hold"
            );
            continue;
        }
        if !seen.insert(field.id()) {
            tracing::debug!(node = node_id, field = field.id(), "dropped repeated node field");
            continue;
        }
        inputs.push(field.clone());
    }
    inputs
}

/// Non-empty label text, falling back to `fallback` when `label` is blank.
pub(crate) fn label_or(label: Option<&str>, fallback: &str) -> String {
    label
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn label_text(title: &'static str) -> NonEmptyText {
    NonEmptyText::new(title).expect("formulation titles are non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use worksheet_schema::check_structure;

    fn schema(value: serde_json::Value) -> WorksheetSchema {
        serde_json::from_value(value).expect("valid legacy schema")
    }

    fn formulation(schema: &WorksheetSchema) -> &FormulationField {
        match schema.sections.last().and_then(|s| s.fields().first()) {
            Some(Field::Formulation(field)) => field,
            other => panic!("expected a trailing formulation field, got {other:?}"),
        }
    }

    #[test]
    fn current_schemas_are_returned_unchanged() {
        let current = schema(json!({"sections": [
            {"id": "s", "fields": [{"id": "a", "type": "text", "label": "A"}]}
        ]}));
        assert_eq!(migrate(&current), current);

        let mut unknown = current.clone();
        unknown.layout = Some("grid".into());
        assert_eq!(migrate(&unknown), unknown);
    }

    #[test]
    fn synthetic_ids_avoid_existing_ids() {
        let legacy = schema(json!({"layout": "cross_sectional", "sections": [
            {"id": "formulation", "fields": []},
            {"id": "notes", "fields": [{"id": "formulation", "type": "text", "label": "Clash"}]},
            {"id": "formulation_2", "fields": []}
        ]}));
        let migrated = migrate(&legacy);

        let last = migrated.sections.last().expect("synthetic section");
        assert_eq!(last.id(), "formulation_3");
        assert_eq!(formulation(&migrated).id, "formulation_2");
        assert!(check_structure(&migrated).is_ok());
    }

    #[test]
    fn unique_id_counts_up_from_two() {
        let taken: HashSet<&str> = ["x", "x_2"].into_iter().collect();
        assert_eq!(unique_id("x", &taken), "x_3");
        assert_eq!(unique_id("y", &taken), "y");
    }

    #[test]
    fn node_inputs_keep_simple_unique_fields() {
        let fields: Vec<Field> = serde_json::from_value(json!([
            {"id": "a", "type": "text", "label": "A"},
            {"id": "t", "type": "table", "label": "T", "min_rows": 0, "max_rows": 1,
             "columns": [{"id": "c", "header": "C", "type": "text"}]},
            {"id": "a", "type": "number", "label": "Again"},
            {"id": "b", "type": "likert", "label": "B", "min": 0, "max": 10}
        ]))
        .expect("fields");
        let ids: Vec<String> = node_inputs(&fields, "n")
            .iter()
            .map(|f| f.id().to_string())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn migration_is_deterministic_and_idempotent() {
        for layout in ["cross_sectional", "vicious_flower", "longitudinal"] {
            let legacy = schema(json!({"layout": layout, "version": 3, "sections": [
                {"id": "intro", "fields": [{"id": "name", "type": "text", "label": "Name"}]},
                {"id": "situation", "domain": "situation", "title": "Trigger",
                 "fields": [{"id": "what", "type": "textarea", "label": "What happened"}]},
                {"id": "centre", "fields": [{"id": "worry", "type": "text", "label": "Worry"}]},
                {"id": "petals", "fields": [], "default_items": ["Avoidance", "Checking"]}
            ]}));

            let once = migrate(&legacy);
            let again = migrate(&legacy);
            assert_eq!(
                once.to_json_string().expect("serialise"),
                again.to_json_string().expect("serialise"),
                "{layout} should serialise identically"
            );
            assert_eq!(migrate(&once), once, "{layout} should be idempotent");
            assert_eq!(once.layout, None);
            assert_eq!(once.version, 3);
            assert!(check_structure(&once).is_ok(), "{layout} output should validate");
        }
    }
}
