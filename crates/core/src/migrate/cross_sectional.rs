//! Five-areas (cross-sectional) legacy formulations.
//!
//! Each section tagged with one of the five areas becomes the node named after that area, at a
//! fixed slot. The default connection set encodes the five-areas model; edges to areas the
//! legacy schema did not provide are pruned when the formulation is assembled.

use super::{node_inputs, Conversion};
use crate::constants::CROSS_SECTIONAL_TITLE;
use worksheet_schema::{
    ConnectionDirection, ConnectionStyle, Domain, FormulationConnection, FormulationLayout,
    FormulationNode, Section,
};

use ConnectionDirection::{Both, OneWay};
use ConnectionStyle::{Arrow, ArrowDashed};

const DEFAULT_CONNECTIONS: [(&str, &str, ConnectionStyle, ConnectionDirection); 9] = [
    ("situation", "thoughts", Arrow, OneWay),
    ("situation", "emotions", Arrow, OneWay),
    ("situation", "physical", Arrow, OneWay),
    ("thoughts", "emotions", Arrow, Both),
    ("emotions", "physical", Arrow, Both),
    ("emotions", "behaviour", Arrow, Both),
    ("thoughts", "behaviour", Arrow, Both),
    ("physical", "behaviour", Arrow, Both),
    ("thoughts", "physical", ArrowDashed, Both),
];

fn slot_for(domain: &Domain) -> Option<&'static str> {
    match domain {
        Domain::Situation => Some("top"),
        Domain::Thoughts => Some("left"),
        Domain::Emotions => Some("centre"),
        Domain::Physical => Some("right"),
        Domain::Behaviour => Some("bottom"),
        _ => None,
    }
}

pub(super) fn convert(sections: &[Section]) -> Conversion {
    let mut conversion = Conversion::new(FormulationLayout::CrossSectional, CROSS_SECTIONAL_TITLE);

    for (index, section) in sections.iter().enumerate() {
        let Some(plain) = section.as_plain() else {
            continue;
        };
        let Some(domain) = plain.domain.as_ref() else {
            continue;
        };
        let Some(slot) = slot_for(domain) else {
            continue;
        };
        if conversion.nodes.iter().any(|node| node.slot == slot) {
            tracing::debug!(
                section = %plain.id,
                domain = %domain,
                "kept repeated five-areas section as an ordinary section"
            );
            continue;
        }

        let id = domain.as_str();
        conversion.nodes.push(FormulationNode {
            id: id.to_string(),
            slot: slot.to_string(),
            label: super::label_or(plain.title.as_deref(), domain.display_name()),
            domain_colour: Some(domain.default_colour()),
            domain: Some(domain.clone()),
            description: plain.description.clone(),
            fields: node_inputs(&plain.fields, id),
        });
        conversion.consumed.insert(index);
    }

    conversion.connections = DEFAULT_CONNECTIONS
        .iter()
        .map(|&(from, to, style, direction)| FormulationConnection::new(from, to, style, direction))
        .collect();

    conversion
}

#[cfg(test)]
mod tests {
    use crate::migrate::migrate;
    use serde_json::json;
    use worksheet_schema::{
        check_structure, ConnectionDirection, ConnectionStyle, Field, FormulationLayout,
        WorksheetSchema,
    };

    fn area(domain: &str) -> serde_json::Value {
        json!({
            "id": format!("{domain}_section"),
            "title": format!("{domain} title"),
            "domain": domain,
            "fields": [{"id": format!("{domain}_notes"), "type": "textarea", "label": "Notes"}]
        })
    }

    fn migrated(sections: Vec<serde_json::Value>) -> WorksheetSchema {
        let legacy: WorksheetSchema =
            serde_json::from_value(json!({"layout": "cross_sectional", "sections": sections}))
                .expect("legacy schema");
        migrate(&legacy)
    }

    fn formulation(schema: &WorksheetSchema) -> &worksheet_schema::FormulationField {
        match schema.sections.last().and_then(|s| s.fields().first()) {
            Some(Field::Formulation(field)) => field,
            other => panic!("expected formulation, got {other:?}"),
        }
    }

    #[test]
    fn all_five_areas_keep_all_nine_connections() {
        let schema = migrated(
            ["situation", "thoughts", "emotions", "physical", "behaviour"]
                .into_iter()
                .map(area)
                .collect(),
        );
        assert_eq!(schema.sections.len(), 1);

        let field = formulation(&schema);
        assert_eq!(field.layout, FormulationLayout::CrossSectional);
        let slots: Vec<(&str, &str)> = field
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.slot.as_str()))
            .collect();
        assert_eq!(
            slots,
            [
                ("situation", "top"),
                ("thoughts", "left"),
                ("emotions", "centre"),
                ("physical", "right"),
                ("behaviour", "bottom"),
            ]
        );
        assert_eq!(field.connections.len(), 9);

        let dashed: Vec<_> = field
            .connections
            .iter()
            .filter(|c| c.style == ConnectionStyle::ArrowDashed)
            .collect();
        assert_eq!(dashed.len(), 1);
        assert_eq!((dashed[0].from.as_str(), dashed[0].to.as_str()), ("thoughts", "physical"));

        let thoughts = field.node("thoughts").expect("thoughts node");
        assert_eq!(thoughts.label, "thoughts title");
        assert_eq!(thoughts.effective_colour().as_str(), "#5b8db8");
        assert_eq!(thoughts.fields[0].id(), "thoughts_notes");
        assert!(check_structure(&schema).is_ok());
    }

    #[test]
    fn connections_to_missing_areas_are_pruned() {
        let schema = migrated(vec![area("situation"), area("thoughts")]);
        let field = formulation(&schema);

        assert_eq!(field.nodes.len(), 2);
        assert_eq!(field.connections.len(), 1);
        let only = &field.connections[0];
        assert_eq!((only.from.as_str(), only.to.as_str()), ("situation", "thoughts"));
        assert_eq!(only.direction, ConnectionDirection::OneWay);
        for connection in &field.connections {
            assert!(field.node(&connection.from).is_some());
            assert!(field.node(&connection.to).is_some());
        }
    }

    #[test]
    fn other_sections_are_kept_in_order_before_the_formulation() {
        let schema = migrated(vec![
            json!({"id": "intro", "fields": [{"id": "name", "type": "text", "label": "Name"}]}),
            area("emotions"),
            json!({"id": "extra", "domain": "reassurance", "fields": []}),
            area("emotions"),
        ]);

        let ids: Vec<&str> = schema.sections.iter().map(|s| s.id()).collect();
        assert_eq!(ids, ["intro", "extra", "emotions_section", "formulation"]);
        assert_eq!(formulation(&schema).nodes.len(), 1);
        assert!(formulation(&schema).connections.is_empty());
    }
}
