//! Longitudinal (vertical flow) legacy formulations.
//!
//! Every plain section with at least one field becomes the next step of a one-way chain.
//! A `four_quadrant` section is flattened into a single step holding all of its fields.

use super::{label_or, node_inputs, Conversion};
use crate::constants::{
    LONGITUDINAL_TITLE, STEP_COLOUR_AMBER, STEP_COLOUR_DEFAULT, STEP_COLOUR_RED_DASHED,
};
use worksheet_schema::{
    ConnectionDirection, ConnectionStyle, FormulationConnection, FormulationLayout,
    FormulationNode, Highlight, HexColour, Section, SectionLayout,
};

fn step_colour(highlight: Option<&Highlight>) -> HexColour {
    let hex = match highlight {
        Some(Highlight::Amber) => STEP_COLOUR_AMBER,
        Some(Highlight::RedDashed) => STEP_COLOUR_RED_DASHED,
        _ => STEP_COLOUR_DEFAULT,
    };
    HexColour::parse(hex).expect("step colours are valid")
}

pub(super) fn convert(sections: &[Section]) -> Conversion {
    let mut conversion = Conversion::new(FormulationLayout::VerticalFlow, LONGITUDINAL_TITLE);

    for (index, section) in sections.iter().enumerate() {
        let Some(plain) = section.as_plain() else {
            continue;
        };
        if plain.fields.is_empty() {
            continue;
        }

        let step = conversion.nodes.len();
        let Some(slot) = FormulationLayout::VerticalFlow.slot_for(step) else {
            continue;
        };
        if plain.layout == Some(SectionLayout::FourQuadrant) {
            tracing::debug!(
                section = %plain.id,
                step,
                "flattened four-quadrant section into a single step"
            );
        }

        conversion.nodes.push(FormulationNode {
            id: slot.clone(),
            label: label_or(plain.title.as_deref(), &format!("Step {}", step + 1)),
            domain_colour: Some(step_colour(plain.highlight.as_ref())),
            domain: plain.domain.clone(),
            description: plain.description.clone(),
            fields: node_inputs(&plain.fields, &slot),
            slot,
        });
        conversion.consumed.insert(index);
    }

    conversion.connections = conversion
        .nodes
        .windows(2)
        .map(|pair| {
            FormulationConnection::new(
                pair[0].id.as_str(),
                pair[1].id.as_str(),
                ConnectionStyle::Arrow,
                ConnectionDirection::OneWay,
            )
        })
        .collect();

    conversion
}
