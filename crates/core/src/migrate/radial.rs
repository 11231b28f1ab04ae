//! Vicious flower (radial) legacy formulations.
//!
//! The `centre` section becomes the centre node. Every default item of the `petals` section
//! becomes a petal around it, joined to the centre in both directions.

use super::{label_or, node_inputs, Conversion};
use crate::constants::{
    DEFAULT_NODE_FIELD_ID, DEFAULT_NODE_FIELD_LABEL, RADIAL_CENTRE_SECTION, RADIAL_PETALS_SECTION,
    VICIOUS_FLOWER_TITLE,
};
use worksheet_schema::formulation::NEUTRAL_COLOUR;
use worksheet_schema::{
    ConnectionDirection, ConnectionStyle, DefaultItem, Domain, Field, FormulationConnection,
    FormulationLayout, FormulationNode, HexColour, NonEmptyText, PlainSection, Section,
};

const CENTRE_SLOT: &str = "centre";

pub(super) fn convert(sections: &[Section]) -> Conversion {
    let mut conversion = Conversion::new(FormulationLayout::Radial, VICIOUS_FLOWER_TITLE);

    if let Some((index, centre)) = find_plain(sections, RADIAL_CENTRE_SECTION, |_| true) {
        conversion.nodes.push(FormulationNode {
            id: CENTRE_SLOT.to_string(),
            slot: CENTRE_SLOT.to_string(),
            label: label_or(centre.title.as_deref(), "Centre"),
            domain_colour: Some(colour_of(centre.domain.as_ref())),
            domain: centre.domain.clone(),
            description: centre.description.clone(),
            fields: node_inputs(&centre.fields, CENTRE_SLOT),
        });
        conversion.consumed.insert(index);
    }

    if let Some((index, petals)) = find_plain(sections, RADIAL_PETALS_SECTION, |section| {
        !section.default_items.is_empty()
    }) {
        for (position, item) in petals.default_items.iter().enumerate() {
            let Some(slot) = FormulationLayout::Radial.slot_for(position) else {
                continue;
            };
            conversion.nodes.push(petal(&slot, item, petals));
            conversion.connections.push(FormulationConnection::new(
                slot,
                CENTRE_SLOT,
                ConnectionStyle::Arrow,
                ConnectionDirection::Both,
            ));
        }
        conversion.consumed.insert(index);
    }

    conversion
}

fn find_plain<'s>(
    sections: &'s [Section],
    id: &str,
    accept: impl Fn(&PlainSection) -> bool,
) -> Option<(usize, &'s PlainSection)> {
    sections.iter().enumerate().find_map(|(index, section)| {
        section
            .as_plain()
            .filter(|plain| plain.id == id && accept(plain))
            .map(|plain| (index, plain))
    })
}

fn petal(slot: &str, item: &DefaultItem, petals: &PlainSection) -> FormulationNode {
    let label = label_or(Some(item.label.as_str()), DEFAULT_NODE_FIELD_LABEL);
    let domain = item.domain.clone().or_else(|| petals.domain.clone());

    let fields = if !item.fields.is_empty() {
        node_inputs(&item.fields, slot)
    } else if !petals.item_template.is_empty() {
        node_inputs(&petals.item_template, slot)
    } else {
        Vec::new()
    };
    let fields = if fields.is_empty() {
        vec![default_input(&label)]
    } else {
        fields
    };

    FormulationNode {
        id: slot.to_string(),
        slot: slot.to_string(),
        domain_colour: Some(colour_of(domain.as_ref())),
        domain,
        label,
        description: item.description.clone(),
        fields,
    }
}

fn default_input(label: &str) -> Field {
    let label = NonEmptyText::new(label)
        .or_else(|_| NonEmptyText::new(DEFAULT_NODE_FIELD_LABEL))
        .expect("default node label is non-empty");
    Field::textarea(DEFAULT_NODE_FIELD_ID, label)
}

fn colour_of(domain: Option<&Domain>) -> HexColour {
    match domain {
        Some(domain) => domain.default_colour(),
        None => HexColour::parse(NEUTRAL_COLOUR).expect("neutral colour is valid"),
    }
}
