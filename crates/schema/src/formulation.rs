//! Formulation diagram model.
//!
//! A `formulation` field is a clinical diagram: labelled nodes placed in the named slots of one
//! of five layouts, joined by arrows. The model is declarative; structural checks live in
//! [`crate::validation`] and positioning is left to the renderer.
//!
//! Slot conventions per layout:
//!
//! | Layout | Slots |
//! |--------|-------|
//! | `cross_sectional` | `top`, `left`, `centre`, `right`, `bottom` |
//! | `radial` | `centre`, `petal-0`, `petal-1`, ... |
//! | `vertical_flow` | `step-0`, `step-1`, ... |
//! | `cycle` | `cycle-0`, `cycle-1`, ... |
//! | `three_systems` | `system-0`, `system-1`, `system-2`, `centre` |

use crate::field::Field;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use worksheet_types::{HexColour, NonEmptyText};

/// Neutral grey used when no domain colour applies.
pub const NEUTRAL_COLOUR: &str = "#8b8e94";

const CROSS_SECTIONAL_SLOTS: [&str; 5] = ["top", "left", "centre", "right", "bottom"];
const THREE_SYSTEMS_SLOTS: [&str; 4] = ["system-0", "system-1", "system-2", "centre"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulationLayout {
    CrossSectional,
    Radial,
    VerticalFlow,
    Cycle,
    ThreeSystems,
}

impl FormulationLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrossSectional => "cross_sectional",
            Self::Radial => "radial",
            Self::VerticalFlow => "vertical_flow",
            Self::Cycle => "cycle",
            Self::ThreeSystems => "three_systems",
        }
    }

    /// Prefix of the numbered slots of this layout, if it has any.
    fn indexed_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Radial => Some("petal-"),
            Self::VerticalFlow => Some("step-"),
            Self::Cycle => Some("cycle-"),
            Self::CrossSectional | Self::ThreeSystems => None,
        }
    }

    /// Returns the slot name for the `index`-th position of this layout.
    ///
    /// Layouts with a fixed slot set return `None` once the set is exhausted; for
    /// `three_systems` only the three systems are numbered, the centre is addressed by name.
    pub fn slot_for(&self, index: usize) -> Option<String> {
        match self {
            Self::CrossSectional => CROSS_SECTIONAL_SLOTS.get(index).map(|s| s.to_string()),
            Self::ThreeSystems => THREE_SYSTEMS_SLOTS[..3].get(index).map(|s| s.to_string()),
            _ => self.indexed_prefix().map(|prefix| format!("{prefix}{index}")),
        }
    }

    /// Returns `true` if `slot` is a valid position under this layout.
    pub fn accepts_slot(&self, slot: &str) -> bool {
        match self {
            Self::CrossSectional => CROSS_SECTIONAL_SLOTS.contains(&slot),
            Self::ThreeSystems => THREE_SYSTEMS_SLOTS.contains(&slot),
            Self::Radial if slot == "centre" => true,
            _ => self
                .indexed_prefix()
                .and_then(|prefix| slot.strip_prefix(prefix))
                .is_some_and(is_canonical_index),
        }
    }
}

impl fmt::Display for FormulationLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `"0"`, `"1"`, `"12"`; not `""`, `"01"` or `"+1"`.
fn is_canonical_index(digits: &str) -> bool {
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

/// Clinical domain of a section or node.
///
/// Unrecognised names are preserved verbatim in [`Domain::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Domain {
    Situation,
    Thoughts,
    Emotions,
    Physical,
    Behaviour,
    Reassurance,
    CoreBeliefs,
    Other(String),
}

impl Domain {
    pub fn parse(name: &str) -> Self {
        match name {
            "situation" => Self::Situation,
            "thoughts" => Self::Thoughts,
            "emotions" => Self::Emotions,
            "physical" => Self::Physical,
            "behaviour" => Self::Behaviour,
            "reassurance" => Self::Reassurance,
            "core_beliefs" => Self::CoreBeliefs,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Situation => "situation",
            Self::Thoughts => "thoughts",
            Self::Emotions => "emotions",
            Self::Physical => "physical",
            Self::Behaviour => "behaviour",
            Self::Reassurance => "reassurance",
            Self::CoreBeliefs => "core_beliefs",
            Self::Other(name) => name,
        }
    }

    pub fn is_recognised(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Human-readable name, used when a node has no better label.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Situation => "Situation",
            Self::Thoughts => "Thoughts",
            Self::Emotions => "Emotions",
            Self::Physical => "Physical sensations",
            Self::Behaviour => "Behaviour",
            Self::Reassurance => "Reassurance",
            Self::CoreBeliefs => "Core beliefs",
            Self::Other(name) => name,
        }
    }

    fn colour_hex(&self) -> &'static str {
        match self {
            Self::Situation => "#64748b",
            Self::Thoughts => "#5b8db8",
            Self::Emotions => "#c46b6b",
            Self::Physical => "#6b9e78",
            Self::Behaviour => "#8b6bb0",
            Self::Reassurance => "#d4a44a",
            Self::CoreBeliefs => "#8b6b4a",
            Self::Other(_) => NEUTRAL_COLOUR,
        }
    }

    /// Default colour of nodes in this domain.
    pub fn default_colour(&self) -> HexColour {
        HexColour::parse(self.colour_hex()).expect("domain palette colours are valid")
    }
}

impl From<String> for Domain {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.as_str().to_string()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulationConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub show_title: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormulationNode {
    pub id: String,
    pub slot: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_colour: Option<HexColour>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl FormulationNode {
    /// Colour to draw this node with.
    ///
    /// Resolution order: explicit `domain_colour`, the default of `domain`, the default of a
    /// recognised domain named by the node id (cross-sectional nodes are keyed that way), and
    /// finally [`NEUTRAL_COLOUR`].
    pub fn effective_colour(&self) -> HexColour {
        if let Some(colour) = &self.domain_colour {
            return colour.clone();
        }
        if let Some(domain) = &self.domain {
            return domain.default_colour();
        }
        Domain::parse(&self.id).default_colour()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStyle {
    #[default]
    Arrow,
    ArrowDashed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionDirection {
    #[default]
    OneWay,
    Both,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormulationConnection {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub style: ConnectionStyle,
    #[serde(default)]
    pub direction: ConnectionDirection,
}

impl FormulationConnection {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        style: ConnectionStyle,
        direction: ConnectionDirection,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            style,
            direction,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormulationField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    pub layout: FormulationLayout,
    #[serde(default)]
    pub formulation_config: FormulationConfig,
    #[serde(default)]
    pub nodes: Vec<FormulationNode>,
    #[serde(default)]
    pub connections: Vec<FormulationConnection>,
}

impl FormulationField {
    pub fn node(&self, id: &str) -> Option<&FormulationNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Drops every connection with an endpoint that is not one of `nodes`.
    ///
    /// Returns the number of connections removed.
    pub fn retain_resolved_connections(&mut self) -> usize {
        let ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        let before = self.connections.len();
        self.connections
            .retain(|c| ids.contains(c.from.as_str()) && ids.contains(c.to.as_str()));
        before - self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, slot: &str) -> FormulationNode {
        FormulationNode {
            id: id.into(),
            slot: slot.into(),
            label: id.into(),
            domain_colour: None,
            domain: None,
            description: None,
            fields: Vec::new(),
        }
    }

    #[test]
    fn slot_conventions_per_layout() {
        assert!(FormulationLayout::CrossSectional.accepts_slot("centre"));
        assert!(!FormulationLayout::CrossSectional.accepts_slot("petal-0"));
        assert!(FormulationLayout::Radial.accepts_slot("centre"));
        assert!(FormulationLayout::Radial.accepts_slot("petal-12"));
        assert!(!FormulationLayout::Radial.accepts_slot("petal-"));
        assert!(!FormulationLayout::Radial.accepts_slot("petal-01"));
        assert!(FormulationLayout::VerticalFlow.accepts_slot("step-0"));
        assert!(!FormulationLayout::VerticalFlow.accepts_slot("centre"));
        assert!(FormulationLayout::Cycle.accepts_slot("cycle-3"));
        assert!(FormulationLayout::ThreeSystems.accepts_slot("system-2"));
        assert!(FormulationLayout::ThreeSystems.accepts_slot("centre"));
        assert!(!FormulationLayout::ThreeSystems.accepts_slot("system-3"));
    }

    #[test]
    fn slot_for_matches_accepts_slot() {
        assert_eq!(
            FormulationLayout::Radial.slot_for(2).as_deref(),
            Some("petal-2")
        );
        assert_eq!(
            FormulationLayout::CrossSectional.slot_for(4).as_deref(),
            Some("bottom")
        );
        assert_eq!(FormulationLayout::CrossSectional.slot_for(5), None);
        assert_eq!(FormulationLayout::ThreeSystems.slot_for(3), None);

        for layout in [
            FormulationLayout::CrossSectional,
            FormulationLayout::Radial,
            FormulationLayout::VerticalFlow,
            FormulationLayout::Cycle,
            FormulationLayout::ThreeSystems,
        ] {
            for index in 0..3 {
                let slot = layout.slot_for(index).expect("first three slots exist");
                assert!(layout.accepts_slot(&slot), "{layout} should accept {slot}");
            }
        }
    }

    #[test]
    fn domain_palette_parses() {
        for name in [
            "situation",
            "thoughts",
            "emotions",
            "physical",
            "behaviour",
            "reassurance",
            "core_beliefs",
            "triggers",
        ] {
            let domain = Domain::parse(name);
            assert_eq!(domain.as_str(), name);
            assert!(domain.default_colour().as_str().starts_with('#'));
        }
        assert_eq!(Domain::Situation.default_colour().as_str(), "#64748b");
        assert_eq!(
            Domain::parse("triggers").default_colour().as_str(),
            NEUTRAL_COLOUR
        );
    }

    #[test]
    fn effective_colour_resolution_order() {
        let mut thoughts = node("thoughts", "left");
        assert_eq!(thoughts.effective_colour(), Domain::Thoughts.default_colour());

        thoughts.domain = Some(Domain::Emotions);
        assert_eq!(thoughts.effective_colour(), Domain::Emotions.default_colour());

        thoughts.domain_colour = Some(HexColour::parse("#123456").expect("colour"));
        assert_eq!(thoughts.effective_colour().as_str(), "#123456");

        assert_eq!(node("step-0", "step-0").effective_colour().as_str(), NEUTRAL_COLOUR);
    }

    #[test]
    fn retain_resolved_connections_drops_dangling_edges() {
        let mut field = FormulationField {
            id: "map".into(),
            label: NonEmptyText::new("Map").expect("label"),
            required: None,
            layout: FormulationLayout::CrossSectional,
            formulation_config: FormulationConfig::default(),
            nodes: vec![node("thoughts", "left"), node("emotions", "centre")],
            connections: vec![
                FormulationConnection::new(
                    "thoughts",
                    "emotions",
                    ConnectionStyle::Arrow,
                    ConnectionDirection::Both,
                ),
                FormulationConnection::new(
                    "situation",
                    "thoughts",
                    ConnectionStyle::Arrow,
                    ConnectionDirection::OneWay,
                ),
            ],
        };

        assert_eq!(field.retain_resolved_connections(), 1);
        assert_eq!(field.connections.len(), 1);
        assert_eq!(field.connections[0].from, "thoughts");
    }

    #[test]
    fn connection_defaults() {
        let connection: FormulationConnection =
            serde_json::from_str(r#"{"from": "a", "to": "b"}"#).expect("parse connection");
        assert_eq!(connection.style, ConnectionStyle::Arrow);
        assert_eq!(connection.direction, ConnectionDirection::OneWay);
    }
}
