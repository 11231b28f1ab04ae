//! Worksheet sections.
//!
//! On the wire a section is one JSON object shape. A `type: "branch"` tag turns it into a
//! decision-tree node; otherwise it is a plain container of fields. Internally the two are kept
//! apart as [`Section::Plain`] and [`Section::Branch`] so a branch can never carry fields.
//!
//! Plain sections also carry the attributes of the retired section-based formulation formats
//! (`domain`, `highlight`, `layout: four_quadrant`, `default_items`, `item_template`). They
//! are read by the legacy migrator in `worksheet-core` and have no meaning elsewhere.

use crate::field::Field;
use crate::formulation::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SectionWire", into = "SectionWire")]
pub enum Section {
    Plain(PlainSection),
    Branch(BranchSection),
}

impl Section {
    pub fn id(&self) -> &str {
        match self {
            Self::Plain(section) => &section.id,
            Self::Branch(section) => &section.id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Plain(section) => section.title.as_deref(),
            Self::Branch(section) => section.title.as_deref(),
        }
    }

    /// Fields of a plain section; branch sections have none.
    pub fn fields(&self) -> &[Field] {
        match self {
            Self::Plain(section) => &section.fields,
            Self::Branch(_) => &[],
        }
    }

    pub fn as_plain(&self) -> Option<&PlainSection> {
        match self {
            Self::Plain(section) => Some(section),
            Self::Branch(_) => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlainSection {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub domain: Option<Domain>,
    pub fields: Vec<Field>,
    pub highlight: Option<Highlight>,
    pub layout: Option<SectionLayout>,
    pub default_items: Vec<DefaultItem>,
    pub item_template: Vec<Field>,
}

impl PlainSection {
    pub fn new(id: impl Into<String>, title: Option<String>, fields: Vec<Field>) -> Self {
        Self {
            id: id.into(),
            title,
            fields,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchSection {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub question: String,
    pub branches: BranchTargets,
}

/// Section ids to continue with for each answer of a branch question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTargets {
    pub yes: String,
    pub no: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLayout {
    FourQuadrant,
}

/// Visual emphasis of a legacy longitudinal step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Highlight {
    Amber,
    RedDashed,
    Other(String),
}

impl Highlight {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Amber => "amber",
            Self::RedDashed => "red_dashed",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for Highlight {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "amber" => Self::Amber,
            "red_dashed" => Self::RedDashed,
            _ => Self::Other(tag),
        }
    }
}

impl From<Highlight> for String {
    fn from(highlight: Highlight) -> Self {
        highlight.as_str().to_string()
    }
}

/// A pre-populated item of a legacy list section (for example one petal of a vicious flower).
///
/// Items may be written as a bare label string or as an object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "DefaultItemWire")]
pub struct DefaultItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefaultItemWire {
    Label(String),
    Item {
        label: String,
        #[serde(default)]
        domain: Option<Domain>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        fields: Vec<Field>,
    },
}

impl From<DefaultItemWire> for DefaultItem {
    fn from(wire: DefaultItemWire) -> Self {
        match wire {
            DefaultItemWire::Label(label) => Self {
                label,
                domain: None,
                description: None,
                fields: Vec::new(),
            },
            DefaultItemWire::Item {
                label,
                domain,
                description,
                fields,
            } => Self {
                label,
                domain,
                description,
                fields,
            },
        }
    }
}

// ============================================================================
// Wire type (internal)
// ============================================================================

const BRANCH_TAG: &str = "branch";

/// Shared JSON shape of plain and branch sections.
#[derive(Deserialize, Serialize)]
struct SectionWire {
    id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain: Option<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<Field>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branches: Option<BranchTargets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    highlight: Option<Highlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layout: Option<SectionLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_items: Option<Vec<DefaultItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_template: Option<Vec<Field>>,
}

/// Why a section object does not describe a valid plain or branch section.
#[derive(Debug)]
pub struct SectionShapeError(String);

impl fmt::Display for SectionShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<SectionWire> for Section {
    type Error = SectionShapeError;

    fn try_from(wire: SectionWire) -> Result<Self, Self::Error> {
        match wire.kind.as_deref() {
            None => {
                if wire.question.is_some() || wire.branches.is_some() {
                    return Err(SectionShapeError(format!(
                        "section '{}' has 'question'/'branches' but is not tagged type: branch",
                        wire.id
                    )));
                }
                let fields = wire.fields.ok_or_else(|| {
                    SectionShapeError(format!("section '{}' is missing a 'fields' array", wire.id))
                })?;
                Ok(Self::Plain(PlainSection {
                    id: wire.id,
                    title: wire.title,
                    description: wire.description,
                    domain: wire.domain,
                    fields,
                    highlight: wire.highlight,
                    layout: wire.layout,
                    default_items: wire.default_items.unwrap_or_default(),
                    item_template: wire.item_template.unwrap_or_default(),
                }))
            }
            Some(BRANCH_TAG) => {
                if wire.fields.as_ref().is_some_and(|fields| !fields.is_empty()) {
                    return Err(SectionShapeError(format!(
                        "branch section '{}' must not contain fields",
                        wire.id
                    )));
                }
                let (Some(question), Some(branches)) = (wire.question, wire.branches) else {
                    return Err(SectionShapeError(format!(
                        "branch section '{}' requires 'question' and 'branches'",
                        wire.id
                    )));
                };
                Ok(Self::Branch(BranchSection {
                    id: wire.id,
                    title: wire.title,
                    description: wire.description,
                    question,
                    branches,
                }))
            }
            Some(other) => Err(SectionShapeError(format!(
                "section '{}' has unsupported type '{other}'",
                wire.id
            ))),
        }
    }
}

impl From<Section> for SectionWire {
    fn from(section: Section) -> Self {
        match section {
            Section::Plain(plain) => SectionWire {
                id: plain.id,
                kind: None,
                title: plain.title,
                description: plain.description,
                domain: plain.domain,
                fields: Some(plain.fields),
                question: None,
                branches: None,
                highlight: plain.highlight,
                layout: plain.layout,
                default_items: (!plain.default_items.is_empty()).then_some(plain.default_items),
                item_template: (!plain.item_template.is_empty()).then_some(plain.item_template),
            },
            Section::Branch(branch) => SectionWire {
                id: branch.id,
                kind: Some(BRANCH_TAG.to_string()),
                title: branch.title,
                description: branch.description,
                domain: None,
                fields: None,
                question: Some(branch.question),
                branches: Some(branch.branches),
                highlight: None,
                layout: None,
                default_items: None,
                item_template: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_section_round_trips() {
        let raw = json!({
            "id": "mood",
            "title": "Mood",
            "fields": [{"id": "rating", "type": "number", "label": "Rating"}]
        });
        let section: Section = serde_json::from_value(raw.clone()).expect("parse section");
        assert_eq!(section.id(), "mood");
        assert_eq!(section.fields().len(), 1);
        assert_eq!(serde_json::to_value(&section).expect("serialize"), raw);
    }

    #[test]
    fn branch_section_is_its_own_variant() {
        let raw = json!({
            "id": "q1",
            "type": "branch",
            "question": "Is the worry about a current problem?",
            "branches": {"yes": "solve", "no": "let_go"}
        });
        let section: Section = serde_json::from_value(raw.clone()).expect("parse branch");
        match &section {
            Section::Branch(branch) => assert_eq!(branch.branches.no, "let_go"),
            other => panic!("expected branch, got {other:?}"),
        }
        assert!(section.fields().is_empty());
        assert_eq!(serde_json::to_value(&section).expect("serialize"), raw);
    }

    #[test]
    fn branch_with_fields_is_rejected() {
        let err = serde_json::from_value::<Section>(json!({
            "id": "q1",
            "type": "branch",
            "question": "?",
            "branches": {"yes": "a", "no": "b"},
            "fields": [{"id": "x", "type": "text", "label": "X"}]
        }))
        .expect_err("branch cannot hold fields");
        assert!(err.to_string().contains("must not contain fields"));
    }

    #[test]
    fn branch_with_empty_fields_is_accepted() {
        let section: Section = serde_json::from_value(json!({
            "id": "q1",
            "type": "branch",
            "question": "?",
            "branches": {"yes": "a", "no": "b"},
            "fields": []
        }))
        .expect("empty fields are tolerated");
        assert!(matches!(section, Section::Branch(_)));
    }

    #[test]
    fn plain_section_requires_fields() {
        let err = serde_json::from_value::<Section>(json!({"id": "s"}))
            .expect_err("fields are required");
        assert!(err.to_string().contains("missing a 'fields' array"));
    }

    #[test]
    fn legacy_attributes_are_preserved() {
        let raw = json!({
            "id": "petals",
            "domain": "behaviour",
            "highlight": "amber",
            "layout": "four_quadrant",
            "fields": [],
            "default_items": [
                "Safety behaviours",
                {"label": "Avoidance", "domain": "behaviour"}
            ]
        });
        let section: Section = serde_json::from_value(raw).expect("parse legacy section");
        let plain = section.as_plain().expect("plain section");
        assert_eq!(plain.domain, Some(Domain::Behaviour));
        assert_eq!(plain.highlight, Some(Highlight::Amber));
        assert_eq!(plain.layout, Some(SectionLayout::FourQuadrant));
        assert_eq!(plain.default_items.len(), 2);
        assert_eq!(plain.default_items[0].label, "Safety behaviours");
        assert_eq!(plain.default_items[1].domain, Some(Domain::Behaviour));
    }

    #[test]
    fn unknown_domain_and_highlight_survive() {
        let section: Section = serde_json::from_value(json!({
            "id": "s",
            "domain": "triggers",
            "highlight": "glow",
            "fields": []
        }))
        .expect("parse section");
        let value = serde_json::to_value(&section).expect("serialize");
        assert_eq!(value["domain"], "triggers");
        assert_eq!(value["highlight"], "glow");
    }
}
