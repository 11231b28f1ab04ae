//! The top-level worksheet schema and its JSON/YAML facades.

use crate::field::Field;
use crate::section::Section;
use crate::SchemaError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

fn default_version() -> u32 {
    1
}

/// Structural definition of a worksheet, independent of any answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorksheetSchema {
    #[serde(default = "default_version")]
    pub version: u32,
    pub sections: Vec<Section>,
    /// Layout tag of the retired section-based formulation formats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

/// The three retired section-based diagram formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LegacyLayout {
    CrossSectional,
    ViciousFlower,
    Longitudinal,
}

impl LegacyLayout {
    /// Parses a schema-level `layout` tag. Returns `None` for anything that is not legacy.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "cross_sectional" => Some(Self::CrossSectional),
            "vicious_flower" | "radial" => Some(Self::ViciousFlower),
            "longitudinal" | "vertical_flow" => Some(Self::Longitudinal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrossSectional => "cross_sectional",
            Self::ViciousFlower => "vicious_flower",
            Self::Longitudinal => "longitudinal",
        }
    }
}

impl fmt::Display for LegacyLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WorksheetSchema {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            version: default_version(),
            sections,
            layout: None,
        }
    }

    pub fn legacy_layout(&self) -> Option<LegacyLayout> {
        self.layout.as_deref().and_then(LegacyLayout::parse)
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy_layout().is_some()
    }

    /// Every section-level field, in section then field order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|section| section.fields().iter())
    }

    pub fn find_field(&self, id: &str) -> Option<&Field> {
        self.fields().find(|field| field.id() == id)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id() == id)
    }

    /// Parse a schema from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g.
    /// `sections[0].fields[2]`) to the failing element when the text does not match the schema
    /// model.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Translation`] on malformed JSON or a model mismatch.
    pub fn from_json_str(json_text: &str) -> Result<Self, SchemaError> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let schema = deserialize_with_path(&mut deserializer)?;
        deserializer
            .end()
            .map_err(|e| SchemaError::Translation(format!("Trailing characters after schema: {e}")))?;
        Ok(schema)
    }

    /// Parse a schema from an already-decoded JSON value.
    pub fn from_json_value(value: &Value) -> Result<Self, SchemaError> {
        deserialize_with_path(value)
    }

    /// Parse a schema from YAML text.
    pub fn from_yaml_str(yaml_text: &str) -> Result<Self, SchemaError> {
        deserialize_with_path(serde_yaml::Deserializer::from_str(yaml_text))
    }

    pub fn to_json_value(&self) -> Result<Value, SchemaError> {
        serde_json::to_value(self)
            .map_err(|e| SchemaError::Translation(format!("Failed to serialize schema: {e}")))
    }

    pub fn to_json_string(&self) -> Result<String, SchemaError> {
        serde_json::to_string(self)
            .map_err(|e| SchemaError::Translation(format!("Failed to serialize schema: {e}")))
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SchemaError::Translation(format!("Failed to serialize schema: {e}")))
    }

    pub fn to_yaml_string(&self) -> Result<String, SchemaError> {
        serde_yaml::to_string(self)
            .map_err(|e| SchemaError::Translation(format!("Failed to serialize schema: {e}")))
    }
}

fn deserialize_with_path<'de, D, T>(deserializer: D) -> Result<T, SchemaError>
where
    D: serde::Deserializer<'de>,
    D::Error: fmt::Display,
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        SchemaError::Translation(format!("Worksheet schema mismatch at {path}: {source}"))
    })
}
