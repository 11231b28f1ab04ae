#[derive(Debug, thiserror::Error)]
pub enum WorksheetError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("document is {size} bytes, larger than the {limit} byte limit")]
    DocumentTooLarge { size: u64, limit: u64 },
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to parse JSON: {0}")]
    JsonDeserialization(serde_json::Error),
    #[error("failed to parse YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("schema error: {0}")]
    Schema(#[from] worksheet_schema::SchemaError),
    #[error("schema rejected: {0}")]
    Validation(#[from] worksheet_schema::ValidationError),
    #[error("legacy '{0}' schemas must be migrated, but migration is disabled")]
    LegacyMigrationDisabled(String),
}

pub type WorksheetResult<T> = std::result::Result<T, WorksheetError>;
