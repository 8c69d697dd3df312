use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrellisError {
    /// Schema declarations contradict each other (duplicate tables, dangling relations)
    #[error("Schema corrupted: {0}")]
    SchemaCorrupted(String),

    /// A `many` relation has no matching `one` relation on the opposite table
    #[error("Relation \"{relation}\" in table \"{table}\" is corrupted")]
    RelationCorrupted { table: String, relation: String },

    /// A `many` relation matches more than one `one` relation and no identifier disambiguates it
    #[error("Relation \"{relation}\" in table \"{table}\" is ambiguous: {candidates} matching relations")]
    AmbiguousRelation {
        table: String,
        relation: String,
        candidates: usize,
    },

    /// Column or table builder misuse
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown table name
    #[error("Table \"{0}\" not found")]
    TableNotFound(String),

    /// Unknown column or field reference
    #[error("Column \"{0}\" not found")]
    ColumnNotFound(String),

    /// Unknown relation, or a table without declared relations
    #[error("Relation \"{relation}\" not found for table \"{table}\"")]
    RelationNotFound { table: String, relation: String },

    /// Insert executed without values
    #[error("No values found for insert into \"{0}\"")]
    MissingValues(String),

    /// Update executed without sets
    #[error("No sets found for update of \"{0}\"")]
    MissingSets(String),

    /// Malformed statement descriptor
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// Error mapping data
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Error with transaction
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Rollback requested from inside a transaction callback
    #[error("Transaction rolled back")]
    Rollback,

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("Database error: {0}")]
    Other(String),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, TrellisError>;
