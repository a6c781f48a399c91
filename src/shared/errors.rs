use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    /// Requested time is not the start of a generated slot, or lies outside
    /// the station's operating hours.
    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    /// Lost the race for a slot (or it was already taken).
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    /// Storage-level uniqueness violation on the active-slot key.
    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Booking {id} is already {status}")]
    AlreadyTerminal { id: String, status: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if the caller retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }

    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<InfraError> for DomainError {
    fn from(e: InfraError) -> Self {
        DomainError::Storage(e.to_string())
    }
}
