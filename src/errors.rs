use thiserror::Error;

/// Raised when a raw document cannot be turned into a rich item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
  #[error("raw item {uuid} has no `data` object")]
  MissingData { uuid: String },
  #[error("raw item {uuid} is missing mandatory field `data.{field}`")]
  MissingField { field: &'static str, uuid: String },
}

impl MappingError {
  pub fn uuid(&self) -> &str {
    match self {
      MappingError::MissingData { uuid } | MappingError::MissingField { uuid, .. } => uuid,
    }
  }
}
