//! 错误定义模块

use crate::models::RecordKind;
use thiserror::Error;

/// 医院记录系统统一错误类型
#[derive(Error, Debug)]
pub enum HospitalError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: RecordKind, id: String },
}

impl HospitalError {
    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn duplicate(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::Duplicate { kind, id: id.into() }
    }
}

/// 医院记录系统统一结果类型
pub type Result<T> = std::result::Result<T, HospitalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = HospitalError::not_found(RecordKind::Patient, "P9");
        assert_eq!(err.to_string(), "Patient not found: P9");
    }

    #[test]
    fn test_duplicate_message() {
        let err = HospitalError::duplicate(RecordKind::Doctor, "D1");
        assert_eq!(err.to_string(), "Doctor already exists: D1");
    }

    #[test]
    fn test_validation_message() {
        let err = HospitalError::Validation("Patient id cannot be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: Patient id cannot be empty");
    }
}
