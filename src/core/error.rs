use thiserror::Error;

use crate::repair::RepairError;

#[derive(Error, Debug)]
pub enum DamageError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown subsystem: {0}")]
    UnknownSubsystem(String),

    #[error("Insufficient {resource}: need {required:.1}, have {available:.1}")]
    InsufficientResources {
        resource: String,
        required: f32,
        available: f32,
    },

    #[error(transparent)]
    Repair(#[from] RepairError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DamageError>;
