use std::{error::Error, fmt};

#[derive(Debug)]
pub enum MergerError {
    ConfigError(String),
    InputError(String),
    StorageError(String),
    ToolError(String),
}

impl fmt::Display for MergerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            MergerError::InputError(msg) => write!(f, "Input error: {}", msg),
            MergerError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            MergerError::ToolError(msg) => write!(f, "Tool error: {}", msg),
        }
    }
}

impl Error for MergerError {}
