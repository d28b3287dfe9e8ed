use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Channel through which a batch reaches the accounting service.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Channel {
    Cr,
    Streamed,
    /// Bulk transfer journal
    Transfer,
}

impl Channel {
    pub fn table_key(&self) -> &'static str {
        match self {
            Channel::Cr => "CR",
            Channel::Streamed => "STREAMED",
            Channel::Transfer => "総振",
        }
    }
}

/// Single-digit codes used when building voucher numbers.
#[derive(Clone, Debug, Deserialize)]
pub struct CodeTables {
    pub channels: HashMap<String, u8>,
    pub departments: HashMap<String, u8>,
}

impl Default for CodeTables {
    fn default() -> Self {
        Self {
            channels: HashMap::from([
                ("CR".to_string(), 1),
                ("STREAMED".to_string(), 2),
                ("総振".to_string(), 3),
            ]),
            departments: HashMap::from([
                ("本部".to_string(), 1),
                ("泉佐野センターホテル".to_string(), 2),
                ("リコホテル三国".to_string(), 3),
                ("OKINIホテル(本館)".to_string(), 4),
                ("OKINI別館".to_string(), 5),
            ]),
        }
    }
}

impl CodeTables {
    pub fn from_path(path: &Path) -> Result<Self, CodesError> {
        let content = fs::read_to_string(path).map_err(|source| CodesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CodesError> {
        let tables: CodeTables = serde_json::from_str(content)?;
        tables.check_digits()?;
        Ok(tables)
    }

    pub fn channel_code(&self, channel: Channel) -> Result<u8, CodesError> {
        self.channels
            .get(channel.table_key())
            .copied()
            .ok_or(CodesError::UnknownChannel(channel.table_key()))
    }

    pub fn department_code(&self, department: &str) -> Option<u8> {
        self.departments.get(department).copied()
    }

    fn check_digits(&self) -> Result<(), CodesError> {
        for (name, code) in self.channels.iter().chain(self.departments.iter()) {
            if *code > 9 {
                return Err(CodesError::NotSingleDigit(name.clone(), *code));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CodesError {
    #[error("Cannot read code tables `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid code tables: `{0}`")]
    Json(#[from] serde_json::Error),
    #[error("Code for `{0}` must be a single digit, got `{1}`")]
    NotSingleDigit(String, u8),
    #[error("No code configured for channel `{0}`")]
    UnknownChannel(&'static str),
}
