// src/conditions/mod.rs

use std::{fs, io, path::Path};
use tracing::{debug, info};

use crate::error::InputError;
use crate::types::FilterDefinition;

pub mod bracket;

/// How plain condition lists are delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    Newline,
    Comma,
    Semicolon,
    Tab,
    Custom(String),
}

impl Separator {
    fn split<'a>(&self, raw: &'a str) -> Result<Vec<&'a str>, InputError> {
        Ok(match self {
            Separator::Newline => raw.lines().collect(),
            Separator::Comma => raw.split(',').collect(),
            Separator::Semicolon => raw.split(';').collect(),
            Separator::Tab => raw.split('\t').collect(),
            Separator::Custom(sep) if sep.is_empty() => return Err(InputError::EmptySeparator),
            Separator::Custom(sep) => raw.split(sep.as_str()).collect(),
        })
    }
}

/// Delimited list, or the `name: ( ... )` bracket dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMode {
    Split(Separator),
    Brackets,
}

impl Default for LoadMode {
    fn default() -> Self {
        LoadMode::Split(Separator::Newline)
    }
}

/// Read the conditions file at `path`.
pub fn load_conditions(
    path: impl AsRef<Path>,
    mode: &LoadMode,
) -> Result<Vec<FilterDefinition>, InputError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => InputError::FileNotFound(path.to_path_buf()),
        _ => InputError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let filters = parse_conditions(&raw, mode)?;
    info!(path = %path.display(), count = filters.len(), "loaded conditions");
    Ok(filters)
}

/// Turn raw file text into named conditions, preserving their order.
pub fn parse_conditions(raw: &str, mode: &LoadMode) -> Result<Vec<FilterDefinition>, InputError> {
    match mode {
        LoadMode::Brackets => Ok(bracket::parse_entries(raw)),
        LoadMode::Split(sep) => {
            let filters: Vec<FilterDefinition> = sep
                .split(raw)?
                .into_iter()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .enumerate()
                .map(|(i, expr)| FilterDefinition::new(FilterDefinition::positional_name(i + 1), expr))
                .collect();
            debug!(separator = ?sep, count = filters.len(), "split conditions");
            Ok(filters)
        }
    }
}
