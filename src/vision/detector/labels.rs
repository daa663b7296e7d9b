// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class id to name table owned by a detector

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// DocLayout-YOLO (DocStructBench) class names, indexed by class id
pub const DOCLAYOUT_CLASS_NAMES: &[&str] = &[
    "title",
    "plain text",
    "abandon",
    "figure",
    "figure_caption",
    "table",
    "table_caption",
    "table_footnote",
    "isolate_formula",
    "formula_caption",
];

/// Mapping from class id to class name.
///
/// Ids need not be contiguous when loaded from a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames {
    names: BTreeMap<u32, String>,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self::from_names(DOCLAYOUT_CLASS_NAMES.iter().copied())
    }
}

impl ClassNames {
    /// Build a table where the position of each name is its id
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| (id as u32, name.into()))
            .collect();
        Self { names }
    }

    /// Load a labels file.
    ///
    /// Accepts either a JSON array (`["title", "plain text"]`) or a JSON object
    /// keyed by id (`{"0": "title", "1": "plain text"}`), the latter being the
    /// shape Ultralytics stores in its `names` metadata.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Failed to parse labels file {}", path.display()))
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(contents).context("labels must be valid JSON")?;

        let table = match value {
            serde_json::Value::Array(items) => {
                let names = items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(name) => Ok(name),
                        other => anyhow::bail!("class name must be a string, got {}", other),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::from_names(names)
            }
            serde_json::Value::Object(map) => {
                let mut names = BTreeMap::new();
                for (key, item) in map {
                    let id = key
                        .trim()
                        .parse::<u32>()
                        .with_context(|| format!("class id '{}' is not a non-negative integer", key))?;
                    let name = item
                        .as_str()
                        .with_context(|| format!("class name for id {} must be a string", id))?;
                    names.insert(id, name.to_string());
                }
                Self { names }
            }
            _ => anyhow::bail!("labels must be a JSON array or object"),
        };

        if table.is_empty() {
            anyhow::bail!("labels file defines no classes");
        }

        Ok(table)
    }

    /// Resolve a class id
    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
