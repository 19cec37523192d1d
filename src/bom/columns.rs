use std::collections::HashSet;
use std::fs;
use std::path::{Path,PathBuf};

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize,Deserializer,Serialize};

use crate::bom::hub::RepoName;

/// Sort direction for a column, or for the grouped values within a cell.
#[derive(Debug,Clone,Copy,Eq,PartialEq,Serialize,Deserialize)]
pub enum SortOrder {
    #[serde(rename="asc")]
    Ascending,
    #[serde(rename="desc")]
    Descending
}

/// One output column and the part attributes its values are derived from.
///
/// Only `name` and `part_attributes` are required in the YAML file.  The
/// optional keys are forwarded to the generator only when they were present
/// in the input; their defaults are the generator's, not ours (unsorted,
/// no row removal, ',' as the grouped-value separator, duplicates
/// collapsed).
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct ColumnSpec {
    pub name : String,
    /// The attribute names the column value is read from, tried in order.
    /// A single string in the YAML is accepted as a one-element list.
    #[serde(deserialize_with="one_or_many")]
    pub part_attributes : Vec<String>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub sort : Option<SortOrder>,
    /// Rows whose value for this column matches the regex are dropped.
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub remove_rows_matching : Option<String>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub grouped_values_sort : Option<SortOrder>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub grouped_values_separator : Option<String>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub grouped_values_allow_duplicates : Option<bool>
}

/// The columns file as written on disk, before validation.
#[derive(Debug,Deserialize)]
struct ColumnsFile {
    columns : Vec<ColumnSpec>,
    #[serde(default)]
    design_reuse_repos : Vec<String>
}

/// The validated column configuration for one run.
///
/// Constructed once by `load_columns` and immutable afterwards.
#[derive(Debug,Clone)]
pub struct ColumnsConfig {
    pub columns : Vec<ColumnSpec>,
    /// Auxiliary repositories whose components may also appear in the BOM,
    /// in the order they are listed in the file.
    pub design_reuse_repos : Vec<RepoName>
}

impl ColumnsConfig {
    /// The configured column names, in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(thiserror::Error,Debug)]
pub enum ColumnsError {
    #[error("Columns file {0:?} does not seem to be in the right format: {1}")]
    InvalidFormat(PathBuf, serde_yaml::Error),
    #[error("Duplicate column name '{0}' in the columns file")]
    DuplicateColumn(String),
    #[error("Column '{column}' has an invalid remove_rows_matching pattern: {source}")]
    InvalidRemovePattern { column : String, source : regex::Error }
}

/// Load and validate the column configuration.
///
/// All validation happens here, before anything else in the run: a missing
/// required key, a duplicate column name, a pattern that does not compile,
/// or a malformed design-reuse identifier each abort the run without a
/// partial column map ever being used.
pub fn load_columns(path : &Path) -> anyhow::Result<ColumnsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read columns file '{}'", path.display()))?;
    let file = serde_yaml::from_str::<ColumnsFile>(&content)
        .map_err(|e| ColumnsError::InvalidFormat(path.to_path_buf(), e))?;
    validate_columns(&file.columns)?;

    let mut design_reuse_repos = Vec::with_capacity(file.design_reuse_repos.len());
    for ident in &file.design_reuse_repos {
        let repo = ident.parse::<RepoName>()
            .with_context(|| format!("Invalid design_reuse_repos entry in '{}'", path.display()))?;
        design_reuse_repos.push(repo);
    }

    Ok(ColumnsConfig { columns : file.columns, design_reuse_repos })
}

fn validate_columns(columns : &[ColumnSpec]) -> Result<(), ColumnsError> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.name.as_str()) {
            return Err(ColumnsError::DuplicateColumn(column.name.clone()));
        }
        if let Some(pattern) = &column.remove_rows_matching {
            Regex::new(pattern).map_err(|e| ColumnsError::InvalidRemovePattern {
                column : column.name.clone(),
                source : e
            })?;
        }
    }
    Ok(())
}

fn one_or_many<'de, D>(deserializer : D) -> Result<Vec<String>, D::Error>
where D : Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>)
    }
    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(attr) => { Ok(vec![attr]) }
        OneOrMany::Many(attrs) => { Ok(attrs) }
    }
}
