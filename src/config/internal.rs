//! Internal implementation for config module
//!
//! Typed schema of the experiment document. Every section and key is
//! required except `[query]`; serde's missing-field errors carry the key name.

use anyhow::Result;
use serde::de::{self, Error as _, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;
use crate::render::render_float;

// =============================================================================
// Config Types
// =============================================================================

/// One experiment document, loaded once and passed by reference to every stage
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub folder: FolderSection,
    pub filename: FilenameSection,
    pub indexing_parameters: IndexingParameters,
    pub settings: Settings,
    /// Query variants in document order (absent table = no variants)
    #[serde(default, deserialize_with = "ordered_variants")]
    pub query: Vec<QueryVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderSection {
    #[serde(deserialize_with = "expanded_path")]
    pub experiment: PathBuf,
    #[serde(deserialize_with = "expanded_path")]
    pub data: PathBuf,
    #[serde(deserialize_with = "expanded_path")]
    pub index: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilenameSection {
    pub dataset: String,
    /// Base name of the index artifact; parameters are appended to it
    pub index: String,
    pub queries: String,
    pub groundtruth: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexingParameters {
    pub n_postings: u64,
    pub centroid_fraction: Number,
    pub summary_energy: Number,
    pub knn: u64,
    pub kmeans_pruning_factor: Number,
    pub kmeans_doc_cut: u64,
    pub kmeans_approx: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Rebuild the index artifact before querying
    pub build: bool,
    /// Pin query processes to cores with numactl
    #[serde(rename = "NUMA")]
    pub numa: bool,
    pub k: u64,
    pub n_runs: u64,
}

/// A named `[query.<name>]` table
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVariant {
    pub name: String,
    pub query_cut: u64,
    pub heap_factor: Number,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct VariantFields {
    query_cut: u64,
    heap_factor: Number,
}

/// A numeric parameter as written in the document.
///
/// The literal kind is kept because it shows up in artifact names and flags:
/// `summary-energy = 1` renders as `1`, `summary-energy = 1.0` as `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(&render_float(*x)),
        }
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumberVisitor;

        impl Visitor<'_> for NumberVisitor {
            type Value = Number;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a float")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Number, E> {
                Ok(Number::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Number, E> {
                i64::try_from(v)
                    .map(Number::Int)
                    .map_err(|_| E::custom(format!("integer {v} is out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Number, E> {
                Ok(Number::Float(v))
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

fn ordered_variants<'de, D>(deserializer: D) -> std::result::Result<Vec<QueryVariant>, D::Error>
where
    D: Deserializer<'de>,
{
    // toml is built with preserve_order, so the table iterates in document order
    let table = toml::Table::deserialize(deserializer)?;
    table
        .into_iter()
        .map(|(name, value)| {
            let fields: VariantFields = value
                .try_into()
                .map_err(|e| D::Error::custom(format!("query.{name}: {e}")))?;
            Ok(QueryVariant {
                name,
                query_cut: fields.query_cut,
                heap_factor: fields.heap_factor,
            })
        })
        .collect()
}

fn expanded_path<'de, D>(deserializer: D) -> std::result::Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let expanded = shellexpand::full(&raw).map_err(|e| D::Error::custom(format!("{raw}: {e}")))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

// =============================================================================
// Loading
// =============================================================================

pub fn parse(text: &str) -> Result<ExperimentConfig> {
    let config: ExperimentConfig =
        toml::from_str(text).map_err(|e| HarnessError::Configuration(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

pub fn load(path: &Path) -> Result<ExperimentConfig> {
    let text = fs::read_to_string(path).map_err(|e| {
        HarnessError::Configuration(format!("cannot read {}: {e}", path.display()))
    })?;
    parse(&text).map_err(|e| {
        HarnessError::Configuration(format!("{}: {}", path.display(), root_message(&e))).into()
    })
}

fn root_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<HarnessError>() {
        Some(HarnessError::Configuration(msg)) => msg.clone(),
        _ => err.to_string(),
    }
}

/// Names end up inside file names, so they must be plain path components
fn validate(config: &ExperimentConfig) -> Result<()> {
    check_component("name", &config.name)?;
    for variant in &config.query {
        check_component(&format!("query.{}", variant.name), &variant.name)?;
    }
    Ok(())
}

fn check_component(key: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(HarnessError::Configuration(format!(
            "{key} must be a non-empty name without path separators, got {value:?}"
        ))
        .into());
    }
    Ok(())
}
