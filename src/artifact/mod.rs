//! Deterministic naming of index artifacts
//!
//! The artifact name is a pure function of the index base name and the
//! parameters that shape the index, in a fixed order. Identical inputs give
//! an identical name, which is what lets a run with `build = false` reuse an
//! artifact built earlier.

mod lock;

pub use lock::ArtifactLock;

use std::path::PathBuf;

use crate::config::{ExperimentConfig, IndexingParameters};

const SEPARATOR: &str = "_";

/// Canonical artifact name: base, then labelled n-postings, centroid-fraction,
/// summary-energy and knn, joined with `_`
pub fn name(base: &str, params: &IndexingParameters) -> String {
    [
        base.to_string(),
        "n-postings".to_string(),
        params.n_postings.to_string(),
        "centroid-fraction".to_string(),
        params.centroid_fraction.to_string(),
        "summary-energy".to_string(),
        params.summary_energy.to_string(),
        "knn".to_string(),
        params.knn.to_string(),
    ]
    .join(SEPARATOR)
}

/// `<folder.index>/<name>` for this experiment
pub fn path(config: &ExperimentConfig) -> PathBuf {
    config
        .folder
        .index
        .join(name(&config.filename.index, &config.indexing_parameters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Number;

    fn params() -> IndexingParameters {
        IndexingParameters {
            n_postings: 4000,
            centroid_fraction: Number::Float(0.1),
            summary_energy: Number::Float(0.4),
            knn: 0,
            kmeans_pruning_factor: Number::Float(0.005),
            kmeans_doc_cut: 15,
            kmeans_approx: true,
        }
    }

    #[test]
    fn test_name_layout() {
        assert_eq!(
            name("msmarco", &params()),
            "msmarco_n-postings_4000_centroid-fraction_0.1_summary-energy_0.4_knn_0"
        );
    }

    #[test]
    fn test_name_is_deterministic() {
        let p = params();
        assert_eq!(name("msmarco", &p), name("msmarco", &p.clone()));
    }

    #[test]
    fn test_knn_changes_name() {
        let mut other = params();
        other.knn = 10;
        assert_ne!(name("msmarco", &params()), name("msmarco", &other));
    }

    #[test]
    fn test_kmeans_parameters_do_not_change_name() {
        let mut other = params();
        other.kmeans_doc_cut = 99;
        other.kmeans_pruning_factor = Number::Float(0.5);
        other.kmeans_approx = false;
        assert_eq!(name("msmarco", &params()), name("msmarco", &other));
    }

    #[test]
    fn test_integer_literal_renders_without_decimal() {
        let mut p = params();
        p.summary_energy = Number::Int(1);
        assert_eq!(
            name("msmarco", &p),
            "msmarco_n-postings_4000_centroid-fraction_0.1_summary-energy_1_knn_0"
        );
    }

    #[test]
    fn test_small_fraction_uses_exponent_form() {
        let mut p = params();
        p.centroid_fraction = Number::Float(0.00001);
        p.summary_energy = Number::Int(1);
        assert_eq!(
            name("msmarco", &p),
            "msmarco_n-postings_4000_centroid-fraction_1e-05_summary-energy_1_knn_0"
        );
    }

    #[test]
    fn test_integral_float_literal_keeps_decimal() {
        let mut p = params();
        p.summary_energy = Number::Float(1.0);
        assert!(name("msmarco", &p).contains("_summary-energy_1.0_"));
    }
}
