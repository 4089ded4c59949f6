//! Version distribution aggregation.

use std::collections::BTreeMap;

/// Count of instances per reported version in one round.
///
/// Built fresh each round, no carry-over. A `BTreeMap` so iteration (and
/// therefore the status line) is sorted by version key.
pub type VersionHistogram = BTreeMap<String, u32>;

/// Fold one round's observations into a histogram.
///
/// Pure count fold; input order never affects the result. Probe failures
/// are filtered out before this point and contribute nothing.
pub fn aggregate(observations: impl IntoIterator<Item = String>) -> VersionHistogram {
    let mut histogram = VersionHistogram::new();
    for version in observations {
        *histogram.entry(version).or_insert(0) += 1;
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(versions: &[&str]) -> Vec<String> {
        versions.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn counts_per_version() {
        let h = aggregate(obs(&["v1", "v2", "v1", "v1"]));
        assert_eq!(h.get("v1"), Some(&3));
        assert_eq!(h.get("v2"), Some(&1));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn order_independent() {
        let a = aggregate(obs(&["v1", "v2", "v3", "v1", "v2"]));
        let b = aggregate(obs(&["v2", "v1", "v2", "v3", "v1"]));
        let c = aggregate(obs(&["v3", "v2", "v2", "v1", "v1"]));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn empty_observations_empty_histogram() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn iteration_is_sorted_by_version_key() {
        let h = aggregate(obs(&["v9", "v10", "v2"]));
        let keys: Vec<&str> = h.keys().map(String::as_str).collect();
        // Lexicographic on the version string.
        assert_eq!(keys, vec!["v10", "v2", "v9"]);
    }
}
