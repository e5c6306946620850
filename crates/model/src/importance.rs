use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Nature of the scores of a [FeatureImportance] ranking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportanceKind {
    /// Impurity decrease of tree ensembles, non negative and summing to 1
    Impurity,
    /// Signed coefficient of a linear model fitted on scaled features
    Coefficient,
}

impl fmt::Display for ImportanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportanceKind::Impurity => write!(f, "Importance"),
            ImportanceKind::Coefficient => write!(f, "Coefficient"),
        }
    }
}

/// Features ranked by decreasing signed score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    kind: ImportanceKind,
    ranking: Vec<(String, f64)>,
}

impl FeatureImportance {
    /// Rank `names` by decreasing `scores`, equal scores keep the feature order
    pub fn new(kind: ImportanceKind, names: &[String], scores: &Array1<f64>) -> FeatureImportance {
        let mut ranking: Vec<(String, f64)> = names.iter().cloned().zip(scores.iter().copied()).collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        FeatureImportance { kind, ranking }
    }

    /// Kind of scores
    pub fn kind(&self) -> ImportanceKind {
        self.kind
    }

    /// (feature, score) pairs, best first
    pub fn ranking(&self) -> &[(String, f64)] {
        &self.ranking
    }

    /// Score of the given feature
    pub fn score(&self, feature: &str) -> Option<f64> {
        self.ranking
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, s)| *s)
    }

    /// The `n` best ranked features
    pub fn top(&self, n: usize) -> &[(String, f64)] {
        &self.ranking[..n.min(self.ranking.len())]
    }

    /// Sum of absolute scores
    pub fn total_weight(&self) -> f64 {
        self.ranking.iter().map(|(_, s)| s.abs()).sum()
    }

    /// Number of ranked features
    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    /// Whether no feature is ranked
    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }
}

impl fmt::Display for FeatureImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.ranking.iter().map(|(n, _)| n.len()).max().unwrap_or(0).max(7);
        writeln!(f, "{:<width$} {:>12}", "Feature", self.kind.to_string())?;
        for (name, score) in &self.ranking {
            writeln!(f, "{name:<width$} {score:>12.6}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ranking_is_stable() {
        let names: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let fi = FeatureImportance::new(ImportanceKind::Coefficient, &names, &array![0.5, -2., 0.5, 1.]);
        let order: Vec<&str> = fi.ranking().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["d", "a", "c", "b"]);
        assert_eq!(fi.score("b"), Some(-2.));
        assert_eq!(fi.total_weight(), 4.);
        assert_eq!(fi.top(2).len(), 2);
        assert_eq!(fi.top(10).len(), 4);
        assert!(fi.to_string().contains("Coefficient"));
    }
}
