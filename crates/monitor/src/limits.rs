use pelletq_data::Variable;
use serde::{Deserialize, Serialize};

/// Acceptable operating range of one process variable
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlLimit {
    /// Canonical variable name
    pub variable: String,
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
}

/// Ordered control limits, checked in insertion order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlLimits(Vec<ControlLimit>);

impl Default for ControlLimits {
    fn default() -> Self {
        ControlLimits::empty()
            .with(Variable::AmperagemPeletizadora.name(), 630., 660.)
            .with(Variable::TaxaCompressao.name(), 18.8, 19.0)
            .with(Variable::VelocidadeAlimentador.name(), 35., 60.)
    }
}

impl ControlLimits {
    /// No limit
    pub fn empty() -> ControlLimits {
        ControlLimits(Vec::new())
    }

    /// Add (or replace in place) the `[lower, upper]` range of `variable`
    pub fn with(mut self, variable: &str, lower: f64, upper: f64) -> Self {
        let limit = ControlLimit {
            variable: variable.to_string(),
            lower,
            upper,
        };
        match self.0.iter_mut().find(|l| l.variable == variable) {
            Some(existing) => *existing = limit,
            None => self.0.push(limit),
        }
        self
    }

    /// Range of the given variable
    pub fn get(&self, variable: &str) -> Option<(f64, f64)> {
        self.0
            .iter()
            .find(|l| l.variable == variable)
            .map(|l| (l.lower, l.upper))
    }

    /// Limits in check order
    pub fn iter(&self) -> impl Iterator<Item = &ControlLimit> {
        self.0.iter()
    }

    /// Number of limited variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variable is limited
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Thresholds of the rule based recommendations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationRules {
    /// Below this predicted PDI, corrective actions are recommended
    pub low_pdi: f64,
    /// Above this predicted PDI, the configuration is to be kept
    pub high_pdi: f64,
    /// Pelletizer amperage under which raising it is recommended
    pub min_amperage: f64,
    /// Compression ratio under which raising it is recommended
    pub min_compression: f64,
    /// Compression ratio to aim at
    pub target_compression: f64,
    /// Feeder speed above which reducing it is recommended
    pub max_feeder_speed: f64,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        RecommendationRules {
            low_pdi: 80.,
            high_pdi: 85.,
            min_amperage: 640.,
            min_compression: 18.9,
            target_compression: 18.94,
            max_feeder_speed: 60.,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_order() {
        let limits = ControlLimits::default();
        let names: Vec<&str> = limits.iter().map(|l| l.variable.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Amperagem_Peletizadora",
                "Taxa_Compressao",
                "Velocidade_Alimentador"
            ]
        );
        assert_eq!(limits.get("Taxa_Compressao"), Some((18.8, 19.0)));
        let limits = limits.with("Taxa_Compressao", 18.7, 19.1);
        assert_eq!(limits.len(), 3);
        assert_eq!(limits.get("Taxa_Compressao"), Some((18.7, 19.1)));
    }

    #[test]
    fn test_limits_json() {
        let json = serde_json::to_string(&ControlLimits::default()).unwrap();
        assert!(json.starts_with("[{\"variable\":\"Amperagem_Peletizadora\""));
        let back: ControlLimits = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ControlLimits::default());
        let rules: RecommendationRules = serde_json::from_str("{\"low_pdi\": 78}").unwrap();
        assert_eq!(rules.low_pdi, 78.);
        assert_eq!(rules.high_pdi, 85.);
    }
}
