//! Canonical process variables of the pelletizer line.
//!
//! Raw exports use legacy labels (`Porc Pdi Tyl6`, `Tx Compressao Matriz`, ...).
//! They are mapped once, by the loader, to the canonical underscored names
//! below which are used everywhere else.
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::errors::DataError;

/// Canonical name of the pellet durability index target
pub const PDI: &str = "PDI";
/// Canonical name of the fines percentage target
pub const FINOS: &str = "Finos";
/// Target columns, never used as model inputs
pub const TARGETS: [&str; 2] = [PDI, FINOS];

/// A process variable of the fixed schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Pellet durability index (target)
    #[serde(rename = "PDI")]
    Pdi,
    /// Boiler steam pressure
    #[serde(rename = "Pressao_Caldeira")]
    PressaoCaldeira,
    /// Die compression ratio
    #[serde(rename = "Taxa_Compressao")]
    TaxaCompressao,
    /// Roller gap
    #[serde(rename = "Afastamento_Rolos")]
    AfastamentoRolos,
    /// Conditioner motor current
    #[serde(rename = "Amperagem_Condicionador")]
    AmperagemCondicionador,
    /// Feeder speed
    #[serde(rename = "Velocidade_Alimentador")]
    VelocidadeAlimentador,
    /// Conditioner temperature
    #[serde(rename = "Temp_Condicionador")]
    TempCondicionador,
    /// Steam pressure at the conditioner
    #[serde(rename = "Pressao_Vapor")]
    PressaoVapor,
    /// Pelletizer motor current
    #[serde(rename = "Amperagem_Peletizadora")]
    AmperagemPeletizadora,
    /// Fines percentage (target)
    #[serde(rename = "Finos")]
    Finos,
}

impl Variable {
    /// All variables in file order
    pub const ALL: [Variable; 10] = [
        Variable::Pdi,
        Variable::PressaoCaldeira,
        Variable::TaxaCompressao,
        Variable::AfastamentoRolos,
        Variable::AmperagemCondicionador,
        Variable::VelocidadeAlimentador,
        Variable::TempCondicionador,
        Variable::PressaoVapor,
        Variable::AmperagemPeletizadora,
        Variable::Finos,
    ];

    /// Process inputs, the variables a live reading provides
    pub const INPUTS: [Variable; 8] = [
        Variable::PressaoCaldeira,
        Variable::TaxaCompressao,
        Variable::AfastamentoRolos,
        Variable::AmperagemCondicionador,
        Variable::VelocidadeAlimentador,
        Variable::TempCondicionador,
        Variable::PressaoVapor,
        Variable::AmperagemPeletizadora,
    ];

    /// Canonical column name
    pub fn name(&self) -> &'static str {
        match self {
            Variable::Pdi => PDI,
            Variable::PressaoCaldeira => "Pressao_Caldeira",
            Variable::TaxaCompressao => "Taxa_Compressao",
            Variable::AfastamentoRolos => "Afastamento_Rolos",
            Variable::AmperagemCondicionador => "Amperagem_Condicionador",
            Variable::VelocidadeAlimentador => "Velocidade_Alimentador",
            Variable::TempCondicionador => "Temp_Condicionador",
            Variable::PressaoVapor => "Pressao_Vapor",
            Variable::AmperagemPeletizadora => "Amperagem_Peletizadora",
            Variable::Finos => FINOS,
        }
    }

    /// Label used by the plant data exports
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Variable::Pdi => "Porc Pdi Tyl6",
            Variable::PressaoCaldeira => "Pres Vapor Caldeira",
            Variable::TaxaCompressao => "Tx Compressao Matriz",
            Variable::AfastamentoRolos => "Afastamento Rolos",
            Variable::AmperagemCondicionador => "Amperagem Condicionador",
            Variable::VelocidadeAlimentador => "Velocidade Alimentador",
            Variable::TempCondicionador => "Porc Temp Condicionador",
            Variable::PressaoVapor => "Pressao Vapor",
            Variable::AmperagemPeletizadora => "Amperagem Peletizadora",
            Variable::Finos => "Porc Finos Tyl6",
        }
    }

    /// Whether the variable is a quality target
    pub fn is_target(&self) -> bool {
        matches!(self, Variable::Pdi | Variable::Finos)
    }

    /// Lookup by legacy label
    pub fn from_legacy_label(label: &str) -> Option<Variable> {
        Variable::ALL
            .iter()
            .find(|v| v.legacy_label() == label)
            .copied()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Variable {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .iter()
            .find(|v| v.name() == s)
            .copied()
            .ok_or_else(|| DataError::SchemaError(format!("unknown variable '{s}'")))
    }
}

/// Canonical name for a raw column label, legacy labels are translated,
/// anything else is returned unchanged.
pub fn canonical_name(label: &str) -> &str {
    match Variable::from_legacy_label(label) {
        Some(v) => v.name(),
        None => label,
    }
}

/// Whether the column name is one of the targets
pub fn is_target(name: &str) -> bool {
    TARGETS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_mapping_is_one_to_one() {
        for v in Variable::ALL {
            assert_eq!(Variable::from_legacy_label(v.legacy_label()), Some(v));
            assert_eq!(v.name().parse::<Variable>().unwrap(), v);
        }
        assert_eq!(canonical_name("Porc Temp Condicionador"), "Temp_Condicionador");
        assert_eq!(canonical_name("Turno"), "Turno");
    }

    #[test]
    fn test_targets() {
        assert!(Variable::Pdi.is_target());
        assert!(Variable::Finos.is_target());
        assert!(Variable::INPUTS.iter().all(|v| !v.is_target()));
        assert!(is_target("Finos"));
        assert!(!is_target("Pressao_Vapor"));
    }
}
