use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall status of a monitoring analysis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// No alert and predicted PDI above the low threshold
    #[serde(rename = "OK")]
    Ok,
    /// Anything else
    #[serde(rename = "ALERT")]
    Alert,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Alert => write!(f, "ALERT"),
        }
    }
}

/// Result of [PdiMonitor::full_analysis](crate::PdiMonitor::full_analysis)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitoringReport {
    /// Predicted PDI rounded to 2 decimals, `None` when it cannot be predicted
    pub predicted_pdi: Option<f64>,
    /// Predicted Finos rounded to 2 decimals, when the model predicts it
    pub predicted_finos: Option<f64>,
    /// Control limit violations
    pub alerts: Vec<String>,
    /// Operating recommendations
    pub recommendations: Vec<String>,
    /// Overall status
    pub status: Status,
}

impl MonitoringReport {
    /// Whether the process is in an acceptable state
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl fmt::Display for MonitoringReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Relatório de Monitoramento:")?;
        match self.predicted_pdi {
            Some(pdi) => writeln!(f, "PDI Previsto: {pdi:.2}%")?,
            None => writeln!(f, "PDI Previsto: indisponível")?,
        }
        if let Some(finos) = self.predicted_finos {
            writeln!(f, "Finos Previsto: {finos:.2}%")?;
        }
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "\nAlertas:")?;
        if self.alerts.is_empty() {
            writeln!(f, "Nenhum alerta")?;
        }
        for alert in &self.alerts {
            writeln!(f, "- {alert}")?;
        }
        writeln!(f, "\nRecomendações:")?;
        if self.recommendations.is_empty() {
            write!(f, "Nenhuma recomendação")?;
        }
        for (i, rec) in self.recommendations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {rec}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display_and_json() {
        let report = MonitoringReport {
            predicted_pdi: Some(78.5),
            predicted_finos: None,
            alerts: vec!["Taxa_Compressao não informado".to_string()],
            recommendations: vec![],
            status: Status::Alert,
        };
        let text = report.to_string();
        assert!(text.contains("PDI Previsto: 78.50%"));
        assert!(text.contains("Status: ALERT"));
        assert!(text.contains("- Taxa_Compressao não informado"));
        assert!(text.ends_with("Nenhuma recomendação"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "ALERT");
        assert!(json["predicted_finos"].is_null());
    }
}
