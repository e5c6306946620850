use crate::errors::{MonitorError, Result};
use crate::limits::{ControlLimits, RecommendationRules};
use crate::reading::SensorReading;
use crate::report::{MonitoringReport, Status};
use log::{debug, warn};
use ndarray::{Array2, ArrayView1};
use pelletq_data::Variable;
use pelletq_model::TrainedModel;
use std::path::Path;

/// Shortest round-trip form of `v` which keeps a decimal on whole numbers:
/// 19.0 reads "19.0", not "19".
fn decimal(v: f64) -> String {
    if v.is_finite() && v.fract() == 0. && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Alerts for every limited variable of `reading` which is absent or out of
/// its `[lower, upper]` range, in the order of `limits`.
pub fn check_parameters(reading: &SensorReading, limits: &ControlLimits) -> Vec<String> {
    limits
        .iter()
        .filter_map(|limit| {
            let var = &limit.variable;
            match reading.get(var) {
                None => Some(format!("{var} não informado")),
                Some(value) if value < limit.lower => Some(format!(
                    "{var} abaixo do mínimo ({} < {})",
                    decimal(value),
                    decimal(limit.lower)
                )),
                Some(value) if value > limit.upper => Some(format!(
                    "{var} acima do máximo ({} > {})",
                    decimal(value),
                    decimal(limit.upper)
                )),
                Some(_) => None,
            }
        })
        .collect()
}

/// Operating recommendations given the predicted PDI.
///
/// A low PDI triggers each applicable corrective rule independently, a high
/// PDI yields a single "keep going" message. Nothing is recommended in
/// between or when the PDI is unknown. A rule whose variable is absent from
/// the reading does not fire.
pub fn recommend(
    reading: &SensorReading,
    predicted_pdi: Option<f64>,
    rules: &RecommendationRules,
) -> Vec<String> {
    let mut recs = Vec::new();
    let Some(pdi) = predicted_pdi else {
        return recs;
    };
    if pdi < rules.low_pdi {
        if let Some(amp) = reading.get(Variable::AmperagemPeletizadora.name()) {
            if amp < rules.min_amperage {
                recs.push(format!(
                    "Aumentar amperagem da peletizadora para >{}A",
                    rules.min_amperage
                ));
            }
        }
        if let Some(compression) = reading.get(Variable::TaxaCompressao.name()) {
            if compression < rules.min_compression {
                recs.push(format!(
                    "Aumentar taxa de compressão para ~{}",
                    rules.target_compression
                ));
            }
        }
        if let Some(speed) = reading.get(Variable::VelocidadeAlimentador.name()) {
            if speed > rules.max_feeder_speed {
                recs.push(format!(
                    "Reduzir velocidade do alimentador para <{}",
                    rules.max_feeder_speed
                ));
            }
        }
    } else if pdi > rules.high_pdi {
        recs.push("Parâmetros ótimos - manter configuração atual".to_string());
    }
    recs
}

/// Interpret one row of model outputs as `(pdi, finos)`
pub fn split_prediction(
    outputs: ArrayView1<f64>,
    predicts_finos: bool,
) -> Result<(f64, Option<f64>)> {
    match (outputs.len(), predicts_finos) {
        (1, false) => Ok((outputs[0], None)),
        (2, true) => Ok((outputs[0], Some(outputs[1]))),
        (n, _) => Err(MonitorError::PredictionShape(n)),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.).round() / 100.
}

/// Live monitoring of the pelletizer with a trained model
#[derive(Clone, Debug)]
pub struct PdiMonitor {
    model: TrainedModel,
    limits: ControlLimits,
    rules: RecommendationRules,
}

impl PdiMonitor {
    /// Constructor
    pub fn new(model: TrainedModel, limits: ControlLimits, rules: RecommendationRules) -> Self {
        PdiMonitor {
            model,
            limits,
            rules,
        }
    }

    /// Monitor with a model saved at `path`
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        limits: ControlLimits,
        rules: RecommendationRules,
    ) -> Result<Self> {
        let model = TrainedModel::load(path)?;
        Ok(PdiMonitor::new(model, limits, rules))
    }

    /// Underlying model
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Control limits
    pub fn limits(&self) -> &ControlLimits {
        &self.limits
    }

    /// Recommendation thresholds
    pub fn rules(&self) -> &RecommendationRules {
        &self.rules
    }

    /// Control limit alerts, see [check_parameters]
    pub fn check_parameters(&self, reading: &SensorReading) -> Vec<String> {
        check_parameters(reading, &self.limits)
    }

    /// Predict `(pdi, finos)` from a live reading.
    ///
    /// Inputs are taken from the reading in the model feature order, target
    /// values possibly present in the reading are not used. Failures do not
    /// propagate: a missing feature or a non finite output yields an unknown
    /// PDI, an unexpected output shape falls back to the first output as PDI.
    pub fn predict(&self, reading: &SensorReading) -> (Option<f64>, Option<f64>) {
        let features = self.model.features();
        let mut x = Array2::zeros((1, features.len()));
        for (j, feature) in features.iter().enumerate() {
            match reading.get(feature) {
                Some(value) => x[[0, j]] = value,
                None => {
                    warn!("Cannot predict PDI, '{feature}' is not provided");
                    return (None, None);
                }
            }
        }
        let y = match self.model.predict(&x) {
            Ok(y) => y,
            Err(err) => {
                warn!("Cannot predict PDI: {err}");
                return (None, None);
            }
        };
        let (pdi, finos) = match split_prediction(y.row(0), self.model.predicts_finos()) {
            Ok(prediction) => prediction,
            Err(err) => {
                warn!("{err}, first output used as PDI");
                (y.get((0, 0)).copied().unwrap_or(f64::NAN), None)
            }
        };
        if !pdi.is_finite() {
            warn!("Non finite PDI prediction ({pdi})");
            return (None, None);
        }
        let finos = finos.filter(|f| {
            let finite = f.is_finite();
            if !finite {
                warn!("Non finite Finos prediction ({f})");
            }
            finite
        });
        debug!("Predicted PDI={pdi} Finos={finos:?}");
        (Some(pdi), finos)
    }

    /// Operating recommendations, see [recommend]
    pub fn recommend(&self, reading: &SensorReading, predicted_pdi: Option<f64>) -> Vec<String> {
        recommend(reading, predicted_pdi, &self.rules)
    }

    /// Limit check, prediction and recommendations in one report.
    ///
    /// Status is OK only when there is no alert and the predicted PDI is
    /// known and at least the low PDI threshold.
    pub fn full_analysis(&self, reading: &SensorReading) -> MonitoringReport {
        let alerts = self.check_parameters(reading);
        let (pdi, finos) = self.predict(reading);
        let recommendations = self.recommend(reading, pdi);
        let status = match pdi {
            Some(pdi) if alerts.is_empty() && pdi >= self.rules.low_pdi => Status::Ok,
            _ => Status::Alert,
        };
        MonitoringReport {
            predicted_pdi: pdi.map(round2),
            predicted_finos: finos.map(round2),
            alerts,
            recommendations,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use pelletq_data::Dataset;
    use pelletq_model::{ModelKind, ModelTrainer, TrainerConfig};

    const AMP: &str = "Amperagem_Peletizadora";
    const TC: &str = "Taxa_Compressao";
    const VEL: &str = "Velocidade_Alimentador";

    fn trained_model(paired: bool) -> TrainedModel {
        let n = 40;
        let mut x = Array2::zeros((n, 3));
        for i in 0..n {
            x[[i, 0]] = 630. + ((i * 7) % 30) as f64;
            x[[i, 1]] = 18.8 + ((i * 3) % 10) as f64 * 0.02;
            x[[i, 2]] = 40. + ((i * 11) % 25) as f64;
        }
        let pdi = Array1::from_iter(x.rows().into_iter().map(|r| {
            70. + 0.5 * (r[0] - 630.) + 20. * (r[1] - 18.8) - 0.2 * (r[2] - 40.)
        }));
        let finos = pdi.mapv(|p| 30. - 0.25 * p);
        let ds = Dataset::new(vec![AMP.into(), TC.into(), VEL.into()], x).unwrap();
        let mut trainer = ModelTrainer::new(TrainerConfig::default());
        let model = if paired {
            trainer.train_paired(&ds, &pdi, &finos, ModelKind::LinearBayesian)
        } else {
            trainer.train(&ds, &pdi, ModelKind::LinearBayesian)
        };
        model.unwrap().clone()
    }

    fn monitor(paired: bool) -> PdiMonitor {
        PdiMonitor::new(
            trained_model(paired),
            ControlLimits::default(),
            RecommendationRules::default(),
        )
    }

    fn nominal() -> SensorReading {
        SensorReading::new()
            .with(AMP, 650.)
            .with(TC, 18.9)
            .with(VEL, 45.)
    }

    #[test]
    fn test_low_amperage_alert() {
        let reading = nominal().with(AMP, 600.);
        let alerts = check_parameters(&reading, &ControlLimits::default());
        assert_eq!(
            alerts,
            vec!["Amperagem_Peletizadora abaixo do mínimo (600.0 < 630.0)".to_string()]
        );
    }

    #[test]
    fn test_alerts_in_limit_order() {
        let reading = SensorReading::new().with(TC, 19.5);
        let alerts = check_parameters(&reading, &ControlLimits::default());
        assert_eq!(
            alerts,
            vec![
                "Amperagem_Peletizadora não informado".to_string(),
                "Taxa_Compressao acima do máximo (19.5 > 19.0)".to_string(),
                "Velocidade_Alimentador não informado".to_string(),
            ]
        );
        assert!(check_parameters(&nominal(), &ControlLimits::default()).is_empty());
    }

    #[test]
    fn test_recommendation_rules() {
        let rules = RecommendationRules::default();
        let reading = SensorReading::new()
            .with(AMP, 600.)
            .with(TC, 18.5)
            .with(VEL, 70.);
        assert_eq!(
            recommend(&reading, Some(75.), &rules),
            vec![
                "Aumentar amperagem da peletizadora para >640A".to_string(),
                "Aumentar taxa de compressão para ~18.94".to_string(),
                "Reduzir velocidade do alimentador para <60".to_string(),
            ]
        );
        assert_eq!(
            recommend(&reading, Some(90.), &rules),
            vec!["Parâmetros ótimos - manter configuração atual".to_string()]
        );
        assert!(recommend(&reading, Some(82.), &rules).is_empty());
        assert!(recommend(&reading, None, &rules).is_empty());
        let partial = SensorReading::new().with(TC, 18.5);
        assert_eq!(recommend(&partial, Some(75.), &rules).len(), 1);
    }

    #[test]
    fn test_split_prediction_shapes() {
        assert_eq!(split_prediction(array![81.].view(), false).unwrap(), (81., None));
        assert_eq!(
            split_prediction(array![81., 9.].view(), true).unwrap(),
            (81., Some(9.))
        );
        assert!(matches!(
            split_prediction(array![81., 9., 1.].view(), true),
            Err(MonitorError::PredictionShape(3))
        ));
    }

    #[test]
    fn test_predict_ignores_targets_and_degrades() {
        let monitor = monitor(false);
        let (pdi, finos) = monitor.predict(&nominal());
        assert_abs_diff_eq!(pdi.unwrap(), 70. + 10. + 2. - 1., epsilon = 0.5);
        assert!(finos.is_none());
        let (with_targets, _) = monitor.predict(&nominal().with("PDI", 10.).with("Finos", 50.));
        assert_eq!(with_targets, pdi);
        let incomplete = SensorReading::new().with(AMP, 650.);
        assert_eq!(monitor.predict(&incomplete), (None, None));
    }

    #[test]
    fn test_full_analysis() {
        let monitor = monitor(true);
        let report = monitor.full_analysis(&nominal().with(AMP, 659.).with(TC, 18.96));
        assert!(report.alerts.is_empty());
        assert!(report.predicted_finos.is_some());
        let pdi = report.predicted_pdi.unwrap();
        assert_abs_diff_eq!(pdi, round2(pdi));
        assert!(pdi > 85.);
        assert_eq!(report.status, Status::Ok);

        let report = monitor.full_analysis(&nominal().with(AMP, 600.));
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.status, Status::Alert);

        let report = monitor.full_analysis(&SensorReading::new());
        assert_eq!(report.alerts.len(), 3);
        assert_eq!(report.predicted_pdi, None);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.status, Status::Alert);
    }

    #[test]
    fn test_decimal_keeps_whole_numbers_fractional() {
        assert_eq!(decimal(19.), "19.0");
        assert_eq!(decimal(18.95), "18.95");
        assert_eq!(decimal(-3.), "-3.0");
        assert_eq!(decimal(f64::INFINITY), "inf");
    }

    #[test]
    fn test_alert_overrides_high_pdi() {
        let monitor = monitor(false);
        let report = monitor.full_analysis(&nominal().with(AMP, 680.).with(TC, 18.95));
        assert_eq!(
            report.alerts,
            vec!["Amperagem_Peletizadora acima do máximo (680.0 > 660.0)".to_string()]
        );
        let pdi = report.predicted_pdi.unwrap();
        assert!(pdi >= RecommendationRules::default().high_pdi);
        assert_abs_diff_eq!(pdi, 97., epsilon = 1.);
        assert_eq!(
            report.recommendations,
            vec!["Parâmetros ótimos - manter configuração atual".to_string()]
        );
        assert_eq!(report.status, Status::Alert);
        assert!(!report.is_ok());
    }

    #[test]
    fn test_unknown_pdi_is_alert_without_alerts() {
        let monitor = PdiMonitor::new(
            trained_model(false),
            ControlLimits::empty(),
            RecommendationRules::default(),
        );
        let report = monitor.full_analysis(&SensorReading::new().with(AMP, 650.));
        assert!(report.alerts.is_empty());
        assert_eq!(report.predicted_pdi, None);
        assert_eq!(report.status, Status::Alert);
    }
}
