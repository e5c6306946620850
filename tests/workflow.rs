use approx::assert_abs_diff_eq;
use pelletq::pelletq_data::Variable;
use pelletq::pelletq_model::{ForestGrid, ModelKind, TrainerConfig};
use pelletq::pelletq_monitor::{SensorReading, Status};
use pelletq::{MonitoringWorkflow, PelletConfig, PelletError, TrainingWorkflow};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn pdi_of(amp: f64, compression: f64, speed: f64) -> f64 {
    70. + 0.5 * (amp - 630.) + 20. * (compression - 18.8) - 0.2 * (speed - 40.)
}

fn value(var: Variable, i: usize) -> f64 {
    match var {
        Variable::PressaoCaldeira => 8.5 + ((i * 5) % 9) as f64 * 0.1,
        Variable::TaxaCompressao => 18.8 + ((i * 3) % 10) as f64 * 0.02,
        Variable::AfastamentoRolos => 0.,
        Variable::AmperagemCondicionador => 36. + ((i * 13) % 7) as f64,
        Variable::VelocidadeAlimentador => 40. + ((i * 11) % 25) as f64,
        Variable::TempCondicionador => 78. + ((i * 17) % 6) as f64,
        Variable::PressaoVapor => 1.3 + ((i * 7) % 4) as f64 * 0.05,
        Variable::AmperagemPeletizadora => 630. + ((i * 7) % 30) as f64,
        Variable::Pdi | Variable::Finos => f64::NAN,
    }
}

/// Plant export with legacy labels, `;` separator and decimal commas
fn write_export(path: &Path, nrows: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut file = fs::File::create(path).unwrap();
    let header: Vec<&str> = Variable::ALL.iter().map(|v| v.legacy_label()).collect();
    writeln!(file, "{}", header.join(";")).unwrap();
    for i in 0..nrows {
        let pdi = pdi_of(
            value(Variable::AmperagemPeletizadora, i),
            value(Variable::TaxaCompressao, i),
            value(Variable::VelocidadeAlimentador, i),
        );
        let cells: Vec<String> = Variable::ALL
            .iter()
            .map(|&var| {
                let v = match var {
                    Variable::Pdi => pdi,
                    Variable::Finos => 30. - 0.25 * pdi,
                    _ => value(var, i),
                };
                // one missing cell to impute
                if i == 3 && var == Variable::PressaoVapor {
                    String::new()
                } else {
                    format!("{v:.4}").replace('.', ",")
                }
            })
            .collect();
        writeln!(file, "{}", cells.join(";")).unwrap();
    }
}

fn config(dir: &str, kind: ModelKind) -> PelletConfig {
    let dir = PathBuf::from(dir);
    PelletConfig::default()
        .data_path(dir.join("plant.csv"))
        .model_dir(dir.join("models"))
        .report_dir(dir.join("reports"))
        .model_kind(kind)
}

fn reading(amp: f64, compression: f64, speed: f64) -> SensorReading {
    Variable::INPUTS
        .iter()
        .map(|&var| {
            let v = match var {
                Variable::AmperagemPeletizadora => amp,
                Variable::TaxaCompressao => compression,
                Variable::VelocidadeAlimentador => speed,
                _ => value(var, 0),
            };
            (var.name().to_string(), v)
        })
        .collect()
}

#[test]
fn test_train_then_monitor_linear() {
    let config = config("target/tests/workflow_linear", ModelKind::LinearBayesian);
    write_export(&config.paths.data_path, 40);

    let outcome = TrainingWorkflow::new(config.clone()).run().unwrap();
    assert!(outcome.model_path.ends_with("linear_bayesian_model.bin"));
    assert!(outcome.model_path.exists());
    assert!(outcome.cv_score.mean > 0.9);

    let importance = outcome.importance.as_ref().unwrap();
    assert_eq!(importance.ranking()[0].0, "Amperagem_Peletizadora");
    assert!(outcome
        .recommendations
        .contains(&"Tente aumentar a variável 'Amperagem_Peletizadora' para melhorar o PDI.".to_string()));
    let report = fs::read_to_string(&outcome.recommendations_path).unwrap();
    assert!(report.starts_with("Recomendações para melhorar o PDI:\n\n- Tente"));

    assert!(!outcome.ideal_settings.contains_key("PDI"));
    assert!(outcome.ideal_settings.contains_key("Taxa_Compressao"));
    let ideal = fs::read_to_string(outcome.ideal_settings_path.as_ref().unwrap()).unwrap();
    assert!(ideal.contains("Amperagem_Peletizadora: "));
    assert!(!ideal.contains("Finos:"));

    let workflow = MonitoringWorkflow::from_config(&config).unwrap();
    assert!(workflow.monitor().model().predicts_finos());

    let good = workflow.analyze(&reading(659., 18.96, 45.));
    assert!(good.report.alerts.is_empty());
    assert_abs_diff_eq!(
        good.report.predicted_pdi.unwrap(),
        pdi_of(659., 18.96, 45.),
        epsilon = 0.5
    );
    assert_eq!(good.report.status, Status::Ok);
    assert!(good.ideal_scenario);

    let bad = workflow.analyze(&reading(600., 18.5, 70.));
    assert_eq!(bad.report.alerts.len(), 3);
    assert_eq!(bad.report.status, Status::Alert);
    assert_eq!(bad.report.recommendations.len(), 3);
    assert!(!bad.ideal_scenario);
}

#[test]
fn test_train_forest() {
    let trainer = TrainerConfig::default().forest_grid(ForestGrid {
        n_trees: vec![10],
        max_depth: vec![None, Some(3)],
        min_samples_split: vec![2],
        min_samples_leaf: vec![1],
    });
    let config = config("target/tests/workflow_forest", ModelKind::RandomForest).trainer(trainer);
    write_export(&config.paths.data_path, 40);

    let outcome = TrainingWorkflow::new(config.clone()).run().unwrap();
    assert!(outcome.model_path.ends_with("random_forest_model.bin"));
    let importance = outcome.importance.unwrap();
    assert_abs_diff_eq!(importance.total_weight(), 1., epsilon = 1e-9);
    assert!(outcome
        .recommendations
        .iter()
        .all(|r| r.starts_with("Tente aumentar")));

    let workflow = MonitoringWorkflow::from_config(&config).unwrap();
    let outcome = workflow.analyze(&reading(645., 18.9, 50.));
    assert!(outcome.report.predicted_pdi.is_some());
    assert!(outcome.report.predicted_finos.is_some());
}

#[test]
fn test_missing_inputs() {
    let config = config("target/tests/workflow_missing", ModelKind::LinearBayesian);
    assert!(matches!(
        TrainingWorkflow::new(config.clone()).run(),
        Err(PelletError::LoadFailed(_))
    ));
    assert!(matches!(
        MonitoringWorkflow::from_config(&config),
        Err(PelletError::MonitorError(_))
    ));
}

#[test]
fn test_config_file() {
    let dir = PathBuf::from("target/tests/workflow_config");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("pelletq.json");
    fs::write(
        &path,
        r#"{"model_kind": "gradient_boosting", "rules": {"low_pdi": 78}}"#,
    )
    .unwrap();
    let config = PelletConfig::from_file(&path).unwrap();
    assert_eq!(config.model_kind, ModelKind::GradientBoosting);
    assert_eq!(config.rules.low_pdi, 78.);
    assert_eq!(config.rules.high_pdi, 85.);

    fs::write(&path, r#"{"model_kind": "svm"}"#).unwrap();
    assert!(matches!(
        PelletConfig::from_file(&path),
        Err(PelletError::JsonError(_))
    ));
}
