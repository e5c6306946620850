//! Plain text reports written after training.
use crate::errors::Result;
use log::info;
use pelletq_data::is_target;
use pelletq_model::{FeatureImportance, ImportanceKind};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default minimum score of a feature worth a recommendation
pub const IMPORTANCE_THRESHOLD: f64 = 0.05;

const RECOMMENDATIONS_HEADER: &str = "Recomendações para melhorar o PDI:";
const NO_RECOMMENDATION: &str = "Nenhuma recomendação gerada.";
const IDEAL_SETTINGS_HEADER: &str = "Configurações Ideais para PDI Alto e Finos Baixos:";

/// One recommendation per feature whose score exceeds `threshold`, in
/// ranking order. Coefficients are compared in absolute value and their sign
/// gives the direction.
pub fn generate_recommendations(importance: &FeatureImportance, threshold: f64) -> Vec<String> {
    importance
        .ranking()
        .iter()
        .filter(|(_, score)| match importance.kind() {
            ImportanceKind::Impurity => *score > threshold,
            ImportanceKind::Coefficient => score.abs() > threshold,
        })
        .map(|(feature, score)| {
            let direction = if *score > 0. { "aumentar" } else { "reduzir" };
            format!("Tente {direction} a variável '{feature}' para melhorar o PDI.")
        })
        .collect()
}

/// Path of the recommendations report of `model_name` in `dir`
pub fn recommendations_path<P: AsRef<Path>>(dir: P, model_name: &str) -> PathBuf {
    dir.as_ref().join(format!("recomendacoes_{model_name}.txt"))
}

/// Path of the ideal settings report of `model_name` in `dir`
pub fn ideal_settings_path<P: AsRef<Path>>(dir: P, model_name: &str) -> PathBuf {
    dir.as_ref().join(format!("configuracoes_ideais_{model_name}.txt"))
}

fn create<P: AsRef<Path>>(dir: P, path: &Path) -> Result<BufWriter<File>> {
    fs::create_dir_all(dir)?;
    Ok(BufWriter::new(File::create(path)?))
}

/// Write `recomendacoes_{model_name}.txt` in `dir`
pub fn save_recommendations<P: AsRef<Path>>(
    dir: P,
    model_name: &str,
    recommendations: &[String],
) -> Result<PathBuf> {
    let path = recommendations_path(&dir, model_name);
    let mut writer = create(&dir, &path)?;
    writeln!(writer, "{RECOMMENDATIONS_HEADER}\n")?;
    if recommendations.is_empty() {
        writeln!(writer, "{NO_RECOMMENDATION}")?;
    }
    for rec in recommendations {
        writeln!(writer, "- {rec}")?;
    }
    writer.flush()?;
    info!("Report saved in {}", path.display());
    Ok(path)
}

/// Write `configuracoes_ideais_{model_name}.txt` in `dir`, targets excluded.
/// Nothing is written for empty settings.
pub fn save_ideal_settings<P: AsRef<Path>>(
    dir: P,
    model_name: &str,
    settings: &BTreeMap<String, f64>,
) -> Result<Option<PathBuf>> {
    if settings.is_empty() {
        info!("No ideal settings to save");
        return Ok(None);
    }
    let path = ideal_settings_path(&dir, model_name);
    let mut writer = create(&dir, &path)?;
    writeln!(writer, "{IDEAL_SETTINGS_HEADER}\n")?;
    for (variable, value) in settings.iter().filter(|(v, _)| !is_target(v)) {
        writeln!(writer, "{variable}: {value:.4}")?;
    }
    writer.flush()?;
    info!("Ideal settings saved in {}", path.display());
    Ok(Some(path))
}
