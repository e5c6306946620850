use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use pelletq::pelletq_data::load;
use pelletq::pelletq_model::ModelKind;
use pelletq::pelletq_monitor::{find_ideal_settings, SensorReading};
use pelletq::{load_clean_data, MonitoringWorkflow, PelletConfig, TrainingWorkflow, PELLETQ_LOG};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pelletq")]
#[command(about = "Pellet durability prediction and pelletizer monitoring", long_about = None)]
struct Cli {
    /// JSON configuration file, defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Model kind: linear_bayesian, random_forest or gradient_boosting
    #[arg(long, global = true, value_parser = parse_model_kind)]
    model: Option<ModelKind>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model on the plant data, save it and write reports
    Train {
        /// Plant data export, overrides the configured one
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Analyze a live reading given as a JSON object of variable values
    Monitor {
        /// JSON file of the reading
        #[arg(long)]
        reading: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Median settings of historical batches of good quality
    Ideal {
        /// Plant data export, overrides the configured one
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Descriptive statistics of the plant data
    Summary {
        /// Plant data export, overrides the configured one
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn parse_model_kind(s: &str) -> Result<ModelKind, String> {
    s.parse::<ModelKind>().map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let env = Env::new().filter_or(PELLETQ_LOG, "info");
    let mut builder = Builder::from_env(env);
    builder.target(env_logger::Target::Stdout).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PelletConfig::from_file(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?,
        None => PelletConfig::default(),
    };
    if let Some(kind) = cli.model {
        config = config.model_kind(kind);
    }

    match cli.command {
        Commands::Train { data } => {
            if let Some(data) = data {
                config = config.data_path(data);
            }
            let outcome = TrainingWorkflow::new(config).run()?;
            println!("Model saved in {}", outcome.model_path.display());
            println!("Performance CV: {}", outcome.cv_score);
            if let Some(importance) = &outcome.importance {
                println!("\n{importance}");
            }
            println!("Report saved in {}", outcome.recommendations_path.display());
            match &outcome.ideal_settings_path {
                Some(path) => println!("Ideal settings saved in {}", path.display()),
                None => println!("No ideal settings to save"),
            }
        }
        Commands::Monitor { reading, json } => {
            let file = File::open(&reading)
                .with_context(|| format!("cannot open reading {}", reading.display()))?;
            let reading: SensorReading = serde_json::from_reader(BufReader::new(file))
                .context("reading should be a JSON object of numbers")?;
            let outcome = MonitoringWorkflow::from_config(&config)?.analyze(&reading);
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.report)?);
            } else {
                println!("{}", outcome.report);
            }
            if outcome.ideal_scenario {
                println!("\nCenário ideal atingido");
            }
        }
        Commands::Ideal { data } => {
            if let Some(data) = data {
                config = config.data_path(data);
            }
            let dataset = load_clean_data(&config)?;
            let settings = find_ideal_settings(&dataset, &config.ideal)?;
            if settings.is_empty() {
                println!("Dados insuficientes para encontrar configurações ideais");
            }
            for (variable, value) in &settings {
                println!("{variable}: {value:.4}");
            }
        }
        Commands::Summary { data } => {
            let path = data.unwrap_or_else(|| config.paths.data_path.clone());
            let dataset = load(&path)?;
            println!("{}", dataset.describe()?);
        }
    }
    Ok(())
}
