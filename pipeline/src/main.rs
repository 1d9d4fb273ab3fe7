//! Pipeline - approval pipeline command-line tool

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use indicators::{IndicatorCatalog, ScoreSheet, ScoringEngine};
use pipeline::{
    cli::{Args, Command},
    replay::{self, Script},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pipeline={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = args.load_config()?;

    match &args.command {
        Command::Catalog => {
            let catalog = IndicatorCatalog::standard()?;
            let domains: Vec<_> = catalog
                .list_domains()
                .iter()
                .map(|domain| {
                    let indicators = catalog.indicators_of(&domain.id).unwrap_or_default();
                    json!({
                        "id": domain.id,
                        "name": domain.name,
                        "max_points": domain.max_points,
                        "indicators": indicators,
                    })
                })
                .collect();
            let output = json!({
                "fingerprint": catalog.fingerprint(),
                "max_total": catalog.max_total(),
                "domains": domains,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Score { sheet, threshold } => {
            let yaml = std::fs::read_to_string(sheet)
                .with_context(|| format!("reading score sheet {}", sheet.display()))?;
            let sheet: ScoreSheet = serde_yaml::from_str(&yaml).context("parsing score sheet")?;

            let catalog = Arc::new(IndicatorCatalog::standard()?);
            let threshold = threshold.unwrap_or(config.scoring.eligibility_threshold);
            let engine = ScoringEngine::with_threshold(catalog, threshold);
            let assessment = engine.assess(&sheet)?;
            info!(
                total = assessment.report.total,
                threshold,
                recommendation = assessment.recommendation.as_str(),
                "Sheet scored"
            );
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }

        Command::Replay { script } => {
            let yaml = std::fs::read_to_string(script)
                .with_context(|| format!("reading script {}", script.display()))?;
            let script = Script::from_yaml(&yaml)?;
            let report = replay::run(script, config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            let unexpected = report.unexpected().len();
            if unexpected > 0 {
                anyhow::bail!("{unexpected} step(s) did not behave as the script expected");
            }
        }
    }

    Ok(())
}
