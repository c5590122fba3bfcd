//! One-shot operator commands. Each builds the service graph, runs a
//! single operation and prints the report as JSON.

use anyhow::{Context, Result};

use crate::commands::build_services;
use crate::config::Config;

pub(crate) async fn reconcile(config: Config) -> Result<()> {
    let services = build_services(&config).await?;
    let report = services.reconcile.run_cycle().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) async fn provision(config: Config, file: &std::path::Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading device reports from {}", file.display()))?;
    let reports: Vec<simtrack_core::DeviceReport> = serde_json::from_str(&raw)?;

    let services = build_services(&config).await?;
    let report = services.provision.provision(reports).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) async fn cleanup(config: Config) -> Result<()> {
    let services = build_services(&config).await?;
    let report = services.reconcile.cleanup_retired().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) async fn retire_all(config: Config) -> Result<()> {
    let services = build_services(&config).await?;
    let retired = services.registry.retire_all().await?;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "retired": retired }))?);
    Ok(())
}
