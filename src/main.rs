use ans_etl::utils::{logger, validation::Validate};
use ans_etl::{CliConfig, DisclosurePipeline, EtlEngine, LocalStorage, TomlConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting ans-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("System monitoring enabled");
    }

    let output_path = if let Some(path) = cli.config.clone() {
        tracing::info!("Loading configuration from {}", path);
        let config = TomlConfig::from_file(&path)?;
        run(config, monitor_enabled).await?
    } else {
        run(cli, monitor_enabled).await?
    };

    tracing::info!("ETL process completed successfully");
    println!("Output saved to: {}", output_path);

    Ok(())
}

async fn run<C>(config: C, monitor_enabled: bool) -> anyhow::Result<String>
where
    C: ans_etl::core::ConfigProvider + Validate,
{
    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        return Err(e.into());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = DisclosurePipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let output_path = engine.run().await?;
    Ok(output_path)
}
