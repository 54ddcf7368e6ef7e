use clap::Parser;
use fetchload_etl::adapters::{build_archive, PgWarehouse, SftpConnector};
use fetchload_etl::config::LogFormat;
use fetchload_etl::utils::{logger, validation::Validate};
use fetchload_etl::{CliArgs, EtlConfig, EtlEngine, FetchLoadProcessor};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Usage errors exit here, before anything is built.
    let args = CliArgs::parse();

    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }
    tracing::debug!("CLI args: {:?}", args);

    let config = match EtlConfig::from_file(&args.config).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args, &config).await {
        tracing::error!("❌ Run failed for {}: {}", args.run_date, e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: &CliArgs, config: &EtlConfig) -> fetchload_etl::Result<()> {
    let source = args.file_format.build(config)?;
    let archive = build_archive(&config.archive).await?;
    let warehouse = Arc::new(PgWarehouse::new(config.database.clone()));

    let mut processor = FetchLoadProcessor::new(config, args.run_date, source, archive, warehouse);
    if let Some(sftp) = &config.sftp {
        processor = processor.with_remote(Arc::new(SftpConnector::new(sftp.clone())));
    }

    EtlEngine::new(processor).run(args.flags()).await
}
