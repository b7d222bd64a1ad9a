#[derive(clap::Parser)]
#[command(version, about)]
struct Cli {
    /// Read configuration from TOML file instead of environment variables
    #[arg(short = 'c', long, value_name = "CONFIG FILE")]
    config_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: CliCommands,
}

#[derive(clap::Subcommand)]
enum CliCommands {
    /// Check certificates and send audit / report notifications
    Check {
        /// Print notifications to stdout instead of publishing to SNS
        #[arg(long)]
        dry_run: bool,

        /// Check PEM files in this directory instead of ACM
        #[arg(long, value_name = "DIR")]
        pem_dir: Option<std::path::PathBuf>,
    },
    /// Print remaining days of every certificate, publish nothing
    List {
        /// List PEM files in this directory instead of ACM
        #[arg(long, value_name = "DIR")]
        pem_dir: Option<std::path::PathBuf>,
    },
}

/// main() for generic environment
#[tokio::main]
async fn main() {
    use clap::Parser;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), acm_expiry_checker::Error> {
    use acm_expiry_checker::*;

    match cli.command {
        CliCommands::Check { dry_run, pem_dir } => {
            let config = match &cli.config_file {
                Some(config_file) => AuditConfig::from_file(config_file)?,
                None => AuditConfig::from_env()?,
            };
            let aws_sdk_config = aws_config_from_env(config.region()).await;

            let inventory: Box<dyn InventoryProvider> = match pem_dir {
                Some(dir) => Box::new(PemDirInventory::new(dir)),
                None => Box::new(AcmInventory::new(&aws_sdk_config, config.statuses())),
            };
            let publisher: Box<dyn NotificationPublisher> = if dry_run {
                Box::new(StdoutPublisher)
            } else {
                Box::new(SnsPublisher::new(&aws_sdk_config))
            };

            let result = CertificateAuditor::new(&config)
                .run(inventory.as_ref(), publisher.as_ref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
        }
        CliCommands::List { pem_dir } => {
            // Topics are not needed to list
            let config = match &cli.config_file {
                Some(config_file) => AuditConfig::inventory_from_file(config_file)?,
                None => AuditConfig::inventory_from_env()?,
            };

            let inventory: Box<dyn InventoryProvider> = match pem_dir {
                Some(dir) => Box::new(PemDirInventory::new(dir)),
                None => {
                    let aws_sdk_config = aws_config_from_env(config.region()).await;
                    Box::new(AcmInventory::new(&aws_sdk_config, config.statuses()))
                }
            };

            let report = CertificateAuditor::new(&config)
                .list_at(chrono::Utc::now(), inventory.as_ref())
                .await?;
            println!("{}", report);
        }
    }

    Ok(())
}
