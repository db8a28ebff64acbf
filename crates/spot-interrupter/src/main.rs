//! ec2-spot-interrupter — trigger Amazon EC2 Spot Instance interruption
//! notifications and rebalance recommendations
//!
//! ```bash
//! # 15s rebalance-to-interruption gap, simulations cleaned up afterward
//! ec2-spot-interrupter --instance-ids i-0123456789abcdef0
//!
//! # two instances, custom gap, leave the simulations behind
//! ec2-spot-interrupter -i i-0123,i-4567 --delay 2m --clean false
//! ```

use clap::Parser;
use spot_interrupter::{
    CleanupOutcome, ConnectOptions, FisSimulation, Interrupter, InterrupterError,
    InterruptionReport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ec2-spot-interrupter is a simple CLI tool that triggers Amazon EC2 Spot
/// Instance Interruption Notifications and Rebalance Recommendations.
#[derive(Parser)]
#[command(name = "ec2-spot-interrupter")]
struct Cli {
    /// Instance IDs to interrupt
    #[arg(short = 'i', long, value_delimiter = ',')]
    instance_ids: Vec<String>,

    /// Duration until the interruption notification is sent
    #[arg(short = 'd', long, default_value = "15s")]
    delay: humantime::Duration,

    /// Clean up the underlying simulations
    #[arg(short = 'c', long, default_value_t = true, action = clap::ArgAction::Set)]
    clean: bool,

    /// The version
    #[arg(short = 'v', long)]
    version: bool,

    /// The AWS Region
    #[arg(short = 'r', long)]
    region: Option<String>,

    /// The AWS Profile
    #[arg(short = 'p', long)]
    profile: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spot_interrupter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    match run(&cli).await {
        Ok(report) => {
            if let CleanupOutcome::Failed { message } = &report.cleanup {
                eprintln!("⚠️  failed to clean up the simulations: {message}");
            }
            println!(
                "✅ Successfully sent spot rebalance recommendation and instance interruption to {:?}",
                report.targets
            );
        }
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<InterruptionReport, InterrupterError> {
    let simulation = FisSimulation::connect(&ConnectOptions {
        region: cli.region.clone(),
        profile: cli.profile.clone(),
    })
    .await?;

    Interrupter::new(simulation)
        .interrupt(&cli.instance_ids, *cli.delay, cli.clean)
        .await
}
