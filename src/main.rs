use clap::Parser;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallet_overview::{
    config::AppConfig,
    services::{
        solana::parse_commitment, CoinGeckoPriceClient, RpcNetworkClient, SolanaNetwork,
        StaticMetadataResolver,
    },
    AggregationController, WalletIdentity,
};

#[derive(Parser)]
#[command(name = "wallet-overview")]
#[command(about = "Solana wallet overview: SOL balance, token holdings, metadata and fiat price")]
#[command(version = "0.1.0")]
struct Cli {
    /// Wallet public key (base58)
    #[arg(short, long)]
    wallet: String,

    /// Configuration file path, without extension
    #[arg(short, long, default_value = "config/default")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Override the configured network (mainnet-beta, devnet, testnet, localnet)
    #[arg(long)]
    network: Option<String>,

    /// Override the RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug)?;

    info!("Starting wallet overview...");
    info!("Configuration: {}", cli.config);

    let config = load_config(&cli)?;
    let wallet = WalletIdentity::from_str(&cli.wallet)?;

    let controller = create_controller(&config)?;
    let mut updates = controller.subscribe();

    controller.on_identity_change(Some(wallet)).await;

    loop {
        let state = updates.borrow_and_update().clone();
        println!("{}\n", state.render());

        if state.is_settled() {
            if let Some(value) = state.native_fiat_value() {
                info!(
                    "Native balance worth {} {}",
                    value.round_dp(2),
                    config.price.fiat_currency.to_uppercase()
                );
            }
            break;
        }

        tokio::select! {
            changed = updates.changed() => changed?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Received interrupt signal, shutting down...");
                break;
            }
        }
    }

    Ok(())
}

/// Initialize logging system
fn init_logging(log_level: &str, debug: bool) -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            "wallet_overview=debug,reqwest=debug".into()
        } else {
            format!("wallet_overview={}", log_level.to_lowercase()).into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

/// Load configuration and apply command line overrides
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_from(&cli.config)?;

    if let Some(network) = &cli.network {
        config.solana.network = SolanaNetwork::from_str(network)?.to_string();
    }
    if let Some(rpc_url) = &cli.rpc_url {
        config.solana.rpc_url = Some(rpc_url.clone());
    }

    config.validate()?;
    info!("Configuration loaded successfully");
    Ok(config)
}

/// Wire the production clients into a controller
fn create_controller(config: &AppConfig) -> anyhow::Result<AggregationController> {
    let rpc_url = config.rpc_url()?;
    let network = RpcNetworkClient::new(
        &rpc_url,
        parse_commitment(&config.solana.commitment)?,
        Duration::from_secs(config.solana.timeout_seconds),
    );
    info!("Solana RPC: {} ({})", network.url(), config.network()?);

    let price = CoinGeckoPriceClient::new(
        &config.price.base_url,
        config.price.api_key.clone(),
        Duration::from_secs(config.price.timeout_seconds),
    )?;
    let metadata = StaticMetadataResolver::new(config.token_metadata());

    Ok(AggregationController::new(
        config.aggregator_config()?,
        Arc::new(network),
        Arc::new(price),
        Arc::new(metadata),
    ))
}
