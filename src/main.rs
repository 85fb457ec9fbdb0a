use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use contract_bind::bind::waiter::{wait_deployed, wait_mined};
use contract_bind::config::Config;
use contract_bind::greeter::{deploy_greeter, Greeter};
use contract_bind::utils::{explain_error, validate_address, validate_network};
use contract_bind::{
    parse_private_key, BindError, CallOptions, FilterOptions, ProviderBackend, TransactOptions,
    TransactorBackend,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const OPERATOR_KEY_ENV: &str = "OPERATOR_PRIVATE_KEY";

fn explained(err: BindError) -> anyhow::Error {
    anyhow!("{} ({})", explain_error(&err), err)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("contract-bind")
        .version("0.1.0")
        .about("Deploys and exercises the Store greeter contract over JSON-RPC")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .help("Network to use (mainnet, testnet, previewnet, local)"),
        )
        .arg(
            Arg::new("mainnet")
                .long("mainnet")
                .help("Shorthand for --network mainnet")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["network", "previewnet"]),
        )
        .arg(
            Arg::new("previewnet")
                .long("previewnet")
                .help("Shorthand for --network previewnet")
                .action(ArgAction::SetTrue)
                .conflicts_with("network"),
        )
        .arg(
            Arg::new("rpc-url")
                .short('r')
                .long("rpc-url")
                .value_name("URL")
                .help("RPC endpoint URL"),
        )
        .arg(
            Arg::new("address")
                .short('a')
                .long("address")
                .value_name("ADDRESS")
                .help("Use an already deployed greeter instead of deploying one"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load_or_default(config_path).await;

    if matches.get_flag("mainnet") {
        config.default_network = "mainnet".to_string();
    } else if matches.get_flag("previewnet") {
        config.default_network = "previewnet".to_string();
    } else if let Some(network) = matches.get_one::<String>("network") {
        config.default_network = network.clone();
    }
    validate_network(&config.default_network, &config.available_networks())?;

    if let Some(rpc_url) = matches.get_one::<String>("rpc-url") {
        config.override_rpc_url(rpc_url);
    }

    let existing = matches
        .get_one::<String>("address")
        .map(|a| validate_address(a))
        .transpose()?;

    let key = std::env::var(OPERATOR_KEY_ENV)
        .map_err(|_| anyhow!("{} must be set to the operator's private key", OPERATOR_KEY_ENV))?;
    let signer = Arc::new(parse_private_key(&key).map_err(explained)?);

    let network = config.network(None)?;
    info!(
        "Using network {} ({}, chain id {})",
        config.default_network, network.rpc_url, network.chain_id
    );

    let provider = Arc::new(ProviderBackend::connect(&network.rpc_url).await.map_err(explained)?);
    let latest = provider.check_connection().await.map_err(explained)?;
    info!("Connected, latest block {}", latest);
    let chain_id = provider.chain_id().await.map_err(explained)?;
    if chain_id != network.chain_id {
        return Err(anyhow!(
            "Connected node reports chain id {}, configured {} is {}",
            chain_id,
            config.default_network,
            network.chain_id
        ));
    }

    let operator = signer.address();
    let balance = provider.balance_at(operator).await.map_err(explained)?;
    println!("Operator: {}", operator);
    println!("Balance:  {} wei", balance);

    let cancel = CancellationToken::new();
    let wait_config = config.wait.to_wait_config();

    let gas_price = match network.gas.gas_price {
        Some(price) => u128::from(price),
        None => provider.suggest_gas_price().await.map_err(explained)?,
    };
    let base_opts = {
        let opts = TransactOptions::new(signer)
            .gas_price(gas_price)
            .with_cancel(cancel.clone());
        match network.gas.gas_limit {
            Some(limit) => opts.gas_limit(limit),
            None => opts,
        }
    };

    let greeter = match existing {
        Some(address) => {
            println!("Using greeter at {}", address);
            Greeter::new(address, provider.clone()).map_err(explained)?
        }
        None => {
            let nonce = provider.pending_nonce_at(operator).await.map_err(explained)?;
            let (address, pending, greeter) =
                deploy_greeter(&base_opts.clone().nonce(nonce), provider.clone(), "initial_msg")
                    .await
                    .map_err(explained)?;
            println!("Deploy tx: 0x{:x}", pending.hash);

            wait_deployed(provider.as_ref(), &cancel, &pending, &wait_config)
                .await
                .map_err(explained)?;
            println!("Greeter deployed at {}", address);
            greeter
        }
    };

    let receipt_block = {
        let nonce = provider.pending_nonce_at(operator).await.map_err(explained)?;
        let pending = greeter
            .set_greeting(&base_opts.clone().nonce(nonce), "updated_msg")
            .await
            .map_err(explained)?;
        println!("setGreeting tx: 0x{:x}", pending.hash);

        let receipt = wait_mined(provider.as_ref(), &cancel, &pending, &wait_config)
            .await
            .map_err(explained)?;
        if !receipt.succeeded() {
            return Err(anyhow!(
                "setGreeting transaction 0x{:x} failed in block {}",
                pending.hash,
                receipt.block_number
            ));
        }
        receipt.block_number
    };

    let mut events = greeter
        .filterer()
        .filter_greeting_set(&FilterOptions {
            from_block: receipt_block,
            to_block: Some(receipt_block),
            ..Default::default()
        })
        .await
        .map_err(explained)?;
    while events.advance() {
        if let Some(event) = events.current() {
            println!("GreetingSet: {:?}", event.greeting);
        }
    }
    if let Some(e) = events.error() {
        error!("Could not read GreetingSet events: {}", e);
    }

    let greeting = greeter
        .greet(&CallOptions::new().with_cancel(cancel))
        .await
        .map_err(explained)?;
    println!("Greeting: {}", greeting);

    Ok(())
}
