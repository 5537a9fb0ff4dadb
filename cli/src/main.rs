//! hookpay: command-line wallet for bitcoin and blinded custodial coins.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use hookpay_store::record::CONFIG_KEY;
use hookpay_store::{ConfigRow, ReadOps, Store};
use hookpay_store_lmdb::LmdbBackend;
use hookpay_types::{Hash, PublicKey};
use hookpay_utils::{init_logging, LogFormat};
use hookpay_wallet_core::{
    CreateOptions, HttpSettlement, SettlementApi, Wallet, WalletError, WalletSettings,
};

#[derive(Parser)]
#[command(name = "hookpay", about = "Non-custodial wallet for bitcoin and blinded coins")]
struct Cli {
    /// Path to a TOML settings file. File values are the base; flags and
    /// env vars override them.
    #[arg(long, env = "HOOKPAY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the wallet database.
    #[arg(long, env = "HOOKPAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the settlement custodian.
    #[arg(long, env = "HOOKPAY_API_BASE")]
    api_base: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "HOOKPAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "HOOKPAY_LOG_FORMAT")]
    log_format: Option<String>,

    /// Wallet password. Prompted for when absent.
    #[arg(long, env = "HOOKPAY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create a wallet, or restore one from its mnemonic.
    Init {
        /// Restore from a mnemonic instead of generating one.
        #[arg(long)]
        restore: bool,

        /// Mnemonic to restore from. Prompted for when absent.
        #[arg(long, env = "HOOKPAY_MNEMONIC", hide_env_values = true, requires = "restore")]
        mnemonic: Option<String>,

        /// Consecutive empty addresses before discovery stops.
        #[arg(long)]
        gap_limit: Option<u32>,
    },
    /// Show the spendable balance.
    Balance,
    /// Show a fresh address to receive on.
    Receive {
        /// A bitcoin deposit address instead of a direct claimant key.
        #[arg(long)]
        bitcoin: bool,
    },
    /// Discover deposits and bounties, then claim them.
    Sync,
    /// Pay a claimant key off-chain.
    Send { claimant: PublicKey, amount: u64 },
    /// Pay out to a bitcoin address.
    Hookout {
        address: String,
        amount: u64,
        /// Fee rate in sat/vbyte. Zero queues a free batched payout.
        #[arg(long, default_value_t = 0)]
        fee_rate: u64,
    },
    /// List transfers, oldest first.
    Transfers,
    /// Retry submitting a pending transfer.
    Finalize { hash: Hash },
    /// Abandon a pending transfer and free its coins.
    Discard { hash: Hash },
    /// List unspent coins.
    Unspent,
    /// Print the recovery mnemonic.
    Mnemonic,
}

impl Command {
    fn needs_keys(&self) -> bool {
        matches!(
            self,
            Command::Sync
                | Command::Send { .. }
                | Command::Hookout { .. }
                | Command::Finalize { .. }
                | Command::Mnemonic
        )
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<WalletSettings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            WalletSettings::from_toml_file(&path)
                .with_context(|| format!("loading settings from {path}"))?
        }
        None => WalletSettings::default(),
    };
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(base) = &cli.api_base {
        settings.api_base = base.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        settings.log_format = format.clone();
    }
    Ok(settings)
}

fn prompt(label: &str) -> anyhow::Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let line = line.trim().to_string();
    if line.is_empty() {
        bail!("{label} is required");
    }
    Ok(line)
}

fn password(cli: &Cli) -> anyhow::Result<String> {
    match &cli.password {
        Some(p) => Ok(p.clone()),
        None => prompt("password"),
    }
}

async fn init(
    cli: &Cli,
    settings: &WalletSettings,
    store: Arc<Store>,
    restore: bool,
    mnemonic: Option<&str>,
    gap_limit: Option<u32>,
) -> anyhow::Result<()> {
    let api: Arc<dyn SettlementApi> = Arc::new(HttpSettlement::with_timeout(
        &settings.api_base,
        Duration::from_secs(settings.request_timeout_secs),
    )?);
    let options = CreateOptions {
        gap_limit: gap_limit.unwrap_or(settings.gap_limit),
        api_base: settings.api_base.clone(),
        ..CreateOptions::default()
    };
    let password = password(cli)?;
    if restore {
        let mnemonic = match mnemonic {
            Some(m) => m.to_string(),
            None => prompt("mnemonic")?,
        };
        let wallet = Wallet::restore(store, api, &mnemonic, &password, options).await?;
        let report = wallet.sync().await?;
        wallet.flush_background().await;
        println!(
            "restored: {} claimed, balance {}",
            report.claimed,
            wallet.balance()?
        );
    } else {
        let (_wallet, mnemonic) = Wallet::create(store, api, &password, options).await?;
        println!("wallet created. write down your recovery mnemonic:");
        println!("{}", mnemonic.as_str());
    }
    Ok(())
}

/// Open the wallet against the custodian it was created with.
async fn open(cli: &Cli, settings: &WalletSettings, store: Arc<Store>) -> anyhow::Result<Wallet> {
    let config = store
        .get::<ConfigRow>(CONFIG_KEY)?
        .ok_or(WalletError::NotInitialized)?;
    if config.api_base != settings.api_base {
        tracing::debug!(
            wallet = %config.api_base,
            settings = %settings.api_base,
            "ignoring configured custodian in favour of the wallet's own"
        );
    }
    if config.custodian.network != settings.network {
        tracing::warn!(
            custodian = config.custodian.network.as_str(),
            settings = settings.network.as_str(),
            "custodian network differs from configured network"
        );
    }
    let api: Arc<dyn SettlementApi> = Arc::new(HttpSettlement::with_timeout(
        &config.api_base,
        Duration::from_secs(settings.request_timeout_secs),
    )?);
    let wallet = Wallet::open(store, api).await?;
    if cli.command.needs_keys() {
        wallet.unlock(&password(cli)?)?;
    }
    Ok(wallet)
}

async fn run(wallet: &Wallet, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Init { .. } => return Err(WalletError::AlreadyInitialized.into()),
        Command::Balance => println!("{}", wallet.balance()?),
        Command::Receive { bitcoin: true } => {
            let row = wallet.new_bitcoin_address().await?;
            println!("{}", row.address);
        }
        Command::Receive { bitcoin: false } => {
            println!("{}", wallet.new_direct_address().await?);
        }
        Command::Sync => {
            let report = wallet.sync().await?;
            wallet.flush_background().await;
            println!(
                "addresses +{} bitcoin +{} direct, hookins +{}, bounties +{}, transfers +{}, claimed {}, failed {}",
                report.new_bitcoin_addresses,
                report.new_direct_addresses,
                report.new_hookins,
                report.new_bounties,
                report.new_transfers,
                report.claimed,
                report.claim_failures,
            );
            println!("balance {}", wallet.balance()?);
        }
        Command::Send { claimant, amount } => {
            let record = wallet.send_direct(claimant, amount).await?;
            wallet.flush_background().await;
            println!("{} {}", record.hash, record.status);
        }
        Command::Hookout {
            address,
            amount,
            fee_rate,
        } => {
            let record = wallet
                .send_to_bitcoin_address(&address, amount, fee_rate)
                .await?;
            wallet.flush_background().await;
            println!("{} {}", record.hash, record.status);
        }
        Command::Transfers => {
            for record in wallet.list_transfers()? {
                println!(
                    "{} {:>12} {:<12} fee {}",
                    record.hash,
                    record.transfer.output_amount(),
                    record.status.to_string(),
                    record.transfer.fee().unwrap_or(0),
                );
            }
        }
        Command::Finalize { hash } => {
            let record = wallet.finalize_transfer(hash).await?;
            wallet.flush_background().await;
            println!("{} {}", record.hash, record.status);
        }
        Command::Discard { hash } => {
            let record = wallet.discard_transfer(hash).await?;
            println!("{} {}", record.hash, record.status);
        }
        Command::Unspent => {
            for coin in wallet.list_unspent()? {
                println!("{} {:>12}", coin.owner, coin.amount());
            }
        }
        Command::Mnemonic => println!("{}", wallet.mnemonic()?.as_str()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let format: LogFormat = settings.log_format.parse()?;
    init_logging(format, &settings.log_level)?;

    let backend = LmdbBackend::open(&settings.data_dir, settings.map_size_bytes())
        .with_context(|| format!("opening wallet store at {}", settings.data_dir.display()))?;
    let store = Arc::new(Store::new(Arc::new(backend)));

    if let Command::Init {
        restore,
        mnemonic,
        gap_limit,
    } = &cli.command
    {
        return init(&cli, &settings, store, *restore, mnemonic.as_deref(), *gap_limit).await;
    }
    let wallet = open(&cli, &settings, store).await?;
    run(&wallet, cli.command).await
}
