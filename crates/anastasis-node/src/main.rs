//! anastasis-node — the Anastasis provider-side service binary.
//!
//! Two CLI entry points are in scope (spec.md §6); everything else
//! (HTTP dispatch, the `config` tool) is an external collaborator:
//!   - `dbinit [-r] [-g]` — open/reset the database, optionally GC.
//!   - `helper-authorization-iban [-t]` — run the wire-transfer ingester.

mod bank;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use anastasis_core::constants::{GC_EXPIRE_BACKUPS_AFTER, GC_EXPIRE_PAYMENTS_AFTER};
use anastasis_core::{Amount, Timestamp};
use anastasis_store::{StateDb, Store};
use anastasis_wire::WireIngester;

use crate::bank::ReqwestBankClient;
use crate::config::Config;

/// Exit code for "plugin load" / configuration-section-missing failures,
/// matching `EXIT_NOTCONFIGURED`/`EXIT_NOTINSTALLED` in the original
/// `anastasis-dbinit.c` (spec.md §6: "77 on plugin/load failure").
const EXIT_NOT_CONFIGURED: u8 = 77;

#[derive(Parser, Debug)]
#[command(name = "anastasis-node", version, about = "Anastasis key-recovery provider service")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "anastasis.conf")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialise (and optionally reset/GC) the database.
    Dbinit {
        /// Drop all tables before recreating them.
        #[arg(short = 'r', long)]
        reset: bool,
        /// Run garbage collection after table creation.
        #[arg(short = 'g', long)]
        gc: bool,
    },
    /// Run the IBAN wire-transfer ingester.
    HelperAuthorizationIban {
        /// Import everything currently pending, then exit.
        #[arg(short = 't', long)]
        test_mode: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,anastasis=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let cfg = Config::load(&args.config).context("loading configuration")?;

    match args.command {
        Command::Dbinit { reset, gc } => Ok(dbinit(&cfg, reset, gc)?),
        Command::HelperAuthorizationIban { test_mode } => helper_authorization_iban(&cfg, test_mode).await,
    }
}

/// Mirrors `anastasis-dbinit.c`'s `run()`: reset failures are logged but
/// non-fatal (tables are recreated anyway), table-creation failure is
/// fatal (exit 1), GC failure is logged but non-fatal.
fn dbinit(cfg: &Config, reset: bool, gc: bool) -> anyhow::Result<ExitCode> {
    let db = match StateDb::open(&cfg.anastasis.db) {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "failed to open/create database");
            return Ok(ExitCode::from(1));
        }
    };

    if reset {
        info!("dropping existing tables");
        if let Err(e) = db.drop_tables() {
            error!(error = %e, "dropping tables failed, proceeding to recreate anyway");
        }
    }

    if gc {
        let store = Store::new(Arc::new(db));
        let now = Timestamp::now();
        if let Err(e) = store.gc(now - GC_EXPIRE_BACKUPS_AFTER, now - GC_EXPIRE_PAYMENTS_AFTER) {
            error!(error = %e, "garbage collection pass failed");
        }
    }

    info!("dbinit complete");
    Ok(ExitCode::SUCCESS)
}

/// Mirrors `anastasis-helper-authorization-iban.c`'s `run()`: missing
/// `[authorization-iban]` configuration is treated as "not configured"
/// (exit 77); a fatal ingestion error (row-monotonicity violation,
/// database hard error) is a nonzero exit.
async fn helper_authorization_iban(cfg: &Config, test_mode: bool) -> anyhow::Result<ExitCode> {
    let Some(iban_cfg) = &cfg.authorization_iban else {
        error!("missing [authorization-iban] configuration section");
        return Ok(ExitCode::from(EXIT_NOT_CONFIGURED));
    };

    let db = StateDb::open(&cfg.anastasis.db).context("opening state database")?;
    let store = Arc::new(Store::new(Arc::new(db)));

    let bank = Arc::new(ReqwestBankClient::new(
        iban_cfg.bank_base_url.clone(),
        iban_cfg.credit_iban.clone(),
        iban_cfg.bank_username.clone(),
        iban_cfg.bank_password.clone(),
    ));

    let _cost = Amount::from_str(&iban_cfg.cost).context("parsing authorization-iban COST")?;

    let ingester = WireIngester::new(store, bank, iban_cfg.credit_iban.clone(), test_mode);

    info!(credit_iban = %iban_cfg.credit_iban, test_mode, "starting IBAN wire-transfer ingester");
    match ingester.run().await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "ingester exited with a fatal error");
            Ok(ExitCode::from(1))
        }
    }
}
