//! Apply the ledger schema to the configured Postgres database.
//!
//! Configuration comes from `config/tally.toml` and `TALLY__*` environment
//! variables; logging from `RUST_LOG`.

use std::process::ExitCode;

use tracing::{error, info};

use tally_ledger::{Ledger, LedgerConfig, OperationContext};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tally_observability::init();

    let config = match LedgerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    info!(
        host = %config.database.host,
        port = config.database.port,
        dbname = %config.database.dbname,
        "applying ledger schema"
    );

    let ledger = match Ledger::connect(&config).await {
        Ok(ledger) => ledger,
        Err(e) => {
            error!(error = %e, "migration failed");
            return ExitCode::FAILURE;
        }
    };

    let ctx = OperationContext::background();
    match (
        ledger.list_account_types(&ctx).await,
        ledger.list_currencies(&ctx).await,
    ) {
        (Ok(types), Ok(currencies)) => {
            info!(
                account_types = types.len(),
                currencies = currencies.len(),
                "schema ready"
            );
            ExitCode::SUCCESS
        }
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "schema check failed");
            ExitCode::FAILURE
        }
    }
}
