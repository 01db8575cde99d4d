use bulk_processor::application::callback::CallbackDispatcher;
use bulk_processor::application::intake::{BatchIntake, BatchRequest};
use bulk_processor::application::ledger::LedgerLoader;
use bulk_processor::application::runner::BatchRunner;
use bulk_processor::application::workers::{PhaseWorker, WorkerDeps};
use bulk_processor::config::Config;
use bulk_processor::domain::ports::FileStorageRef;
use bulk_processor::infrastructure::http::{HttpTransport, RestAuthorizationApi, RestCallbackSender};
use bulk_processor::infrastructure::in_memory::{InMemoryFileStorage, PassThroughHandler};
use bulk_processor::telemetry::{self, LogFormat};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a batch file and print its payer summary
    Summarize {
        /// Batch transactions CSV file
        file: PathBuf,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Take a batch file in and run it through every phase
    Run {
        /// Batch transactions CSV file
        file: PathBuf,

        #[arg(long)]
        request_id: String,

        #[arg(long, env = "BULK_TENANT")]
        tenant: String,

        #[arg(long)]
        purpose: Option<String>,

        /// Where the completion notification is POSTed
        #[arg(long)]
        callback_url: Option<String>,

        /// Completion rate reported by the local stage phases
        #[arg(long, default_value = "1")]
        completion_rate: Decimal,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let config = Arc::new(Config::from_env().into_diagnostic()?);

    match cli.command {
        Command::Summarize { file, db_path } => {
            let storage = open_storage(db_path)?;
            let file_name = store_input(&storage, &file, &config).await?;

            let ledger = LedgerLoader::new(storage, config.bucket_name.clone());
            let summary = ledger.summarize(&file_name).await.into_diagnostic()?;

            let stdout = io::stdout();
            let mut writer = csv::Writer::from_writer(stdout.lock());
            writer
                .write_record(["amount", "currency", "payerIdentifier", "transactions"])
                .into_diagnostic()?;
            writer
                .write_record([
                    summary.amount_string(),
                    summary.currency,
                    summary.payer_identifier,
                    summary.transaction_count.to_string(),
                ])
                .into_diagnostic()?;
            writer.flush().into_diagnostic()?;
        }
        Command::Run {
            file,
            request_id,
            tenant,
            purpose,
            callback_url,
            completion_rate,
            db_path,
        } => {
            if completion_rate < Decimal::ZERO || completion_rate > Decimal::ONE {
                return Err(miette!("--completion-rate must be within [0, 1]"));
            }
            let storage = open_storage(db_path)?;
            let content = tokio::fs::read(&file).await.into_diagnostic()?;

            let intake = BatchIntake::new(storage.clone(), config.clone());
            let state = intake
                .start(BatchRequest {
                    request_id,
                    file_name: base_name(&file)?,
                    purpose,
                    tenant_id: Some(tenant),
                    callback_url,
                    content,
                })
                .await
                .into_diagnostic()?;

            let transport = HttpTransport::new(config.http).into_diagnostic()?;
            let deps = WorkerDeps {
                ledger: LedgerLoader::new(storage, config.bucket_name.clone()),
                authorization: Arc::new(RestAuthorizationApi::new(
                    transport.clone(),
                    config.authorization_url.clone(),
                )),
                stages: Arc::new(PassThroughHandler::new(completion_rate)),
            };
            let runner = BatchRunner::new(
                PhaseWorker::pipeline(&config.phase_order, &deps),
                CallbackDispatcher::new(
                    Arc::new(RestCallbackSender::new(transport)),
                    config.callback.retry_limit,
                ),
            );

            let state = runner.run(state).await.into_diagnostic()?;
            let json = state.to_json().into_diagnostic()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json).into_diagnostic()?
            );
        }
    }

    Ok(())
}

fn open_storage(db_path: Option<PathBuf>) -> Result<FileStorageRef> {
    #[cfg(feature = "storage-rocksdb")]
    {
        use bulk_processor::infrastructure::rocksdb::RocksDbFileStorage;
        if let Some(db_path) = db_path {
            return Ok(Arc::new(
                RocksDbFileStorage::open(db_path).into_diagnostic()?,
            ));
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        if db_path.is_some() {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    Ok(Arc::new(InMemoryFileStorage::new()))
}

async fn store_input(storage: &FileStorageRef, file: &Path, config: &Config) -> Result<String> {
    let content = tokio::fs::read(file).await.into_diagnostic()?;
    storage
        .upload_file(&base_name(file)?, content, &config.bucket_name)
        .await
        .into_diagnostic()
}

fn base_name(file: &Path) -> Result<String> {
    file.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| miette!("{} has no usable file name", file.display()))
}
