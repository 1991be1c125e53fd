use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use medimport::device::FindmntInspector;
use medimport::import::{ImportQueue, JobOutcome};
use medimport::model::{ImportRequest, ImportStatus};
use medimport::{config, logging, Config};

#[derive(Parser)]
#[command(name = "medimport", version, about = "Import media from removable volumes into a date-bucketed archive")]
struct Cli {
    /// Path to the YAML config file; falls back to the platform default
    /// location, then to built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the device behind a mounted volume and import its media files.
    Import {
        /// Path the volume is mounted at.
        volume_path: PathBuf,

        /// Log what would be copied without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Print the enumerated file list as JSON and stop before copying.
        #[arg(long)]
        dump: bool,
    },
}

fn load_configuration(cli: &Cli) -> Config {
    let path = cli.config.clone().or_else(|| {
        config::default_config_path().filter(|p| p.is_file())
    });

    match path {
        Some(path) => match config::load_config(&path) {
            Ok(config) => {
                info!(config = %path.display(), "loaded configuration");
                config
            }
            Err(e) => {
                error!(config = %path.display(), "failed to load configuration: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    let config = load_configuration(&cli);

    match cli.command {
        Command::Import {
            volume_path,
            dry_run,
            dump,
        } => {
            let queue = ImportQueue::new(config, Arc::new(FindmntInspector));

            let (done_sender, done_receiver) = crossbeam_channel::bounded::<JobOutcome>(1);

            let request = ImportRequest {
                volume_path,
                dry_run,
                dump,
            };

            let submitted = queue.submit(
                request,
                Box::new(move |outcome| {
                    let _ = done_sender.send(outcome);
                }),
            );

            if let Err(e) = submitted {
                error!("import rejected: {}", e);
                std::process::exit(1);
            }

            let exit_code = match done_receiver.recv() {
                Ok(outcome) => {
                    info!(
                        files = outcome.files_total,
                        copied = outcome.stats.copied,
                        skipped = outcome.stats.skipped,
                        errors = outcome.stats.errors,
                        "import finished with status {}", outcome.status
                    );
                    i32::from(outcome.status != ImportStatus::Completed)
                }
                Err(_) => {
                    error!("import worker exited before completing the job");
                    1
                }
            };

            queue.wait();
            std::process::exit(exit_code);
        }
    }
}
