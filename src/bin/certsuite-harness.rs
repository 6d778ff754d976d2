use anyhow::{Context, Result};
use certsuite_harness::{report_file_name, telemetry, Dispatcher, HarnessConfig, TestSuite};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "certsuite-harness")]
#[command(about = "Run CNF certification test cases and collect their reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one test case with the certification tool
    Launch {
        /// Harness config file (YAML); environment overrides apply on top
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Test case identifier, used as the label filter
        #[arg(short, long)]
        test_case: String,

        /// Report name for logs and result folders (defaults to the test case)
        #[arg(short, long)]
        report_name: Option<String>,

        /// Directory the tool writes its reports into
        #[arg(short = 'o', long)]
        report_dir: PathBuf,

        /// Directory holding tnf_config.yml
        #[arg(short = 'd', long)]
        config_dir: PathBuf,

        /// Force the local binary strategy
        #[arg(long, default_value = "false")]
        use_binary: bool,

        /// Keep the tool's output in per-test debug logs
        #[arg(long, default_value = "false")]
        debug: bool,
    },

    /// Print the suite a test case belongs to
    Suite {
        /// Test case identifier
        test_case: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Launch {
            config,
            test_case,
            report_name,
            report_dir,
            config_dir,
            use_binary,
            debug,
        } => {
            let mut harness = match config {
                Some(path) => HarnessConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => HarnessConfig::default(),
            }
            .with_env_overrides()?;

            if use_binary {
                harness = harness.use_binary(true);
            }
            if debug {
                harness = harness.debug(true);
            }

            let report_name = report_name.unwrap_or_else(|| report_file_name(&test_case));
            let dispatcher = Dispatcher::new(&harness);
            info!(strategy = dispatcher.strategy(), test_case = %test_case, "Starting run");

            dispatcher
                .launch(&test_case, &report_name, &report_dir, &config_dir)
                .await?;

            println!("{test_case}: passed");
        }
        Commands::Suite { test_case } => {
            let suite = TestSuite::classify(&test_case)?;
            println!("{suite}");
        }
    }

    Ok(())
}
