use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use support_bundle::config::{default_servers_path, parse_duration_or_default};
use support_bundle::{
    DefaultOptionsProvider, HttpConnector, OptionsProvider, ProfileResolver,
    PromptOptionsProvider, SupportBundleWorkflow, WorkflowConfig, WorkflowResult,
    cancel_on_signal,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Create a support bundle and upload it to a support case
#[derive(Parser, Debug)]
#[command(name = "support-bundle", version)]
struct Cli {
    /// Server to create the bundle on (defaults to the configured default server)
    #[arg(long, env = "SUPPORT_BUNDLE_SERVER_ID")]
    server_id: Option<String>,

    /// Server to upload the bundle to (defaults to the public support logs server)
    #[arg(long, env = "SUPPORT_BUNDLE_TARGET_SERVER_ID")]
    target_server_id: Option<String>,

    /// How long to wait for the bundle, e.g. "10m" or "90s"
    #[arg(long, default_value = "10m")]
    download_timeout: String,

    /// Delay between status checks, e.g. "5s"
    #[arg(long, default_value = "5s")]
    retry_interval: String,

    /// Ask what to include in the bundle
    #[arg(long)]
    prompt_options: bool,

    /// Delete the downloaded archive after uploading it
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    cleanup: bool,

    /// Repository the bundle is uploaded to
    #[arg(long, default_value = "logs")]
    target_repo: String,

    /// Server profile file (default: $HOME/.support-bundle/servers.json)
    #[arg(long, env = "SUPPORT_BUNDLE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Support case number
    #[arg(value_name = "CASE")]
    case: Vec<String>,
}

impl Cli {
    fn workflow_config(&self) -> WorkflowConfig {
        let defaults = WorkflowConfig::default();
        WorkflowConfig {
            download_timeout: parse_duration_or_default(
                &self.download_timeout,
                defaults.download_timeout,
            ),
            retry_interval: parse_duration_or_default(
                &self.retry_interval,
                defaults.retry_interval,
            ),
            cleanup: self.cleanup,
            target_repo: self.target_repo.clone(),
            ..defaults
        }
    }
}

/// Uses `RUST_LOG` if set, otherwise `log_level`. Logs go to stderr.
fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_result(result: &WorkflowResult) {
    if let Some(id) = &result.bundle_id {
        println!("Support bundle id: {id}");
    }
    if let Some(path) = &result.local_file {
        println!("Local file: {}", path.display());
    }
    if let Some(destination) = &result.upload_destination {
        println!("Uploaded to: {destination}");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = cli.workflow_config();
    tracing::debug!(?config, "Workflow configuration");

    let resolver = ProfileResolver::new(
        cli.config.clone().unwrap_or_else(default_servers_path),
        cli.server_id.clone(),
        cli.target_server_id.clone(),
    );
    let options: Arc<dyn OptionsProvider> = if cli.prompt_options {
        Arc::new(PromptOptionsProvider::terminal())
    } else {
        Arc::new(DefaultOptionsProvider::default())
    };
    let workflow = SupportBundleWorkflow::new(
        config.clone(),
        Arc::new(resolver),
        Arc::new(HttpConnector::new(config.upload_retry.clone())),
        options,
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let outcome = workflow.run(&cancel, &cli.case).await;
    cancel.cancel();

    match outcome {
        Ok(result) => print_result(&result),
        Err(failure) => {
            eprintln!("error: {failure}");
            print_result(&failure.partial);
            process::exit(failure.error.exit_code());
        }
    }
}
