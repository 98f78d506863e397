#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
#![allow(clippy::print_stdout)]

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use limtel_api::{
    api::{hash_password, LimtelClient, Params},
    config::{Config, DEFAULT_CONFIG_FILE},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Command-line client for the Limtel API", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Log in before running the command
    #[arg(long)]
    login: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Invoke any remote action
    Call {
        /// Action name sent as `akcja`
        action: String,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Show the account balance
    Balance,
    /// Show call history
    History(ParamArgs),
    /// Send a text message
    SendSms(ParamArgs),
    /// Print the MD5 digest the API expects in `api.password_hash`
    HashPassword {
        /// Plaintext password
        password: String,
    },
}

#[derive(Args, Debug)]
struct ParamArgs {
    /// Request parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
}

impl ParamArgs {
    fn into_params(self) -> Params {
        self.params.into_iter().collect()
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::HashPassword { password } = &cli.command {
        println!("{}", hash_password(password));
        return Ok(());
    }

    // Load and validate configuration first (fail-fast)
    let config = Config::load_from(&cli.config).map_err(|e| anyhow!("{e}"))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid logging.level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(endpoint = %config.api.endpoint, "limtel client starting");

    let mut client = LimtelClient::from_config(&config.api);

    if cli.login && !client.login().await {
        return Err(anyhow!("login failed"));
    }

    let response = match cli.command {
        Command::Call { action, params } => client.call(&action, params.into_params()).await,
        Command::Balance => client.balance().await,
        Command::History(params) => client.history(params.into_params()).await,
        Command::SendSms(params) => client.send_sms(params.into_params()).await,
        Command::HashPassword { .. } => return Ok(()),
    }
    .map_err(|e| anyhow!("{e}: {}", e.cause()))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
