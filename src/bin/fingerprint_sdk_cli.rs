//! fingerprint-sdk-cli — issue API requests through the SDK's rate limiter and retry loop
//!
//! Usage:
//!   fingerprint-sdk-cli get <path> [--config <file>]
//!   fingerprint-sdk-cli post <path> <json> [--config <file>]
//!   fingerprint-sdk-cli delete <path> [--config <file>]
//!   fingerprint-sdk-cli config [--config <file>]

use anyhow::{bail, Context};
use fingerprint_sdk::{SdkClient, SdkClientBuilder, SdkConfig};
use reqwest::Method;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "get" => cmd_request(Method::GET, &args[2..]).await,
        "post" => cmd_request(Method::POST, &args[2..]).await,
        "delete" => cmd_request(Method::DELETE, &args[2..]).await,
        "config" => cmd_config(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("fingerprint-sdk-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"fingerprint-sdk-cli — fingerprint API command line

USAGE:
    fingerprint-sdk-cli <COMMAND> [OPTIONS]

COMMANDS:
    get <path>                  GET a path relative to the base URL
    post <path> <json>          POST a JSON body
    delete <path>               DELETE a path
    config                      Print the resolved configuration (API key redacted)
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --config <file>             YAML config file (otherwise FP_SDK_* env vars)

ENVIRONMENT:
    FP_SDK_BASE_URL, FP_SDK_API_KEY, FP_SDK_MAX_REQUESTS_PER_MINUTE,
    FP_SDK_MAX_REQUESTS_PER_HOUR, FP_SDK_MAX_RETRIES, FP_SDK_BASE_RETRY_DELAY_MS,
    FP_SDK_DEBUG, RUST_LOG"#
    );
}

/// Split `--config <file>` out of the argument list.
fn split_config_flag(args: &[String]) -> anyhow::Result<(Option<String>, Vec<String>)> {
    let mut config = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            match iter.next() {
                Some(path) => config = Some(path.clone()),
                None => bail!("--config requires a file path"),
            }
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((config, rest))
}

fn load_config(path: Option<&str>) -> anyhow::Result<SdkConfig> {
    let cfg = match path {
        Some(p) => SdkConfig::load_yaml_file(p).with_context(|| format!("loading config from {p}"))?,
        None => SdkConfig::from_env()?,
    };
    Ok(cfg)
}

fn init_tracing(debug: bool) {
    let default = if debug { "fingerprint_sdk=debug" } else { "fingerprint_sdk=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn cmd_config(args: &[String]) -> anyhow::Result<()> {
    let (path, _) = split_config_flag(args)?;
    let cfg = load_config(path.as_deref())?;
    print!("{}", serde_yaml::to_string(&cfg.redacted())?);
    Ok(())
}

async fn cmd_request(method: Method, args: &[String]) -> anyhow::Result<()> {
    let (path, rest) = split_config_flag(args)?;
    let cfg = load_config(path.as_deref())?;
    init_tracing(cfg.debug);

    let Some(target) = rest.first() else {
        bail!("missing <path>");
    };
    let body = if method == Method::POST {
        let raw = rest.get(1).context("missing <json> body")?;
        Some(serde_json::from_str::<serde_json::Value>(raw).context("parsing <json> body")?)
    } else {
        None
    };

    let client: SdkClient = SdkClientBuilder::from_config(cfg).build()?;
    let value = client
        .request(method, target, None, body.as_ref())
        .await?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    let remaining = client.remaining_requests();
    eprintln!(
        "quota remaining: {} this minute, {} this hour",
        remaining.minute, remaining.hour
    );
    Ok(())
}
