//! `dln` probe: runs the SDK against the live API from a terminal
//!
//! This binary:
//! - Loads environment configuration (`.env` supported)
//! - Describes the device with command-line flags
//! - Initializes the SDK and waits for startup to finish
//! - Runs one command and prints its result as JSON
//!
//! # Environment Variables
//!
//! See [`deeplinknow::config`]; `DLN_API_KEY` is required.

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use deeplinknow::platform::{DeviceProfile, StaticReferrer};
use deeplinknow::{DeepLinkNow, Platform, PlatformServices, SdkConfig, StaticPlatform};

#[derive(Parser)]
#[command(name = "dln", about = "Probe the DeepLinkNow attribution API")]
struct Cli {
    /// Platform to report in the fingerprint
    #[arg(long, value_enum, default_value_t = CliPlatform::Android)]
    platform: CliPlatform,

    #[arg(long, default_value = "14")]
    os_version: String,

    #[arg(long, default_value = "Pixel 8")]
    model: String,

    #[arg(long, default_value = "en")]
    language: String,

    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Raw install referrer to feed the referrer cache
    #[arg(long)]
    referrer: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and parse a deep link against the app's domains
    Parse { url: String },
    /// Request deferred deep-link matches for this device
    Match,
    /// Show the processed install referrer
    Referrer,
    /// Check clipboard text as if it had just been copied
    Clipboard { text: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliPlatform {
    Ios,
    Android,
}

impl From<CliPlatform> for Platform {
    fn from(platform: CliPlatform) -> Self {
        match platform {
            CliPlatform::Ios => Platform::Ios,
            CliPlatform::Android => Platform::Android,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deeplinknow=debug")),
        )
        .init();

    let cli = Cli::parse();

    let config = match SdkConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(2);
        }
    };

    let platform = Arc::new(StaticPlatform::new(DeviceProfile {
        platform: cli.platform.into(),
        os_version: cli.os_version,
        device_model: cli.model,
        language: cli.language,
        timezone: cli.timezone,
        ..DeviceProfile::default()
    }));
    if let Some(referrer) = cli.referrer {
        platform.set_install_referrer(StaticReferrer::Available(referrer));
    }

    let dln = DeepLinkNow::new();
    let service = match dln.init(config, PlatformServices::from_shared(platform.clone())) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("❌ Failed to initialize DLN: {err}");
            std::process::exit(1);
        }
    };
    service.wait_until_ready().await;

    match cli.command {
        Command::Parse { url } => print_json(&service.parse_deep_link(&url)),
        Command::Match => print_json(&service.find_deferred_user().await),
        Command::Referrer => print_json(&service.referrer_data()),
        Command::Clipboard { text } => {
            platform.set_clipboard(Some(&text));
            print_json(&serde_json::json!({
                "has_deep_link_token": service.has_deep_link_token().await,
                "link": service.check_clipboard().await,
            }));
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("❌ Failed to render result: {err}"),
    }
}
