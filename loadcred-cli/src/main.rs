use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loadcred::{
    RedirectWalkAcquirer, SessionAcquirer, Settings, SinkMode, TokenGrantAcquirer,
};

#[derive(Parser, Debug)]
#[command(
    name = "loadcred",
    about = "Create synthetic users in the identity provider and harvest their login sessions"
)]
struct Cli {
    /// Number of users to create
    num_users: u32,

    /// How to turn a created account into session credentials
    #[arg(long, value_enum, default_value_t = Strategy::RedirectWalk)]
    strategy: Strategy,

    /// Sink file path (overrides LOADCRED_OUTPUT)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Append to the sink instead of truncating it
    #[arg(long)]
    append: bool,

    /// Record partial cookie bundles instead of rejecting them
    #[arg(long)]
    best_effort: bool,

    /// Seconds to wait between account creation and login
    #[arg(long)]
    delay_secs: Option<u64>,

    /// Environment file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Scripted OAuth redirect walk over plain HTTP
    RedirectWalk,
    /// Direct resource-owner-password grant at the token endpoint
    TokenGrant,
    /// Headless-browser login
    #[cfg(feature = "browser-login")]
    Browser,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("loading environment from {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadcred=info,loadcred_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = Settings::from_env().context("loading configuration")?;
    if let Some(output) = cli.output {
        settings.sink_path = output;
    }
    if cli.append {
        settings.sink_mode = SinkMode::Append;
    }
    if cli.best_effort {
        settings.cookie_policy = loadcred::CookiePolicy::BestEffort;
    }
    if let Some(secs) = cli.delay_secs {
        settings.propagation_delay = Duration::from_secs(secs);
    }

    let acquirer: Box<dyn SessionAcquirer> = match cli.strategy {
        Strategy::RedirectWalk => Box::new(RedirectWalkAcquirer::new(&settings)?),
        Strategy::TokenGrant => {
            if settings.client_id.is_empty() {
                anyhow::bail!(
                    "the token-grant strategy needs LOADCRED_CLIENT_ID (and usually \
                     LOADCRED_CLIENT_SECRET) to be set"
                );
            }
            Box::new(TokenGrantAcquirer::new(&settings)?)
        }
        #[cfg(feature = "browser-login")]
        Strategy::Browser => Box::new(loadcred::BrowserLoginAcquirer::new(&settings)?),
    };

    tracing::info!(
        num_users = cli.num_users,
        strategy = ?cli.strategy,
        sink = %settings.sink_path.display(),
        "starting run"
    );

    let summary = loadcred::run(&settings, acquirer.as_ref(), cli.num_users).await?;

    println!(
        "{} of {} users recorded to {}",
        summary.recorded(),
        summary.requested,
        settings.sink_path.display()
    );
    Ok(())
}
