use clap::Parser;
use dotenvy::dotenv;
use expense_buddy::{
    cli::{self, Cli},
    config,
    errors::Result,
    http::{ApiClient, ReqwestTransport},
    session::{FileTokenStore, SessionContext},
    views::Level,
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    let args = Cli::parse();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!("Using expense service at {}", app_config.api_base_url);

    // 4. Wire the session store and the HTTP client
    let session = SessionContext::new(FileTokenStore::new(&app_config.session_file));
    let transport = ReqwestTransport::new(&app_config.api_base_url, app_config.request_timeout)?;
    let api = ApiClient::new(transport, session);

    // 5. Run the command
    let report = cli::run(args.command, &api, chrono::Utc::now()).await?;

    print!("{}", report.output);
    for notice in &report.notices {
        match notice.level {
            Level::Success => println!("{}", notice.text),
            Level::Error => eprintln!("error: {}", notice.text),
        }
    }
    if report.needs_login {
        eprintln!("Please log in: expense-buddy login --email <EMAIL> (password from EXPENSE_BUDDY_PASSWORD)");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
