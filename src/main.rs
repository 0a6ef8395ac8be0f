use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use portal_client::controllers::auth::AuthController;
use portal_client::controllers::stats::StatsController;
use portal_client::controllers::upload::UploadController;
use portal_client::controllers::weather::{WeatherController, WeatherPanel};
use portal_client::controllers::MemoryClipboard;
use portal_client::handlers::create_app;
use portal_client::models::config::{AppConfig, ServerConfig, DEFAULT_CONFIG_FILE};
use portal_client::models::files::UploadFile;
use portal_client::services::api::ApiClient;
use portal_client::services::cookies::FileCookieStore;
use portal_client::services::scheduler::SystemClock;
use portal_client::services::session::{HistoryNavigator, SessionManager};
use portal_client::utils::logging::init_logging;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Configuration file; missing files fall back to defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the front-end pages
    Serve,
    Login {
        login: String,
        password: String,
    },
    Register {
        login: String,
        password: String,
        confirmation: String,
    },
    Logout,
    /// Upload a file and print its download link
    Upload { path: PathBuf },
    /// List uploaded files with download counters
    Stats,
    /// Show the hourly forecast for a city
    Weather {
        city: String,
        /// Keep running and refresh at the top of every hour
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)?;
    let _log_guard = init_logging(&config.logging)?;
    info!("Configuration loaded from {}", cli.config.display());

    match cli.command {
        Command::Serve => serve(&config.server).await,
        command => run_client(command, &config).await,
    }
}

async fn run_client(command: Command, config: &AppConfig) -> Result<()> {
    let backend = Arc::new(ApiClient::new(&config.api)?);
    let cookies = Arc::new(FileCookieStore::open(&config.session.cookie_file));
    let navigator = Arc::new(HistoryNavigator::new());
    let session = SessionManager::new(cookies, navigator, &config.session);
    let clipboard = Arc::new(MemoryClipboard::new());

    match command {
        Command::Serve => return serve(&config.server).await,
        Command::Login { login, password } => {
            let mut controller = AuthController::new(backend, session);
            let signed_in = controller.login(&login, &password).await?;
            println!("Logged in as {}", signed_in.username);
        }
        Command::Register {
            login,
            password,
            confirmation,
        } => {
            let mut controller = AuthController::new(backend, session);
            controller.register(&login, &password, &confirmation).await?;
            if let Some(notice) = controller.notice() {
                println!("{}", notice.text);
            }
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Upload { path } => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut controller = UploadController::new(backend, session, clipboard);
            controller.open()?;
            controller.select_file(file);
            let result = controller.submit().await?;
            println!("File uploaded: {}", result.uuid);
            println!("Download link: {}", result.download_link);
        }
        Command::Stats => {
            let mut controller = StatsController::new(backend, session, clipboard);
            controller.load().await?;
            print_stats(&controller);
        }
        Command::Weather { city, watch } => {
            let mut controller = WeatherController::new(backend, Arc::new(SystemClock));
            controller.submit(&city).await?;
            if let Some(panel) = controller.panel() {
                print_panel(panel);
            }

            while watch {
                match controller.next_refresh().await {
                    Some(Ok(())) => {
                        if let Some(panel) = controller.panel() {
                            print_panel(panel);
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Stopping refresh: {}", e);
                        return Err(e.into());
                    }
                    None => break,
                }
            }
        }
    }

    Ok(())
}

async fn serve(config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let app = create_app(config);

    info!(
        "Serving {} on http://{}",
        config.document_root.display(),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_stats(controller: &StatsController) {
    let Some(view) = controller.view() else {
        return;
    };

    println!("Total files: {}", view.total_files);
    if controller.empty_state_visible() {
        println!("No files uploaded yet");
        return;
    }

    println!(
        "{:<32} {:<18} {:>9} {:<18} {}",
        "File", "Uploaded", "Downloads", "Last download", "Link"
    );
    for row in &view.rows {
        println!(
            "{:<32} {:<18} {:>9} {:<18} {}",
            row.file_name, row.created_at, row.download_count, row.last_download, row.download_url
        );
    }
}

fn print_panel(panel: &WeatherPanel) {
    println!("{} ({})", panel.city, panel.coordinates);
    println!("Updated: {}", panel.updated_at.format("%d.%m.%Y %H:%M"));
    if let Some(window) = &panel.valid_window {
        println!("Valid: {}", window);
    }
    if let Some(summary) = &panel.summary {
        println!(
            "Min {:.1}°C  Avg {:.1}°C  Max {:.1}°C",
            summary.min, summary.avg, summary.max
        );
    }
    println!("{}:", panel.chart.label);
    for (label, value) in panel.chart.labels.iter().zip(&panel.chart.values) {
        println!("  {:<12} {:>6.1}", label, value);
    }
    println!("Next update: {}", panel.next_update.format("%H:%M"));
}
