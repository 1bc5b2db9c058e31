use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use textmark::{
    Config, create_app,
    processor::{ImageProcessor, WatermarkRequest},
    startup_checks,
    watermark::Position,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Optional TOML file overriding the compiled-in configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", global = true)]
    port: Option<u16>,

    #[arg(long, global = true)]
    host: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Watermark a single image and write the PNG to a file
    Render {
        /// Source image URL
        image_url: String,
        /// Watermark text
        text: String,
        /// Output PNG path
        #[arg(short, long, default_value = "watermarked.png")]
        output: PathBuf,
        /// bottom_right, bottom_center or top_center
        #[arg(long, default_value = "bottom_right")]
        position: String,
        #[arg(long)]
        font_size: Option<u32>,
        #[arg(long)]
        text_color: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }

    match cli.command {
        Some(Commands::Render {
            image_url,
            text,
            output,
            position,
            font_size,
            text_color,
        }) => {
            let request = WatermarkRequest {
                image_url,
                text,
                position: Position::from_name(&position),
                font_size,
                text_color,
            };
            render_to_file(config, request, output).await
        }
        Some(Commands::Serve { quit_after }) => run_server(config, quit_after).await,
        None => {
            // Default to serve command if no subcommand specified
            run_server(config, None).await
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let config_content = std::fs::read_to_string(path)?;
            let config = toml_edit::de::from_str::<Config>(&config_content)?;
            info!("Configuration loaded from: {:?}", path);
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Verify startup conditions, aborting only on critical failures.
async fn run_startup_checks(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match startup_checks::perform_startup_checks(config).await {
        Ok(()) => Ok(()),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }

            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                Err("Critical startup check failed".into())
            } else {
                tracing::warn!("Non-critical startup checks failed, continuing");
                Ok(())
            }
        }
    }
}

async fn render_to_file(
    config: Config,
    request: WatermarkRequest,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    run_startup_checks(&config).await?;

    let processor = ImageProcessor::new(&config)?;
    let png_data = processor.process_image_url(&request).await?;
    tokio::fs::write(&output, &png_data).await?;

    info!("Wrote {} bytes to {:?}", png_data.len(), output);
    Ok(())
}

async fn run_server(config: Config, quit_after: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting watermark server");
    info!("Watermark font: {:?}", config.watermark.font_path);
    info!("Temp directory: {:?}", config.fetch.temp_directory);

    run_startup_checks(&config).await?;

    let addr = SocketAddr::from((config.server.host.parse::<std::net::IpAddr>()?, config.server.port));
    let app = create_app(config).await?;

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Set up graceful shutdown
    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
