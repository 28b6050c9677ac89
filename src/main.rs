//! mdposter CLI - format articles and generate share posters.

use clap::{Parser, Subcommand};
use mdposter::api::{create_router_with_state, AppState};
use mdposter::config::{Config, LogVerbosity};
use mdposter::cover::CoverPipeline;
use mdposter::render::HtmlRenderer;
use mdposter::settings::AiSettings;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mdposter")]
#[command(about = "Format articles into Markdown and generate share posters")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Startup banner verbosity
        #[arg(short, long, value_enum)]
        log_level: Option<LogLevel>,
    },

    /// Rewrite a Markdown article and render a cover image for it
    Cover {
        /// Markdown article to rewrite
        #[arg(default_value = "文章.md")]
        article: PathBuf,

        /// Designer prompt passed to the model as memory
        #[arg(short, long, default_value = "提示词.md")]
        prompt: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
    },

    /// Show current configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,

        /// Write a default config file if none exists
        #[arg(long, conflicts_with = "path")]
        init: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum LogLevel {
    Minimal,
    Compact,
    Verbose,
}

impl From<LogLevel> for LogVerbosity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Minimal => LogVerbosity::Minimal,
            LogLevel::Compact => LogVerbosity::Compact,
            LogLevel::Verbose => LogVerbosity::Verbose,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, host, log_level }) => {
            let config = load_config(cli.config)?;
            run_server(config, port, host, log_level.map(Into::into)).await?;
        }
        Some(Commands::Cover { article, prompt, out }) => {
            let config = load_config(cli.config)?;
            run_cover(config, article, prompt, out).await?;
        }
        Some(Commands::Config { path: true, .. }) => {
            println!("{}", cli.config.unwrap_or_else(Config::default_path).display());
        }
        Some(Commands::Config { init: true, .. }) => {
            init_config(cli.config.unwrap_or_else(Config::default_path))?;
        }
        Some(Commands::Config { .. }) => {
            show_config(cli.config)?;
        }
        None => {
            let config = load_config(cli.config)?;
            run_server(config, None, None, None).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config.with_env_overrides())
}

async fn run_server(
    config: Config,
    port_override: Option<u16>,
    host_override: Option<String>,
    verbosity: Option<LogVerbosity>,
) -> anyhow::Result<()> {
    init_tracing();

    let port = port_override.unwrap_or(config.server.port);
    let host = host_override.unwrap_or_else(|| config.server.host.clone());
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let verbosity = verbosity.unwrap_or_else(|| config.app.log_verbosity.clone());

    let state = AppState::from_config(&config);
    let settings = state.settings.snapshot();
    let app = create_router_with_state(state);

    match verbosity {
        LogVerbosity::Minimal => {
            println!("mdposter:{}", port);
        }
        LogVerbosity::Compact => {
            println!("→ mdposter starting on http://{}", addr);
            println!("→ AI service: {} [{}]", settings.service_url, settings.model);
        }
        LogVerbosity::Verbose => {
            println!("────────────────────────────────────────");
            println!("mdposter v{}", env!("CARGO_PKG_VERSION"));
            println!("────────────────────────────────────────");
            println!("Web UI:     http://{}", addr);
            println!("Settings:   http://{}/config", addr);
            println!("Health:     http://{}/health", addr);
            println!("Posters:    {}", config.server.posters_dir.display());
            println!("Prompt:     {}", config.server.prompt_file.display());
            println!("AI service: {}", settings.service_url);
            println!("Model:      {}", settings.model);
            println!("API key:    {}", if settings.api_key.is_empty() { "not set" } else { "set" });
            println!("────────────────────────────────────────");
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\nServer stopped.");
    Ok(())
}

async fn run_cover(config: Config, article: PathBuf, prompt: PathBuf, out: PathBuf) -> anyhow::Result<()> {
    init_tracing();

    let pipeline = CoverPipeline::new(
        AiSettings::from(&config.ai),
        HtmlRenderer::from(&config.render),
        out,
    );

    let output = pipeline.run(&article, &prompt).await?;

    println!("Title:   {}", output.title);
    println!("Article: {}", output.article_path.display());
    println!("Cover:   {}", output.png_path.display());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

fn init_config(path: PathBuf) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("config file already exists: {}", path.display());
    }
    Config::default().save_to(path.clone())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn show_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = load_config(path)?;
    if !config.ai.api_key.is_empty() {
        config.ai.api_key = "*".repeat(20);
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
