use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use devtools_browser::{PageDriver, StaticPage};
use devtools_core::config::Config;
use devtools_core::ServePort;
use devtools_gateway::server::shutdown_signal;
use devtools_gateway::{start_gateway, GatewayState};
use devtools_tools::{register_builtin_tools, ArtifactStore, ToolContext, ToolRegistry};

#[derive(Parser)]
#[command(
    name = "devtools-claw",
    about = "Browser page tools for automation agents: snapshots, waits, and HTML extraction",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tools and saved artifacts over HTTP
    Serve {
        #[command(flatten)]
        page: PageArgs,

        /// Port to listen on (default: config, or an ephemeral port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single tool and print its output
    Call {
        /// Tool name
        tool: String,

        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Print the tool catalogue
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct PageArgs {
    /// HTML file to load as the selected page
    #[arg(long)]
    page: Option<PathBuf>,

    /// Open this URL in Chrome instead of a static page
    #[cfg(feature = "cdp")]
    #[arg(long, conflicts_with = "page")]
    url: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a specific config value by dotted path
    Get { key: String },
    /// Check the configuration for problems
    Validate,
}

fn init_logging(config: &Config, verbose: bool) {
    let logging = config.logging.clone().unwrap_or_default();

    let mut directives = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone().unwrap_or_else(|| "info".to_string())
    };
    for filter in &logging.filters {
        directives.push(',');
        directives.push_str(filter);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match (logging.format.as_str(), logging.output.as_str()) {
        ("json", "stdout") => builder.json().with_writer(std::io::stdout).init(),
        ("json", _) => builder.json().with_writer(std::io::stderr).init(),
        (_, "stdout") => builder.with_writer(std::io::stdout).init(),
        _ => builder.with_writer(std::io::stderr).init(),
    }
}

async fn open_page(args: &PageArgs, config: &Config) -> anyhow::Result<Arc<dyn PageDriver>> {
    #[cfg(feature = "cdp")]
    if let Some(url) = &args.url {
        let browser = config.browser.clone().unwrap_or_default();
        return Ok(Arc::new(devtools_browser::CdpPage::launch(&browser, url).await?));
    }
    #[cfg(not(feature = "cdp"))]
    let _ = config;

    match &args.page {
        Some(path) => Ok(Arc::new(StaticPage::from_file(path)?)),
        None => Ok(Arc::new(StaticPage::new("<html><head></head><body></body></html>"))),
    }
}

fn builtin_registry() -> anyhow::Result<ToolRegistry> {
    let mut tools = ToolRegistry::new();
    register_builtin_tools(&mut tools)?;
    Ok(tools)
}

async fn gateway_state(
    page: &PageArgs,
    config: Arc<Config>,
    serve_port: ServePort,
) -> anyhow::Result<Arc<GatewayState>> {
    let tools = Arc::new(builtin_registry()?);
    let context = ToolContext {
        page: open_page(page, &config).await?,
        artifacts: ArtifactStore::new(config.artifact_dir(), serve_port),
        config,
    };
    Ok(Arc::new(GatewayState::new(tools, Arc::new(context))))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::config_path);
    let config = Config::load(&config_path)?;
    init_logging(&config, cli.verbose);

    let config = Arc::new(config);

    match cli.command {
        Commands::Serve { page, port } => {
            let serve_port = ServePort::global().clone();
            let state = gateway_state(&page, config.clone(), serve_port.clone()).await?;
            let port = port.unwrap_or_else(|| config.gateway_port());
            tracing::info!(artifacts = %config.artifact_dir().display(), "Starting gateway");
            start_gateway(state, &config.gateway_bind(), port, serve_port, shutdown_signal()).await?;
        }
        Commands::Call { tool, params, page } => {
            let params: serde_json::Value = serde_json::from_str(&params)?;
            let serve_port = ServePort::global().clone();
            let state = gateway_state(&page, config.clone(), serve_port.clone()).await?;

            // Serve artifacts on an ephemeral port so saved links resolve while the call runs.
            let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
            let server = tokio::spawn({
                let state = state.clone();
                let bind = config.gateway_bind();
                let serve_port = serve_port.clone();
                async move {
                    start_gateway(state, &bind, 0, serve_port, async {
                        let _ = stopped.await;
                    })
                    .await
                }
            });
            while serve_port.get().is_none() && !server.is_finished() {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }

            let result = state.tools.dispatch(&tool, &params, &state.context).await;
            let _ = stop.send(());
            server.await??;

            let output = result?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Tools => {
            let tools = builtin_registry()?;
            println!("{}", serde_json::to_string_pretty(&tools.to_llm_tools())?);
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(config.as_ref())?);
            }
            ConfigAction::Get { key } => match config.get_path(&key) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => anyhow::bail!("No config value at '{key}'"),
            },
            ConfigAction::Validate => {
                let (warnings, errors) = config.validate();
                for warning in &warnings {
                    println!("warning: {warning}");
                }
                for error in &errors {
                    println!("error: {error}");
                }
                if !errors.is_empty() {
                    anyhow::bail!("{} configuration error(s)", errors.len());
                }
                println!("Config OK: {}", config_path.display());
            }
        },
    }

    Ok(())
}
