use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tickerdash::bootstrap::{load_startup_config, resolve_config_path};
use tickerdash::headless::{HeadlessArgs, HeadlessMode};
use tickerdash::{logging, TuiOpts};

#[derive(Parser, Debug)]
#[command(name = "tickerdash")]
#[command(about = "Live stock price dashboard (TUI) with a headless runner.", version)]
struct Cli {
    /// Run without TUI and print one JSON document.
    #[arg(long)]
    headless: bool,

    /// Headless mode: resolve | quote | watch
    #[arg(long, value_enum, default_value_t = Mode::Watch)]
    mode: Mode,

    /// Config file path (TOML). If omitted, uses env TICKERDASH_CONFIG, then defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma separated tickers or company names (headless only).
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Refresh rounds after adding the tickers (watch mode only).
    #[arg(long, default_value_t = 1)]
    rounds: usize,

    /// Write a CSV snapshot when the watch finishes (watch mode only).
    #[arg(long)]
    export: bool,

    /// Keep the price cache in memory only.
    #[arg(long)]
    no_persist: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Resolve,
    Quote,
    Watch,
}

fn main() {
    let cli = Cli::parse();

    let log_store = logging::LogStore::shared(5000);
    if let Err(err) = init_tracing(log_store.clone(), cli.headless) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = init_metrics() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    let config_path = resolve_config_path(cli.config);
    let config = match load_startup_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if cli.headless {
        let mode = match cli.mode {
            Mode::Resolve => HeadlessMode::Resolve,
            Mode::Quote => HeadlessMode::Quote,
            Mode::Watch => HeadlessMode::Watch,
        };
        let result = tickerdash::headless::run_headless(
            &config,
            HeadlessArgs {
                mode,
                symbols: cli.symbols,
                rounds: cli.rounds,
                export: cli.export,
                no_persist: cli.no_persist,
            },
        );

        match result {
            Ok(json) => {
                println!(
                    "{}",
                    serde_json::to_string(&json)
                        .unwrap_or_else(|_| "{\"status\":\"error\",\"error\":\"json\"}".to_string())
                );
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }

    let opts = TuiOpts {
        config,
        log_store,
        no_persist: cli.no_persist,
    };

    if let Err(err) = tickerdash::run(opts) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(
    log_store: logging::SharedLogStore,
    headless: bool,
) -> Result<(), String> {
    let filter = std::env::var("TICKERDASH_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    if headless {
        // stdout carries the JSON result.
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(logging::LogMakeWriter::new(log_store))
            .init();
    }

    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = std::env::var("TICKERDASH_METRICS_ADDR").ok() else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid TICKERDASH_METRICS_ADDR (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics() -> Result<Option<SocketAddr>, String> {
    Ok(None)
}
