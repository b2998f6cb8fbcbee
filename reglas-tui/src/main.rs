//! Reglas rule-management TUI.
//!
//! A terminal client for the Reglas API: log in, browse and filter rules,
//! and (as an administrator) create, edit and delete them.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripting:
//!
//! ```bash
//! cargo run -p reglas-tui -- --headless --api-url http://127.0.0.1:8000
//! ```

mod app;
mod events;
mod headless;
mod ui;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use reglas_core::{ClientConfig, ReglasApi};
use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

const DEFAULT_LOG_FILE: &str = "reglas.log";

/// Command line options
#[derive(Debug, Default)]
struct Args {
    api_url: Option<String>,
    headless: bool,
    verbose: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Args {
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--api-url" => {
                if let Some(url) = args.get(i + 1) {
                    parsed.api_url = Some(url.clone());
                    i += 1;
                }
            }
            "--headless" => parsed.headless = true,
            "-v" | "--verbose" => parsed.verbose = true,
            "-h" | "--help" => parsed.help = true,
            _ => {}
        }
        i += 1;
    }

    parsed
}

/// Log to a file so the alternate screen stays clean.
fn init_logging(verbose: bool) -> io::Result<()> {
    let path = std::env::var("REGLAS_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    // `reglas` covers every workspace crate by target prefix
    let filter = if verbose {
        EnvFilter::new("reglas=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reglas=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args);

    if args.help {
        print_help();
        return Ok(());
    }

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Warning: could not open log file: {e}");
    }

    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(url) = args.api_url {
        config = config.with_api_url(url);
    }

    let api = match config.build_client() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    info!(api_url = api.base_url(), "starting");

    if args.headless {
        return headless::run_headless(&config, &api).await.map_err(|e| e.into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, App::new(&config), &api).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    api: &ReglasApi,
) -> io::Result<()> {
    let mut pending = None;

    loop {
        // Redirects fire on their own once the delay elapses
        if let Some(action) = app.tick(Instant::now()) {
            pending = Some(action);
        }

        // Render
        terminal.draw(|f| render(f, &app))?;

        // Process any pending backend work, redrawing first so the
        // disabled button and busy indicator are visible
        if let Some(action) = pending.take() {
            app.busy = true;
            terminal.draw(|f| render(f, &app))?;
            app.perform(action, api).await;
            continue;
        }

        // Poll for events with timeout so redirects fire on time
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            app.clear_status();

            match handle_event(&mut app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::Dispatch(action) => pending = Some(action),
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_help() {
    println!("Reglas - rule management client");
    println!();
    println!("USAGE:");
    println!("  reglas [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help          Show this help message");
    println!("  --api-url <URL>     Backend base URL (default: REGLAS_API_URL or http://127.0.0.1:8000)");
    println!("  --headless          Run in headless mode (line commands on stdin)");
    println!("  -v, --verbose       Debug logging");
    println!();
    println!("ENVIRONMENT:");
    println!("  REGLAS_API_URL            Backend base URL");
    println!("  REGLAS_REGISTER_PATH      Registration endpoint (default: /register)");
    println!("  REGLAS_REDIRECT_DELAY_MS  Delay before the post-login redirect (default: 800)");
    println!("  REGLAS_RANGE_OPERATOR     How range rules are sent: equals (default) or preserve");
    println!("  REGLAS_LOG_FILE           Log file (default: reglas.log)");
    println!("  RUST_LOG                  Log filter");
    println!();
    println!("EXAMPLES:");
    println!("  reglas                                   # Interactive TUI mode");
    println!("  reglas --api-url http://localhost:8000");
    println!("  echo '#list' | reglas --headless");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("reglas")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(&args(&["--api-url", "http://x:1", "--headless", "-v"]));
        assert_eq!(parsed.api_url.as_deref(), Some("http://x:1"));
        assert!(parsed.headless);
        assert!(parsed.verbose);
        assert!(!parsed.help);
    }

    #[test]
    fn test_missing_url_value_is_ignored() {
        let parsed = parse_args(&args(&["--api-url"]));
        assert!(parsed.api_url.is_none());
    }
}
