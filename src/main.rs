//! # Codeview - Code Viewers for Marked Page Elements
//!
//! Loads a page, turns every `.code` element into a read-only, highlighted
//! viewer of the file it references, and reports what each viewer ended up
//! showing.
//!
//! ## Quick Start
//!
//! ```bash
//! # Summarize the viewers of a page
//! cargo run -- site/index.html
//!
//! # Show their contents, jumping to each element's data-line
//! cargo run -- --show --line-jump site/index.html
//!
//! # Machine-readable summaries
//! cargo run -- --format json site/index.html
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fmt::Write;
use std::path::PathBuf;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeview_core::{Initializer, Page, RenderOptions, SiteFetcher, ViewerBinding, ViewerConfig};

/// Codeview - read-only code viewers for marked page elements
#[derive(Parser, Debug)]
#[command(name = "codeview")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page markup to load
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Jump to each element's requested line after loading
    #[arg(short, long)]
    line_jump: bool,

    /// Print every viewer's content
    #[arg(short, long)]
    show: bool,

    /// Disable colors in shown content
    #[arg(long)]
    no_color: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over -v
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(log_level).into()));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .init();

    tracing::info!("Starting codeview v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Bundled grammars: {}",
        codeview_syntax::supported_modes().join(", ")
    );

    let config = load_config(&args)?;
    let output = run(&args, config).await?;
    print!("{output}");

    Ok(())
}

/// Reads the configuration, then applies command line overrides.
fn load_config(args: &Args) -> anyhow::Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ViewerConfig::load(),
    };
    if args.line_jump {
        config.viewer.line_jump = true;
    }
    Ok(config)
}

/// Loads the page, fires the initializer once, and formats the result.
async fn run(args: &Args, config: ViewerConfig) -> anyhow::Result<String> {
    let page = Page::load(&args.page)
        .await
        .with_context(|| format!("Failed to load page {}", args.page.display()))?;

    let fetcher = SiteFetcher::new(page.base())?;
    let initializer = Initializer::new(config, fetcher);
    let bindings = initializer.run(&page).await;

    let mut out = String::new();
    match args.format {
        Format::Json => {
            let summaries: Vec<_> = bindings.iter().map(ViewerBinding::summary).collect();
            out.push_str(&serde_json::to_string_pretty(&summaries)?);
            out.push('\n');
        }
        Format::Text => {
            let options = RenderOptions {
                color: !args.no_color,
                max_lines: None,
            };
            for binding in &bindings {
                writeln!(out, "{}", binding.summary())?;
                if args.show {
                    out.push_str(&codeview_core::render(binding.viewer(), &options));
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let ten: Vec<String> = (1..=10).map(|i| format!("print({i})")).collect();
        std::fs::write(dir.path().join("ten.py"), ten.join("\n")).unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            r#"<body>
  <div class="code" data-src-file="ten.py" data-line="4"></div>
  <div class="code" data-src-file="gone.rs"></div>
</body>"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["codeview", "index.html"]);
        assert_eq!(args.page, PathBuf::from("index.html"));
        assert!(!args.line_jump);
        assert!(!args.show);
        assert_eq!(args.format, Format::Text);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from(["codeview", "-l", "-s", "-f", "json", "-vv", "p.html"]);
        assert!(args.line_jump);
        assert!(args.show);
        assert_eq!(args.format, Format::Json);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_line_jump_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[viewer]\nline_jump = false\n").unwrap();

        let path = path.display().to_string();
        let args = Args::parse_from(["codeview", "-c", path.as_str(), "-l", "p.html"]);
        assert!(load_config(&args).unwrap().viewer.line_jump);
    }

    #[tokio::test]
    async fn test_run_json_summaries() {
        let dir = site();
        let page = dir.path().join("index.html").display().to_string();
        let args = Args::parse_from(["codeview", "-f", "json", "-l", page.as_str()]);

        let mut config = ViewerConfig::default();
        config.viewer.line_jump = args.line_jump;
        let out = run(&args, config).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(json[0]["phase"], "loaded");
        assert_eq!(json[0]["mode"], "py");
        assert_eq!(json[0]["lines"], 10);
        assert_eq!(json[0]["first_visible_line"], 4);
        assert!((json[0]["height"].as_f64().unwrap() - 11.0).abs() < 1e-9);

        assert_eq!(json[1]["phase"], "failed");
        assert_eq!(json[1]["height"], 1.0);
    }

    #[tokio::test]
    async fn test_run_text_with_show() {
        let dir = site();
        let page = dir.path().join("index.html").display().to_string();
        let args = Args::parse_from(["codeview", "--show", "--no-color", page.as_str()]);

        let out = run(&args, ViewerConfig::default()).await.unwrap();

        assert!(out.starts_with("#0 ten.py [py] loaded"));
        assert!(out.contains(" 1 | print(1)\n"));
        assert!(out.contains("#1 gone.rs [rs] failed height=1em"));
        assert!(out.contains("1 | contents not available\n"));
    }

    #[tokio::test]
    async fn test_run_missing_page() {
        let args = Args::parse_from(["codeview", "/no/such/page.html"]);
        assert!(run(&args, ViewerConfig::default()).await.is_err());
    }
}
