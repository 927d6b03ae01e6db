use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use pagerule::config::{Config, LogFormat};
use pagerule::registry::{ParserRegistry, load_document};

#[derive(Parser, Debug)]
#[command(name = "pagerule")]
#[command(about = "Validate rule documents and extract records from HTML pages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate rule documents and print their effective URL patterns
    Check {
        /// Rule documents (YAML or JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Evaluate a rule document against an HTML file and print the record as JSON
    Extract {
        /// Rule document (YAML or JSON)
        #[arg(long)]
        rules: PathBuf,

        /// HTML page to evaluate
        #[arg(long)]
        html: PathBuf,

        /// Page URL; must match the document and adds BASE_URL / FULL_URL
        #[arg(long)]
        url: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Find the registered parser that handles a URL
    Find {
        /// Directory of rule documents (defaults to PAGERULE_RULES_DIR)
        #[arg(long)]
        rules_dir: Option<PathBuf>,

        url: String,
    },
}

fn main() -> Result<()> {
    let (cli, config) = match load(std::env::args_os()) {
        Ok(loaded) => loaded,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(usage) => usage.exit(),
            Err(err) => return Err(err),
        },
    };
    init_tracing(config.log_format());

    match cli.command {
        Commands::Check { files } => check(&files),
        Commands::Extract {
            rules,
            html,
            url,
            pretty,
        } => extract(&rules, &html, url.as_deref(), pretty),
        Commands::Find { rules_dir, url } => {
            let dir = rules_dir.unwrap_or_else(|| config.rules_dir().to_path_buf());
            find(&dir, &url)
        }
    }
}

/// Parses the command line before reading the environment, so `--help` and
/// `--version` work whatever the environment holds.
fn load<I, T>(args: I) -> Result<(Cli, Config)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let config = Config::from_env()?;
    Ok((cli, config))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn check(files: &[PathBuf]) -> Result<()> {
    let mut invalid = 0;
    for path in files {
        match load_document(path) {
            Ok(document) => {
                let info = document.info();
                println!(
                    "{}: {} ({}) {}",
                    path.display(),
                    info.name(),
                    info.extraction_type().as_str(),
                    info.suggested_pattern()
                );
            }
            Err(err) => {
                error!(path = %path.display(), "{err}");
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} of {} documents are invalid", files.len());
    }
    Ok(())
}

fn extract(rules: &Path, html: &Path, url: Option<&str>, pretty: bool) -> Result<()> {
    let document = load_document(rules)?;
    let markup =
        fs::read_to_string(html).with_context(|| format!("failed to read {}", html.display()))?;

    let page_url = match url {
        Some(url) => {
            if !document.is_match(url) {
                bail!("parser '{}' does not handle {url}", document.name());
            }
            Some(Url::parse(url).with_context(|| format!("invalid page URL {url}"))?)
        }
        None => None,
    };

    let extraction = document.extract_html(&markup)?;
    info!(
        entries = extraction.record.len(),
        failures = extraction.failures.len(),
        "extraction finished"
    );

    let record = match &page_url {
        Some(page_url) => extraction.record.with_page_urls(page_url),
        None => extraction.record,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{json}");
    Ok(())
}

fn find(dir: &Path, url: &str) -> Result<()> {
    let mut registry = ParserRegistry::new();
    registry.load_dir(dir)?;

    let Some(document) = registry.find_for_url(url) else {
        bail!("none of {} parsers handles {url}", registry.len());
    };
    println!("{}", document.name());
    if let Some(target) = document.redirect_url(url)? {
        println!("redirect: {target}");
    }
    Ok(())
}
