//! name-indexer CLI: LLM-assisted person-name index for PDF documents.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use name_indexer::config::AppConfig;
use name_indexer::document::{pdf_text, read_lines, read_pdf_pages};
use name_indexer::export::{render_json, render_text};
use name_indexer::index::{NameIndex, parse_page_list};
use name_indexer::llm::ChatClient;
use name_indexer::pipeline::{NameExtractor, index_names};
use name_indexer::repair::JsonRepair;

#[derive(Parser)]
#[command(
    name = "name-indexer",
    version,
    about = "Build a person-name index for PDF documents"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair an LLM reply and print the records it contains as JSON.
    Repair {
        /// File holding the reply (stdin when omitted).
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Extract person names from a PDF with the configured LLM.
    Names {
        #[arg(long)]
        pdf: PathBuf,

        /// Write name keys here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Find the pages each name in a names list occurs on.
    Index {
        #[arg(long)]
        pdf: PathBuf,

        /// Names list, one key per line (e.g. "Einstein_Albert").
        #[arg(long)]
        names: PathBuf,

        /// Pages to skip, e.g. "1-7,31" (added to the configured list).
        #[arg(long)]
        exclude: Option<String>,

        /// Shift reported pages, e.g. -12 when printed numbering starts later.
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i64>,

        /// Print JSON instead of the annotated names list.
        #[arg(long)]
        json: bool,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Extract names and index them in one go.
    Run {
        #[arg(long)]
        pdf: PathBuf,

        #[arg(long)]
        exclude: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i64>,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Repair { input } => {
            let reply = match input {
                Some(path) => std::fs::read_to_string(&path).into_diagnostic()?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
                    buf
                }
            };
            let records = JsonRepair::new(config.extraction.max_attempts).extract(Some(&reply));
            println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
        }

        Commands::Names { pdf, output } => {
            let keys = extract_keys(&config, &pdf_text(&pdf)?)?;
            let mut text = keys.join("\n");
            text.push('\n');
            emit(&text, output.as_deref())?;
        }

        Commands::Index {
            pdf,
            names,
            exclude,
            offset,
            json,
            output,
        } => {
            apply_overrides(&mut config, exclude.as_deref(), offset)?;
            let keys = read_lines(&names)?;
            let index = index_names(&keys, &read_pdf_pages(&pdf)?, &config.index)?;
            emit(&render(&keys, &index, json)?, output.as_deref())?;
        }

        Commands::Run {
            pdf,
            exclude,
            offset,
            json,
            output,
        } => {
            apply_overrides(&mut config, exclude.as_deref(), offset)?;
            let pages = read_pdf_pages(&pdf)?;
            let keys = extract_keys(&config, &pages.full_text())?;
            let index = index_names(&keys, &pages, &config.index)?;
            emit(&render(&keys, &index, json)?, output.as_deref())?;
        }
    }

    Ok(())
}

fn extract_keys(config: &AppConfig, text: &str) -> Result<Vec<String>> {
    let client = ChatClient::new(config.llm.clone());
    tracing::info!(model = client.model(), "using chat model");

    let extractor = NameExtractor::new(client, config.extraction.clone(), config.chunking.clone())
        .with_separator(config.index.key_separator.clone());
    let report = extractor.extract_names(text)?;
    if report.failed_chunks > 0 {
        tracing::warn!(
            failed = report.failed_chunks,
            total = report.chunks,
            "some chunks could not be processed, the name list may be incomplete"
        );
    }
    Ok(report.keys)
}

fn apply_overrides(config: &mut AppConfig, exclude: Option<&str>, offset: Option<i64>) -> Result<()> {
    if let Some(list) = exclude {
        let pages: BTreeSet<u32> = parse_page_list(list)?;
        config.index.exclude_pages.extend(pages);
    }
    if let Some(offset) = offset {
        config.index.page_offset = offset;
    }
    Ok(())
}

fn render(keys: &[String], index: &NameIndex, json: bool) -> Result<String> {
    if json {
        render_json(index).into_diagnostic()
    } else {
        Ok(render_text(keys, index))
    }
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).into_diagnostic()?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{text}"),
    }
    Ok(())
}
