use anyhow::{Context, Result};
use cite_master::cite::{CitationFormatter, FormattedRecord, RenderMode, Style};
use cite_master::config::{default_config_path, load_config, Config, ConfigFile, LOCAL_CONFIG_FILE};
use cite_master::keys::{
    filter_lines, FilteredLine, KeyDiff, KeyExtractor, KeyList, KeyMatcher, Suggestion,
    TokenFilter, DIFF_FILE_NAME,
};
use cite_master::models::ReferenceBatch;
use cite_master::sources::{load_batch, source_for};
use cite_master::ui::{self, Status};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cite Master - mine citation keys and render reference lists
#[derive(Parser, Debug)]
#[command(name = "cite-master")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Mine citation keys, reconcile them with reference records and render APA/TJS/Chicago reference lists", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, plain otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

/// Citation styles
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StyleArg {
    #[value(name = "apa")]
    Apa,
    #[value(name = "tjs")]
    Tjs,
    #[value(name = "chicago")]
    Chicago,
}

impl From<StyleArg> for Style {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Apa => Style::Apa,
            StyleArg::Tjs => Style::Tjs,
            StyleArg::Chicago => Style::Chicago,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract citation keys from an article ("-" reads stdin)
    #[command(alias = "k")]
    Keys {
        /// Article text file
        input: String,

        /// Heading that starts the bibliography
        #[arg(long, short)]
        marker: Option<String>,
    },

    /// Normalize search keys and sort a reference batch
    Order {
        /// Reference batch (JSON array)
        input: String,

        /// Write the ordered batch to a file instead of stdout
        #[arg(long, short = 'w')]
        write: Option<PathBuf>,
    },

    /// Render a reference batch in a citation style
    #[command(alias = "f")]
    Format {
        /// Reference batch (JSON array)
        input: String,

        /// Citation style (defaults to the configured style)
        #[arg(long, short, value_enum)]
        style: Option<StyleArg>,

        /// Emit inline HTML for emphasis and links
        #[arg(long)]
        markup: bool,

        /// Append DOI links where the style allows one
        #[arg(long)]
        with_doi: bool,

        /// Only records whose search text contains every word of the query
        #[arg(long)]
        filter: Option<String>,

        /// Also print the search-key list
        #[arg(long)]
        keys: bool,
    },

    /// Show info links and a scholar query for each record
    Info {
        /// Reference batch (JSON array)
        input: String,
    },

    /// Match a key list against a reference batch
    #[command(alias = "d")]
    Diff {
        /// Key list, one key per line, `requested => replacement` allowed
        keys: String,

        /// Reference batch (JSON array)
        references: String,

        /// Suggest near-miss records for unmatched keys
        #[arg(long)]
        suggest: bool,

        /// Write the reconciled key list (defaults to key-diff.txt)
        #[arg(long, short, num_args = 0..=1, default_missing_value = DIFF_FILE_NAME)]
        export: Option<PathBuf>,

        /// Only export rows with a differing replacement
        #[arg(long, requires = "export")]
        diff_only: bool,
    },

    /// Print the lines of a file that contain every word of a query
    Filter {
        /// Text file ("-" reads stdin)
        input: String,

        /// Space-separated words, matched case-insensitively
        query: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Target path (defaults to the per-user config file)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };
    let json_logs = config.logging.format.as_deref() == Some("json");

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("cite_master={}", env_filter)),
        ))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .init();

    let output = resolve_output(cli.output);

    match cli.command {
        Some(Commands::Keys { input, marker }) => {
            let text = read_text(&input).await?;
            let extractor = KeyExtractor::with_marker(marker.unwrap_or(config.extract.marker));
            let keys = extractor.extract(&text);
            output_keys(&keys, output)?;
            if !cli.quiet {
                ui::print_status(Status::Info, &format!("{} keys", keys.len()));
            }
        }

        Some(Commands::Order { input, write }) => {
            let batch = read_batch(&input).await?;
            let json = batch.ordered()?.to_json_pretty()?;
            match write {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.quiet {
                        ui::print_status(
                            Status::Success,
                            &format!("Wrote {} references to {}", batch.len(), path.display()),
                        );
                    }
                }
                None => println!("{}", json),
            }
        }

        Some(Commands::Format {
            input,
            style,
            markup,
            with_doi,
            filter,
            keys,
        }) => {
            let batch = read_batch(&input).await?;
            let mut options = config.format.options();
            if let Some(style) = style {
                options.style = style.into();
            }
            if markup {
                options.mode = RenderMode::Markup;
            }
            options.with_doi |= with_doi;

            let filter = TokenFilter::new(filter.as_deref().unwrap_or(""));
            let records: Vec<FormattedRecord> = CitationFormatter::new(options)
                .format_batch(&batch)
                .into_iter()
                .filter(|r| filter.matches(&r.search_text))
                .collect();

            output_citations(&records, output)?;

            let failed = records.iter().filter(|r| r.result.is_err()).count();
            if failed > 0 {
                ui::print_status(
                    Status::Warning,
                    &format!("{} of {} records could not be formatted", failed, records.len()),
                );
            }

            if keys {
                let search_keys: Vec<&str> =
                    records.iter().filter_map(|r| r.search_key.as_deref()).collect();
                output_keys(&search_keys, output)?;
            }
        }

        Some(Commands::Info { input }) => {
            let batch = read_batch(&input).await?;
            output_info(&batch, output)?;
        }

        Some(Commands::Diff {
            keys,
            references,
            suggest,
            export,
            diff_only,
        }) => {
            let list = KeyList::parse(&read_text(&keys).await?);
            let batch = read_batch(&references).await?;
            let diff = KeyMatcher::new(&batch).diff(&list);

            let suggestions = if suggest {
                diff.suggestions(config.matcher.suggestion_threshold)
            } else {
                Vec::new()
            };

            output_diff(&diff, &suggestions, output)?;

            if let Some(path) = export {
                std::fs::write(&path, diff.to_diff_text(diff_only))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Exported key list to {}", path.display()),
                    );
                }
            }
        }

        Some(Commands::Filter { input, query }) => {
            let text = read_text(&input).await?;
            let filter = TokenFilter::new(&query);
            let styled = output == OutputFormat::Table;
            for line in filter_lines(&text, &filter) {
                match line {
                    FilteredLine::Heading(heading) if styled => {
                        println!("{}", heading.bold().cyan())
                    }
                    line => println!("{}", line.text()),
                }
            }
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Init { path, force } => {
                let path = path
                    .or_else(default_config_path)
                    .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists, use --force to overwrite",
                        path.display()
                    );
                }
                ConfigFile::create_default().save(&path)?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Wrote default configuration to {}", path.display()),
                    );
                }
            }
            ConfigCommands::Show => {
                println!("{}", render_config(config)?);
            }
        },

        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "cite-master", &mut std::io::stdout());
        }

        None => {
            // No command provided - show help
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  keys <article>           - Extract citation keys");
            println!("  format <refs.json>       - Render a reference list");
            println!("  diff <keys> <refs.json>  - Match keys against references");
            println!("  order <refs.json>        - Sort a reference batch");
        }
    }

    Ok(())
}

fn resolve_output(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if ui::is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Plain
        }
    } else {
        format
    }
}

async fn read_text(input: &str) -> Result<String> {
    source_for(input)
        .acquire_text()
        .await
        .with_context(|| format!("Failed to read {}", input))
}

async fn read_batch(input: &str) -> Result<ReferenceBatch> {
    Ok(load_batch(source_for(input).as_ref()).await?)
}

fn render_config(config: Config) -> Result<String> {
    Ok(toml::to_string_pretty(&ConfigFile::from(config))?)
}

fn new_table(header: Vec<&str>) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(header);
    table
}

fn output_keys<S: AsRef<str> + Serialize>(keys: &[S], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(keys)?),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "Key"]);
            for (i, key) in keys.iter().enumerate() {
                table.add_row(vec![(i + 1).to_string(), key.as_ref().to_string()]);
            }
            println!("{table}");
        }
        _ => {
            for key in keys {
                println!("{}", key.as_ref());
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CitationOutput<'a> {
    index: usize,
    search_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    citation: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn output_citations(records: &[FormattedRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<CitationOutput> = records
                .iter()
                .map(|r| CitationOutput {
                    index: r.index,
                    search_key: r.search_key.as_deref(),
                    citation: r.result.as_deref().ok(),
                    error: r.result.as_ref().err().map(ToString::to_string),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            use comfy_table::{Cell, Color};
            let mut table = new_table(vec!["Key", "Citation"]);
            for r in records {
                let key = ui::truncate_with_ellipsis(r.search_key.as_deref().unwrap_or(""), 30);
                let cell = match &r.result {
                    Ok(text) => Cell::new(text),
                    Err(e) => Cell::new(e).fg(Color::Red),
                };
                table.add_row(vec![Cell::new(key), cell]);
            }
            println!("{table}");
        }
        _ => {
            for r in records {
                match &r.result {
                    Ok(text) => println!("{}", text),
                    Err(e) => ui::print_status(
                        Status::Error,
                        &format!(
                            "record {} ({}): {}",
                            r.index,
                            r.search_key.as_deref().unwrap_or("no search key"),
                            e
                        ),
                    ),
                }
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoOutput<'a> {
    search_key: Option<&'a str>,
    links: Vec<(String, String)>,
    scholar: String,
}

fn output_info(batch: &ReferenceBatch, format: OutputFormat) -> Result<()> {
    let rows: Vec<InfoOutput> = batch
        .iter()
        .map(|r| InfoOutput {
            search_key: r.search_key.as_deref(),
            links: r.info_links(),
            scholar: r.scholar_query_url(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            let mut table = new_table(vec!["Key", "Links", "Scholar"]);
            for row in &rows {
                let hosts: Vec<&str> = row.links.iter().map(|(host, _)| host.as_str()).collect();
                table.add_row(vec![
                    row.search_key.unwrap_or("").to_string(),
                    hosts.join("\n"),
                    row.scholar.clone(),
                ]);
            }
            println!("{table}");
        }
        _ => {
            for row in &rows {
                println!("{}", row.search_key.unwrap_or(""));
                for (host, href) in &row.links {
                    println!("  {}: {}", host, href);
                }
                println!("  scholar: {}", row.scholar);
            }
        }
    }
    Ok(())
}

fn output_diff(diff: &KeyDiff, suggestions: &[Suggestion], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "diff": diff,
                "suggestions": suggestions,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            use comfy_table::{Cell, Color};
            let mut table = new_table(vec!["#", "", "Requested", "Matched"]);
            for (i, row) in diff.rows().iter().enumerate() {
                let status = if row.is_matched() {
                    Cell::new(ui::status_icon(Status::Success)).fg(Color::Green)
                } else {
                    Cell::new(ui::status_icon(Status::Error)).fg(Color::Red)
                };
                table.add_row(vec![
                    Cell::new(i),
                    status,
                    Cell::new(&row.requested),
                    Cell::new(ui::truncate_with_ellipsis(&row.matched, 60)),
                ]);
            }
            println!("{table}");

            if !diff.unmatched_references().is_empty() {
                ui::print_section("Never cited");
                for text in diff.unmatched_references() {
                    println!("{}", text);
                }
            }
            if !suggestions.is_empty() {
                ui::print_section("Suggestions");
                for s in suggestions {
                    println!("{} → {} ({:.2})", s.requested, s.candidate, s.score);
                }
            }
        }
        _ => {
            for row in diff.rows() {
                let status = if row.is_matched() { Status::Success } else { Status::Error };
                println!("{} {}", ui::status_icon(status), row.requested);
            }
            for text in diff.unmatched_references() {
                println!("- {}", text);
            }
            for s in suggestions {
                println!("? {} → {}", s.requested, s.candidate);
            }
        }
    }

    let matched = diff.rows().iter().filter(|r| r.is_matched()).count();
    tracing::debug!("{} of {} keys matched", matched, diff.rows().len());
    Ok(())
}
