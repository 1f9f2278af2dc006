use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing::info;

use soulspace::config::{self, Config};
use soulspace::journal::{
    entries_with_mood, excerpt, generate_id, sort_entries, JournalEntry, Position, SortOrder,
};
use soulspace::mood::MoodCatalog;
use soulspace::mood_selector::{resolve_mood, MoodSelector};
use soulspace::renderer;
use soulspace::stats::{MoodWrapStats, Period};
use soulspace::stats_builder::{compute_stats_with, mood_distribution};
use soulspace::store::{EntryStore, SqliteEntryStore};
use soulspace::{logging, timefmt, window};

// Help text constants
const HELP_MAIN: &str = "\
soulspace: mood journal and mood wrap (weekly, monthly, yearly)

Commands:
    add      Save a journal entry
    title    Set the title of an entry
    list     List entries (sorted, optionally for one mood)
    bubbles  All-time share of each mood
    moods    Show the mood catalog
    wrap     Compute a mood wrap
    render   Render a saved mood wrap

Usage:
    soulspace add [--text <text>] [--mood <id>] [--title <title>]
    soulspace list [--sort <date-desc|date-asc|mood>] [--mood <id>] [--limit <n>]
    soulspace wrap --period <weekly|monthly|yearly> [--at <date>] [--json <path>] [--render md] [--output <dir>]

More help:
    soulspace --help add
    soulspace --help list
    soulspace --help wrap
    soulspace --help render

Data lives in $SOULSPACE_DATA_DIR (default: ./.soulspace).";

const HELP_ADD: &str = "\
Save a journal entry

Usage:
    soulspace add [--text <text>] [--mood <id>] [--title <title>]

Options:
    --text <text>    Entry text. If omitted, read from stdin (or asked for interactively).
    --mood <id>      Mood id (see 'soulspace moods'). If omitted, pick from a list.
    --title <title>  Optional title.

Examples:
  soulspace add --text \"Walked by the river after work\" --mood calm
  echo \"Long day, but I finished it\" | soulspace add --mood reflective";

const HELP_LIST: &str = "\
List journal entries

Usage:
    soulspace list [--sort <date-desc|date-asc|mood>] [--mood <id>] [--limit <n>]

Options:
    --sort <order>   date-desc (newest first, default), date-asc, or mood (by mood name).
    --mood <id>      Only entries saved with this mood.
    --limit <n>      Show at most n entries (default: 20).

Examples:
  soulspace list --sort date-asc
  soulspace list --mood grateful --limit 5";

const HELP_WRAP: &str = "\
Compute a mood wrap

Usage:
    soulspace wrap --period <weekly|monthly|yearly> [--at <date>] [--json <path>] [--render md] [--output <dir>]

Options:
    --period <period>    weekly (last 7 days), monthly (calendar month) or yearly (calendar year).
    --at <date>          Compute as of noon on this date: 2025, 2025-03 or 2025-03-15. Default: now.
    --json <path>        Write the stats JSON to this path.
    --render [formats]   Render reports (md). Empty renders all.
    --output <dir>       Output directory for reports (default: current dir).

Without --json or --render the Markdown report is printed to stdout.

Examples:
  soulspace wrap --period monthly
  soulspace wrap --period yearly --at 2025 --json wrap-2025.json --render md --output reports";

const HELP_RENDER: &str = "\
Render a saved mood wrap

Usage:
    soulspace render --json-stats <path> [--formats md] [--output <dir>]

Options:
    --json-stats <path>  Stats JSON written by 'soulspace wrap --json'.
    --formats [formats]  Comma-separated formats (md). Empty renders all.
    --output <dir>       Output directory (default: current dir). Filenames follow the period and key.

Examples:
  soulspace render --json-stats wrap-2025.json --output reports";

#[derive(Parser)]
#[command(name = "soulspace", disable_help_flag = true)]
#[command(about = "Mood journal and mood wrap", long_about = None)]
struct Cli {
    /// Show help (global or per topic). Example: soulspace --help wrap
    #[arg(long, value_name = "TOPIC", num_args = 0..=1, default_missing_value = "")]
    help: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a journal entry
    Add {
        /// Entry text. If omitted, read from stdin or asked for interactively.
        #[arg(long)]
        text: Option<String>,
        /// Mood id. If omitted, interactive selection.
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// Set the title of an existing entry
    Title {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
    },
    /// List entries
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// date-desc, date-asc or mood
        #[arg(long, default_value = "date-desc")]
        sort: SortOrder,
        /// Only entries with this mood id
        #[arg(long)]
        mood: Option<String>,
    },
    /// Show the all-time share of each mood
    Bubbles,
    /// Show the mood catalog
    Moods,
    /// Compute a mood wrap for a period
    Wrap {
        #[arg(long, default_value = "monthly")]
        period: Period,
        /// Anchor date: 2025, 2025-03 or 2025-03-15
        #[arg(long)]
        at: Option<String>,
        /// Write stats JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
        /// Render formats (comma-separated: md). Renders all if no formats specified.
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        render: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a saved stats JSON
    Render {
        #[arg(long)]
        json_stats: PathBuf,
        #[arg(long, default_value = "")]
        formats: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Add { .. } => "add",
            Commands::Title { .. } => "title",
            Commands::List { .. } => "list",
            Commands::Bubbles => "bubbles",
            Commands::Moods => "moods",
            Commands::Wrap { .. } => "wrap",
            Commands::Render { .. } => "render",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(help_topic) = cli.help {
        let topic = help_topic.trim();
        if topic.is_empty() {
            println!("{}", HELP_MAIN);
        } else if topic.eq_ignore_ascii_case("add") {
            println!("{}", HELP_ADD);
        } else if topic.eq_ignore_ascii_case("list") {
            println!("{}", HELP_LIST);
        } else if topic.eq_ignore_ascii_case("wrap") {
            println!("{}", HELP_WRAP);
        } else if topic.eq_ignore_ascii_case("render") {
            println!("{}", HELP_RENDER);
        } else {
            println!("Unknown help topic: {}", topic);
        }
        return Ok(());
    }

    let Some(command) = cli.command else {
        eprintln!("No command specified.");
        eprintln!("{}", HELP_MAIN);
        return Ok(());
    };

    let data_root = config::resolve_data_root();
    let config = Config::load(&data_root)?;
    logging::init_logging(&data_root, &config.log.filter, command.name())?;

    let config_file = config::config_path(&data_root);
    if config_file.exists() {
        info!("Config loaded from {}", config_file.display());
    } else {
        info!("No config file at {}, using defaults", config_file.display());
    }

    let catalog = MoodCatalog::default();

    match command {
        Commands::Add { text, mood, title } => {
            let store = open_store(&config, &data_root, &catalog)?;
            run_add(&store, &catalog, &data_root, text, mood, title)
        }
        Commands::Title { id, title } => {
            let store = open_store(&config, &data_root, &catalog)?;
            if !store.backfill_title(&id, title.trim())? {
                bail!("No entry with id {}", id);
            }
            info!("Title set for entry {}", id);
            eprintln!("Title set for entry {}", id);
            Ok(())
        }
        Commands::List { limit, sort, mood } => {
            let store = open_store(&config, &data_root, &catalog)?;
            run_list(&store, &catalog, limit, sort, mood.as_deref())
        }
        Commands::Bubbles => {
            let store = open_store(&config, &data_root, &catalog)?;
            run_bubbles(&store, &catalog)
        }
        Commands::Moods => {
            for mood in catalog.iter() {
                println!(
                    "{:<12} {:<16} {}",
                    mood.id,
                    mood.label(),
                    mood.description.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        Commands::Wrap {
            period,
            at,
            json,
            render,
            output,
        } => {
            let store = open_store(&config, &data_root, &catalog)?;
            let now = resolve_now(at.as_deref())?;
            let entries = store.load()?;
            let stats =
                compute_stats_with(&entries, period, &now, &catalog, &config.thresholds);
            info!(
                "Computed {} wrap {} over {} entries ({} in window)",
                period,
                stats.key,
                entries.len(),
                stats.total_entries
            );

            if let Some(ref json_path) = json {
                stats.save_to_file(json_path)?;
                eprintln!("Stats written to: {}", json_path.display());
            }

            match render {
                Some(formats) => render_reports(&stats, &formats, output),
                None if json.is_none() => {
                    print!("{}", renderer::md::render(&stats)?);
                    Ok(())
                }
                None => Ok(()),
            }
        }
        Commands::Render {
            json_stats,
            formats,
            output,
        } => {
            let stats = MoodWrapStats::load_from_file(&json_stats)?;
            render_reports(&stats, &formats, output)
        }
    }
}

fn open_store(config: &Config, data_root: &Path, catalog: &MoodCatalog) -> Result<SqliteEntryStore> {
    SqliteEntryStore::open(&config.db_path(data_root), catalog.clone())
}

fn run_add(
    store: &impl EntryStore,
    catalog: &MoodCatalog,
    data_root: &Path,
    text: Option<String>,
    mood: Option<String>,
    title: Option<String>,
) -> Result<()> {
    let content = match text {
        Some(text) => text,
        None => read_content()?,
    };
    if content.trim().is_empty() {
        bail!("Entry text is empty");
    }

    let mut selector = MoodSelector::new(catalog, data_root)?;
    let mood = selector.select(mood)?;

    let existing = store.load_for_write()?;
    let now = Utc::now();
    let mut entry = JournalEntry::new(content.trim(), mood, now)
        .with_position(Position::random(&mut rand::thread_rng()));
    entry.id = generate_id(now, &existing);
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        entry.set_title(title.trim());
    }

    let id = entry.id.clone();
    let label = entry.mood.label();
    store.append(entry)?;

    info!("Saved entry {}", id);
    println!("Saved entry {} feeling {}", id, label);
    Ok(())
}

/// Entry text from stdin, or an interactive prompt when stdin is a terminal.
fn read_content() -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        let text = inquire::Text::new("What's on your mind?").prompt()?;
        return Ok(text);
    }

    let mut content = String::new();
    stdin
        .lock()
        .read_to_string(&mut content)
        .context("Failed to read entry text from stdin")?;
    Ok(content)
}

fn run_list(
    store: &impl EntryStore,
    catalog: &MoodCatalog,
    limit: usize,
    sort: SortOrder,
    mood: Option<&str>,
) -> Result<()> {
    let mut entries = store.load()?;
    if entries.is_empty() {
        println!("No entries yet. Add one with 'soulspace add'.");
        return Ok(());
    }

    sort_entries(&mut entries, sort);
    let shown: Vec<&JournalEntry> = match mood {
        Some(id) => {
            let mood = resolve_mood(catalog, id)?;
            let matching = entries_with_mood(&entries, &mood.id);
            println!(
                "{} {} {}",
                mood.label(),
                matching.len(),
                if matching.len() == 1 { "entry" } else { "entries" }
            );
            matching
        }
        None => entries.iter().collect(),
    };
    info!("Listing {} entries sorted {}", shown.len(), sort);

    for entry in shown.iter().take(limit) {
        let summary = match entry.title {
            Some(ref title) => title.clone(),
            None => excerpt(&entry.content, 60),
        };
        println!(
            "{}  {}  {:<16} {}",
            entry.id,
            timefmt::format_timestamp(&entry.timestamp),
            entry.mood.label(),
            summary.replace('\n', " ")
        );
    }
    if shown.len() > limit {
        println!("... {} more", shown.len() - limit);
    }
    Ok(())
}

fn run_bubbles(store: &impl EntryStore, catalog: &MoodCatalog) -> Result<()> {
    let entries = store.load()?;
    if entries.is_empty() {
        println!("No entries yet. Add one with 'soulspace add'.");
        return Ok(());
    }

    for share in mood_distribution(&entries, catalog) {
        let filled = (share.percentage as usize).div_ceil(5);
        println!(
            "{:<16} {:<20} {:>3}%  ({})",
            share.mood.label(),
            "●".repeat(filled),
            share.percentage,
            share.count
        );
    }
    println!("{} entries in total", entries.len());
    Ok(())
}

/// Local "now", or noon of the `--at` anchor date.
fn resolve_now(at: Option<&str>) -> Result<DateTime<Local>> {
    let Some(anchor) = at else {
        return Ok(Local::now());
    };

    let date = window::parse_anchor(anchor)?;
    let noon = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| anyhow!("Invalid anchor date: {}", anchor))?;
    Local
        .from_local_datetime(&noon)
        .earliest()
        .ok_or_else(|| anyhow!("Anchor {} does not exist in the local time zone", anchor))
}

fn render_reports(stats: &MoodWrapStats, formats: &str, output: Option<PathBuf>) -> Result<()> {
    // Determine output directory
    let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    // Parse formats
    let formats: Vec<&str> = if formats.trim().is_empty() {
        // Empty string means render all
        vec!["md"]
    } else {
        formats.split(',').map(|s| s.trim()).collect()
    };

    // Render each format
    for format in formats {
        match format {
            "md" => {
                let markdown = renderer::md::render(stats)?;
                let output_path = output_dir.join(renderer::md::report_filename(stats));
                std::fs::write(&output_path, markdown).with_context(|| {
                    format!("Failed to write report: {}", output_path.display())
                })?;
                info!("Markdown report written to {}", output_path.display());
                eprintln!("Markdown report written to: {}", output_path.display());
            }
            _ => {
                eprintln!("Warning: Unknown format '{}', skipping", format);
            }
        }
    }

    Ok(())
}
