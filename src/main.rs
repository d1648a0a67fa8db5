use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize};
use eyre::Result;
use std::path::PathBuf;
use tasklist::config::default_config_path;
use tasklist::{
    Backend, BlobStore, Config, DEFAULT_COLOR, FileBlobStore, Filter, FilterOp, Priority, SqliteBlobStore, Task, TaskStore,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Task list manager - add, edit, complete, sort and filter tasks")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: <config dir>/tasklist/tasklist.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the store directory (overrides the config file)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Use the dark palette for this run
    #[arg(long)]
    dark_mode: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        description: String,
        #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,
        /// Due date, YYYY-MM-DD
        #[arg(short, long, default_value = "")]
        due: String,
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
    },

    /// Change fields of an existing task
    Edit {
        /// Task id or a unique prefix of it
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(short, long)]
        due: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a task
    Delete { id: String },

    /// Mark a task done, or not done again
    Toggle { id: String },

    /// Sort the list by due date (saved)
    Sort,

    /// Show tasks, optionally narrowed by filters
    List(ListArgs),

    /// Toggle dark mode in the config file
    DarkMode,
}

#[derive(Args, Default)]
struct ListArgs {
    /// Only tasks of this priority
    #[arg(short, long, value_parser = parse_priority)]
    priority: Option<Priority>,

    /// Only completed tasks
    #[arg(long, conflicts_with = "open")]
    done: bool,

    /// Only tasks not yet completed
    #[arg(long)]
    open: bool,

    /// Only tasks with exactly this colour
    #[arg(long)]
    color: Option<String>,

    /// Only tasks due on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    due_from: Option<String>,

    /// Only tasks due on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    due_by: Option<String>,

    /// Only tasks whose description contains this text
    #[arg(long)]
    search: Option<String>,
}

impl ListArgs {
    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(priority) = self.priority {
            filters.push(Filter::equals("priority", priority.as_str()));
        }
        if self.done || self.open {
            filters.push(Filter::equals("isCompleted", self.done));
        }
        if let Some(color) = &self.color {
            filters.push(Filter::equals("color", color.as_str()));
        }
        if let Some(from) = &self.due_from {
            filters.push(Filter::new("dueDate", FilterOp::Gte, from.as_str()));
        }
        if let Some(by) = &self.due_by {
            filters.push(Filter::new("dueDate", FilterOp::Lte, by.as_str()));
        }
        if let Some(text) = &self.search {
            filters.push(Filter::new("description", FilterOp::Contains, text.as_str()));
        }
        filters
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&config_path)?;

    // Setup tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(path = ?config_path, found = config_path.exists(), "Loaded config");

    if let Commands::DarkMode = cli.command {
        config.dark_mode = !config.dark_mode;
        config.save(&config_path)?;
        println!("Dark mode {}", if config.dark_mode { "on" } else { "off" });
        return Ok(());
    }

    if let Some(path) = cli.store_path {
        config.store_path = path;
    }
    let dark_mode = cli.dark_mode || config.dark_mode;

    // Open store
    let blobs: Box<dyn BlobStore> = match config.backend {
        Backend::Sqlite => Box::new(SqliteBlobStore::open(&config.store_path)?),
        Backend::File => Box::new(FileBlobStore::open(&config.store_path)?),
    };
    let mut store: TaskStore<Box<dyn BlobStore>> = TaskStore::open(blobs)?;

    match cli.command {
        Commands::Add {
            description,
            priority,
            due,
            color,
        } => {
            store.add(description, priority, due, color)?;
        }
        Commands::Edit {
            id,
            description,
            priority,
            due,
            color,
        } => {
            if let Some(id) = resolve_id(&store, &id) {
                store.begin_edit(&id);
                if let Some(draft) = store.draft_mut() {
                    if let Some(description) = description {
                        draft.description = description;
                    }
                    if let Some(priority) = priority {
                        draft.priority = priority;
                    }
                    if let Some(due) = due {
                        draft.due_date = due;
                    }
                    if let Some(color) = color {
                        draft.color = color;
                    }
                }
                store.commit_edit()?;
            }
        }
        Commands::Delete { id } => {
            if let Some(id) = resolve_id(&store, &id) {
                store.delete(&id)?;
            }
        }
        Commands::Toggle { id } => {
            if let Some(id) = resolve_id(&store, &id) {
                store.toggle_completion(&id)?;
            }
        }
        Commands::Sort => store.sort_by_due_date()?,
        Commands::List(args) => {
            let filters = args.filters();
            match (args.priority, filters.len()) {
                (_, 0) => store.show_all(),
                (Some(priority), 1) => store.filter_by_priority(priority),
                _ => store.apply_filters(filters),
            }
        }
        Commands::DarkMode => {}
    }

    print_view(&store.view(), store.active_filters(), dark_mode);
    Ok(())
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse().map_err(|e: eyre::Report| e.to_string())
}

fn parse_date(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("{} (expected YYYY-MM-DD)", e))
}

/// Exact id, or the single task whose id starts with `given`
fn resolve_id<B: BlobStore>(store: &TaskStore<B>, given: &str) -> Option<String> {
    if store.get(given).is_some() {
        return Some(given.to_string());
    }

    match store.find_by_prefix(given).as_slice() {
        [task] => Some(task.id.clone()),
        [] => {
            println!("No task with id {}", given);
            None
        }
        matches => {
            println!("{} tasks match {}, give more of the id", matches.len(), given);
            None
        }
    }
}

fn print_view(tasks: &[&Task], filters: &[Filter], dark_mode: bool) {
    println!("{}", "To-Do List".bold());
    if !filters.is_empty() {
        let shown: Vec<String> = filters.iter().map(|f| f.to_string()).collect();
        println!("Filter: {}", shown.join(", ").as_str().italic());
    }
    for task in tasks {
        println!("{}", render_task(task, dark_mode));
    }
    println!("Total Tasks: {}", tasks.len());
}

fn render_task(task: &Task, dark_mode: bool) -> String {
    let swatch = match parse_hex_color(&task.color) {
        Some((r, g, b)) => "  ".on_truecolor(r, g, b),
        None => "  ".normal(),
    };

    let summary = format!("{} - Priority: {} - Due: {}", task.description, task.priority, task.due_date);
    let summary = if task.is_completed {
        summary.as_str().strikethrough().dimmed()
    } else {
        summary.as_str().normal()
    };

    format!("{} {} {} {}", swatch, priority_badge(task.priority, dark_mode), summary, task.id.as_str().dimmed())
}

fn priority_badge(priority: Priority, dark_mode: bool) -> ColoredString {
    let badge = match priority {
        Priority::Low => "LOW ",
        Priority::Medium => "MED ",
        Priority::High => "HIGH",
    };
    match (priority, dark_mode) {
        (Priority::Low, false) => badge.green(),
        (Priority::Low, true) => badge.bright_green(),
        (Priority::Medium, false) => badge.yellow(),
        (Priority::Medium, true) => badge.bright_yellow(),
        (Priority::High, false) => badge.red(),
        (Priority::High, true) => badge.bright_red(),
    }
}

/// `#rrggbb` or `#rgb`
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}
