// Choosr - pick something from your lists
// One-shot commands for editing, plus a shell where shuffle rounds carry across picks

use anyhow::{Context, Result};
use choosr::{backup, ChoiceList, Config, ListEdit, Session, ViewType};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "choosr")]
#[command(about = "Keep named lists and let fair shuffle pick one item for you")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show every list
    Lists,
    /// Show the items of one list
    Show { list: String },
    /// Create a list
    New {
        name: String,
        #[arg(long)]
        emoji: Option<String>,
        /// Display color as ARGB, e.g. 0xFF2196F3
        #[arg(long, value_parser = parse_color)]
        color: Option<i64>,
        items: Vec<String>,
    },
    /// Rename a list
    Rename { list: String, name: String },
    /// Change a list's name, emoji or color
    Edit {
        list: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "no_emoji")]
        emoji: Option<String>,
        /// Display color as ARGB, e.g. 0xFF2196F3
        #[arg(long, value_parser = parse_color, conflicts_with = "no_color")]
        color: Option<i64>,
        /// Drop the emoji
        #[arg(long)]
        no_emoji: bool,
        /// Drop the color
        #[arg(long)]
        no_color: bool,
    },
    /// Delete a list
    Delete { list: String },
    /// Add items to a list
    Add {
        list: String,
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Remove an item from a list (exact text)
    Remove { list: String, item: String },
    /// Pick items from a list
    Pick {
        list: String,
        #[arg(short, long, default_value_t = 1)]
        count: usize,
        /// Skip the choosing pause
        #[arg(long)]
        no_delay: bool,
    },
    /// Show or change preferences
    Settings {
        #[arg(long)]
        avoid_previous: Option<Toggle>,
        #[arg(long)]
        view: Option<ViewType>,
    },
    /// Write all lists and preferences to a backup file
    Export { file: PathBuf },
    /// Replace all lists and preferences with a backup file
    Import {
        file: PathBuf,
        /// Don't ask before replacing
        #[arg(long)]
        yes: bool,
    },
    /// Interactive picking; rounds persist until you quit
    Shell,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn parse_color(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix('#')) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => trimmed.parse::<i64>(),
    };
    parsed.map_err(|e| format!("invalid color '{}': {}", raw, e))
}

fn init_logging(config: &Config, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.logging.directory).with_context(|| {
        format!("Failed to create log directory {}", config.logging.directory.display())
    })?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&config.logging.directory, "choosr.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    // Dev mode mirrors everything to stderr
    let stderr_layer = dev.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(base_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    let _log_guard = init_logging(&config, args.dev)?;
    info!("Choosr starting up");

    let mut session = Session::open(config, Some(config_path))?;
    run(&mut session, args.command).await
}

async fn run(session: &mut Session, command: Command) -> Result<()> {
    match command {
        Command::Lists => print_lists(session),
        Command::Show { list } => {
            let list = resolve(session, &list)?;
            println!("{}", list.title());
            for (i, item) in list.items.iter().enumerate() {
                println!("  {:>3}. {}", i + 1, item);
            }
        }
        Command::New {
            name,
            emoji,
            color,
            items,
        } => {
            if name.trim().is_empty() {
                anyhow::bail!("List name cannot be empty");
            }
            let mut list = ChoiceList::new(name).with_items(items);
            if let Some(emoji) = emoji {
                list = list.with_emoji(emoji);
            }
            if let Some(color) = color {
                list = list.with_color(color);
            }
            let title = list.title();
            let count = list.len();
            session.add_list(list)?;
            println!("Created {} ({} items)", title, count);
        }
        Command::Rename { list, name } => {
            let id = resolve(session, &list)?.id.clone();
            session.rename_list(&id, &name)?;
            println!("Renamed to {}", name.trim());
        }
        Command::Edit {
            list,
            name,
            emoji,
            color,
            no_emoji,
            no_color,
        } => {
            let id = resolve(session, &list)?.id.clone();
            session.edit_list(
                &id,
                ListEdit {
                    name,
                    emoji,
                    color_argb: color,
                    clear_emoji: no_emoji,
                    clear_color: no_color,
                },
            )?;
            if let Some(list) = session.get(&id) {
                println!("Updated {}", list.title());
            }
        }
        Command::Delete { list } => {
            let list = resolve(session, &list)?.clone();
            session.delete_list(&list.id)?;
            println!("Deleted {}", list.title());
        }
        Command::Add { list, items } => {
            let id = resolve(session, &list)?.id.clone();
            for item in items {
                if session.add_item(&id, &item)? {
                    println!("Added {}", item.trim());
                } else {
                    println!("Skipped '{}' (blank or already in the list)", item);
                }
            }
        }
        Command::Remove { list, item } => {
            let id = resolve(session, &list)?.id.clone();
            if session.remove_item(&id, &item)? {
                println!("Removed {}", item);
            } else {
                println!("'{}' is not in the list", item);
            }
        }
        Command::Pick {
            list,
            count,
            no_delay,
        } => {
            let id = resolve(session, &list)?.id.clone();
            let delay = if no_delay {
                Duration::ZERO
            } else {
                Duration::from_millis(session.config().shuffle.choosing_delay_ms)
            };
            for _ in 0..count {
                if !pick_and_print(session, &id, delay).await? {
                    break;
                }
            }
        }
        Command::Settings {
            avoid_previous,
            view,
        } => {
            if let Some(toggle) = avoid_previous {
                session.set_avoid_previous_results(matches!(toggle, Toggle::On))?;
            }
            if let Some(view) = view {
                session.set_view_type(view)?;
            }
            let prefs = session.preferences();
            println!("avoid previous results: {}", prefs.avoid_previous_results);
            println!("view: {}", prefs.view_type);
        }
        Command::Export { file } => {
            let text = session.export_data()?;
            backup::write_export(&file, &text)?;
            println!("Exported {} lists to {}", session.lists().len(), file.display());
        }
        Command::Import { file, yes } => {
            let text = backup::read_import(&file)?;
            if !yes
                && !confirm(
                    "Importing replaces all your current lists and settings. This cannot be undone. Continue?",
                )
                .await?
            {
                println!("Import cancelled");
                return Ok(());
            }
            let count = session.import_data(&text)?;
            println!("Imported {} lists", count);
        }
        Command::Shell => shell(session).await?,
    }

    Ok(())
}

fn print_lists(session: &Session) {
    if session.lists().is_empty() {
        println!("No lists yet. Create one with `choosr new <name> [items...]`");
        return;
    }
    for list in session.lists() {
        println!("{} ({} items)", list.title(), list.len());
    }
}

fn resolve<'a>(session: &'a Session, query: &str) -> Result<&'a ChoiceList> {
    session
        .find(query)
        .ok_or_else(|| anyhow::anyhow!("No list named '{}'", query))
}

/// Returns false when there was nothing to pick
async fn pick_and_print(session: &Session, list_id: &str, delay: Duration) -> Result<bool> {
    let Some(list) = session.get(list_id) else {
        return Ok(false);
    };
    if list.is_empty() {
        println!("{} has no items to pick from", list.title());
        return Ok(false);
    }

    if !delay.is_zero() {
        print!("Choosing...");
        std::io::stdout().flush()?;
        sleep(delay).await;
        println!();
    }

    match session.pick(list_id)? {
        Some(pick) => {
            println!("→ {}", pick.item);
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

const SHELL_HELP: &str = "\
commands:
  lists              show every list
  use <list>         select a list
  <enter> | pick     pick from the selected list
  add <item>         add to the selected list
  remove <item>      remove from the selected list
  avoid on|off       toggle avoid-previous-results
  help               this text
  quit               leave";

async fn shell(session: &mut Session) -> Result<()> {
    let delay = Duration::from_millis(session.config().shuffle.choosing_delay_ms);
    let mut current: Option<String> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", SHELL_HELP);
    print_lists(session);

    loop {
        let prompt = current
            .as_deref()
            .and_then(|id| session.get(id))
            .map(|list| list.name.clone())
            .unwrap_or_default();
        print!("{}> ", prompt);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        debug!("Shell command: {:?} {:?}", command, rest);

        match command {
            "quit" | "exit" | "q" => break,
            "help" | "?" => println!("{}", SHELL_HELP),
            "lists" => print_lists(session),
            "use" => match session.find(rest) {
                Some(list) => {
                    println!("Using {} ({} items)", list.title(), list.len());
                    current = Some(list.id.clone());
                }
                None => println!("No list named '{}'", rest),
            },
            "" | "pick" => match &current {
                Some(id) => {
                    pick_and_print(session, id, delay).await?;
                }
                None => println!("Select a list first: use <list>"),
            },
            "add" | "remove" => {
                let Some(id) = current.clone() else {
                    println!("Select a list first: use <list>");
                    continue;
                };
                let changed = if command == "add" {
                    session.add_item(&id, rest)?
                } else {
                    session.remove_item(&id, rest)?
                };
                if !changed {
                    println!("Nothing changed");
                }
            }
            "avoid" => match rest {
                "on" => session.set_avoid_previous_results(true)?,
                "off" => session.set_avoid_previous_results(false)?,
                _ => println!("usage: avoid on|off"),
            },
            other => {
                warn!("Unknown shell command: {}", other);
                println!("Unknown command '{}', try help", other);
            }
        }
    }

    info!("Shell closed");
    Ok(())
}
