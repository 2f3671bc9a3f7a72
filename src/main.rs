mod cli;
mod commands;
mod config;
mod db;
mod models;
mod output;
mod platform;
mod query;
mod sheets;
mod store;

use anyhow::{Context, Result};
use clap::Parser;

use cli::args::{
    ArchiveAction, Cli, Commands, HostAction, SettingsAction, SpeakerAction, TemplateAction, VisitAction,
};
use cli::context::RunContext;
use commands::speakers::SpeakerEdit;
use commands::visits::{ScheduleOptions, VisitEdit};
use config::AppConfig;
use store::Store;

fn main() -> Result<()> {
    setup_broken_pipe_handling();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::load()?;
    let ctx = RunContext::from_args(cli.json, cli.no_color, cli.as_of, config)?;

    let db_path = db::connection::resolve_db_path(cli.db.as_deref())?;
    let conn = db::connection::open_db_at_path(&db_path)?;
    let mut store = Store::open(conn).context("Failed to load stored data")?;

    match &cli.command {
        // === Records ===
        Commands::Speakers { action } => match action {
            SpeakerAction::List {
                search,
                congregation,
                sort,
            } => commands::speakers::list(&store, search.as_deref(), congregation.as_deref(), *sort, &ctx)?,
            SpeakerAction::Show { speaker } => commands::speakers::show(&store, speaker, &ctx)?,
            SpeakerAction::Add {
                name,
                congregation,
                phone,
                notes,
            } => commands::speakers::add(&mut store, name, congregation, phone.as_deref(), notes.as_deref(), &ctx)?,
            SpeakerAction::Edit {
                speaker,
                name,
                congregation,
                phone,
                notes,
            } => commands::speakers::edit(
                &mut store,
                speaker,
                SpeakerEdit {
                    name: name.as_deref(),
                    congregation: congregation.as_deref(),
                    phone: phone.as_deref(),
                    notes: notes.as_deref(),
                },
                &ctx,
            )?,
            SpeakerAction::Remove { speaker } => commands::speakers::remove(&mut store, speaker, &ctx)?,
        },

        Commands::Hosts { action } => match action {
            HostAction::List { search, sort } => commands::hosts::list(&store, search.as_deref(), *sort, &ctx)?,
            HostAction::Show { host } => commands::hosts::show(&store, host, &ctx)?,
            HostAction::Add {
                name,
                phone,
                gender,
                address,
            } => commands::hosts::add(&mut store, name, phone, *gender, address.as_deref(), &ctx)?,
            HostAction::Edit {
                host,
                phone,
                gender,
                address,
            } => commands::hosts::edit(&mut store, host, phone.as_deref(), *gender, address.as_deref(), &ctx)?,
            HostAction::Remove { host } => commands::hosts::remove(&mut store, host, &ctx)?,
            HostAction::Block { host, from, to, reason } => {
                commands::hosts::block(&mut store, host, *from, *to, reason.as_deref(), &ctx)?
            }
            HostAction::Unblock { host, period } => commands::hosts::unblock(&mut store, host, period, &ctx)?,
            HostAction::Available { date } => commands::hosts::available(&store, *date, &ctx)?,
        },

        Commands::Visits { action } => match action {
            VisitAction::List { status, window } => commands::visits::list(&store, *status, *window, &ctx)?,
            VisitAction::Show { visit } => commands::visits::show(&store, visit, &ctx)?,
            VisitAction::Schedule {
                speaker,
                date,
                time,
                host,
                location,
                status,
                talk,
                theme,
            } => commands::visits::schedule(
                &mut store,
                speaker,
                *date,
                ScheduleOptions {
                    time: time.as_deref(),
                    host: host.as_deref(),
                    location: *location,
                    status: *status,
                    talk: talk.as_deref(),
                    theme: theme.as_deref(),
                },
                &ctx,
            )?,
            VisitAction::Edit {
                visit,
                date,
                time,
                host,
                location,
                status,
                talk,
                theme,
                accommodation,
                meals,
                notes,
            } => commands::visits::edit(
                &mut store,
                visit,
                VisitEdit {
                    date: *date,
                    time: time.as_deref(),
                    host: host.as_deref(),
                    location: *location,
                    status: *status,
                    talk: talk.as_deref(),
                    theme: theme.as_deref(),
                    accommodation: accommodation.as_deref(),
                    meals: meals.as_deref(),
                    notes: notes.as_deref(),
                },
                &ctx,
            )?,
            VisitAction::Attach { visit, file } => commands::visits::attach(&mut store, visit, file, &ctx)?,
            VisitAction::Complete { visit } => commands::visits::complete(&mut store, visit, &ctx)?,
            VisitAction::Remove { visit } => commands::visits::remove(&mut store, visit, &ctx)?,
            VisitAction::Log { visit, message, role } => {
                commands::visits::log(&mut store, visit, *message, *role, &ctx)?
            }
        },

        Commands::Archive { action } => match action {
            ArchiveAction::List => commands::visits::archive_list(&store, &ctx)?,
            ArchiveAction::Remove { visit } => commands::visits::archive_remove(&mut store, visit, &ctx)?,
        },

        // === Views ===
        Commands::Upcoming => commands::views::upcoming(&store, &ctx)?,
        Commands::Calendar { month } => commands::views::calendar(&store, *month, &ctx)?,
        Commands::Dashboard => commands::views::dashboard(&store, &ctx)?,
        Commands::NeedsHost { months } => commands::views::needs_host(&store, *months, &ctx)?,
        Commands::Search { term } => commands::views::search(&store, term, &ctx)?,

        // === Settings and data ===
        Commands::Templates { action } => match action {
            TemplateAction::List => commands::templates::list(&store, &ctx)?,
            TemplateAction::Set {
                language,
                message,
                role,
                text,
            } => commands::templates::set(&mut store, *language, *message, *role, text, &ctx)?,
            TemplateAction::Reset { language, message, role } => {
                commands::templates::reset(&mut store, *language, *message, *role, &ctx)?
            }
            TemplateAction::HostRequestSet { language, text } => {
                commands::templates::host_request_set(&mut store, *language, text, &ctx)?
            }
            TemplateAction::HostRequestReset { language } => {
                commands::templates::host_request_reset(&mut store, *language, &ctx)?
            }
        },

        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show(&store, &ctx)?,
            SettingsAction::SetSheet { id } => commands::settings::set_sheet(&mut store, id)?,
            SettingsAction::SetKey { key } => commands::settings::set_key(&mut store, key)?,
        },

        Commands::Sync { dry_run } => commands::sync::run(&mut store, *dry_run, &ctx)?,
        Commands::Export { output } => commands::data::export(&store, output.as_deref())?,
        Commands::Import { file } => commands::data::import(&mut store, file, &ctx)?,
        Commands::Reset { yes } => commands::data::reset(&mut store, *yes)?,
        Commands::Info => commands::info::run(&store, &db_path, &ctx)?,
    }

    Ok(())
}

/// Initialize logging based on the `--verbose` flag or `KBV_LOG` env var.
///
/// - `KBV_LOG` env var: full filter control (e.g. `KBV_LOG=kbv::sheets=trace`)
/// - `--verbose`: sets `kbv` crate to `Debug` level
/// - Otherwise: `Warn` level only (effectively silent)
fn init_logging(verbose: bool) {
    let env_var = std::env::var("KBV_LOG").ok();

    let mut builder = env_logger::Builder::new();
    builder.format_target(true);
    builder.format_module_path(false);

    if let Some(ref filter) = env_var {
        builder.parse_filters(filter);
    } else if verbose {
        builder.filter_module("kbv", log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.init();
}

/// Handle broken pipe gracefully instead of panicking.
///
/// When output is piped to a process that exits early (e.g., `kbv visits list --json | head -1`),
/// Rust's `println!` panics because the runtime sets SIGPIPE to SIG_IGN. This function:
/// - On Unix: resets SIGPIPE to default behavior so the OS terminates the process cleanly
/// - On all platforms: installs a panic hook that exits silently on stdout pipe failures,
///   as a fallback (and the primary handler on Windows where there's no SIGPIPE)
fn setup_broken_pipe_handling() {
    #[cfg(unix)]
    unsafe {
        // SIGPIPE = 13, SIG_DFL = 0 (POSIX constants, stable across all Unix platforms)
        unsafe extern "C" {
            fn signal(sig: i32, handler: usize) -> usize;
        }
        signal(13, 0);
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info
            .payload()
            .downcast_ref::<String>()
            .map(|s| s.as_str())
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("");

        if msg.contains("failed printing to stdout") {
            std::process::exit(0);
        }

        default_hook(info);
    }));
}
