use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;

use crate::cli::context::RunContext;
use crate::commands::visits::print_visits;
use crate::output::format::OutputMode;
use crate::output::json::{DashboardJson, NeedsHostJson, to_json};
use crate::output::table;
use crate::query::calendar::month_view;
use crate::query::dashboard::{quick_stats, timeline, top_hosts, top_speakers};
use crate::query::dates::start_of_month;
use crate::query::search::search as search_store;
use crate::query::views::{available_hosts, needing_host, upcoming as upcoming_visits};
use crate::store::Store;

pub fn upcoming(store: &Store, ctx: &RunContext) -> Result<()> {
    let visits = upcoming_visits(store.visits(), ctx.today);
    print_visits(&visits, ctx.output_mode, "No upcoming visits.");
    Ok(())
}

pub fn calendar(store: &Store, month: Option<NaiveDate>, ctx: &RunContext) -> Result<()> {
    let month = start_of_month(month.unwrap_or(ctx.today));
    let days = month_view(store.visits(), store.speakers(), month);
    ctx.output_mode.emit(&days, || table::format_calendar(month, &days));
    Ok(())
}

pub fn dashboard(store: &Store, ctx: &RunContext) -> Result<()> {
    let top = ctx.config.top_count;
    let dashboard = DashboardJson {
        stats: quick_stats(
            store.speakers(),
            store.hosts(),
            store.visits(),
            store.archived_visits(),
            ctx.today,
        ),
        top_speakers: top_speakers(store.archived_visits(), store.speakers(), top),
        top_hosts: top_hosts(store.archived_visits(), store.hosts(), top),
        timeline: timeline(store.visits(), ctx.today, ctx.config.timeline_limit),
    };

    ctx.output_mode.emit(&dashboard, || {
        table::format_dashboard(
            &dashboard.stats,
            &dashboard.top_speakers,
            &dashboard.top_hosts,
            &dashboard.timeline,
        )
    });
    Ok(())
}

pub fn needs_host(store: &Store, months: Option<u32>, ctx: &RunContext) -> Result<()> {
    let months = months.unwrap_or(ctx.config.needs_host_months);
    let visits = needing_host(store.visits(), ctx.today, &ctx.config.home_congregation, months);

    match ctx.output_mode {
        OutputMode::Json => {
            let entries: Vec<NeedsHostJson> = visits
                .iter()
                .map(|&v| NeedsHostJson {
                    visit: v,
                    available_hosts: available_hosts(store.hosts(), v.visit_date)
                        .into_iter()
                        .map(|h| h.nom.as_str())
                        .collect(),
                })
                .collect();
            println!("{}", to_json(&entries));
        }
        OutputMode::Tty => {
            if visits.is_empty() {
                println!("Every visit in the next {} month(s) has a host.", months);
                return Ok(());
            }
            for visit in &visits {
                println!("{}", table::format_visit_row(visit));
                let free: Vec<&str> = available_hosts(store.hosts(), visit.visit_date)
                    .into_iter()
                    .map(|h| h.nom.as_str())
                    .collect();
                if free.is_empty() {
                    println!("  {}", "no host available".red());
                } else {
                    println!("  {} {}", "available:".dimmed(), free.join(", "));
                }
            }
        }
    }
    Ok(())
}

pub fn search(store: &Store, term: &str, ctx: &RunContext) -> Result<()> {
    let results = search_store(term, store.speakers(), store.visits(), store.hosts());
    ctx.output_mode
        .emit(&results, || table::format_search_results(term, &results));
    Ok(())
}
