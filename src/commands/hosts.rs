use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;

use crate::cli::context::RunContext;
use crate::commands::resolve;
use crate::models::{Gender, Host, HostUpdate, is_reserved_host_name};
use crate::output::format::OutputMode;
use crate::output::json::{AvailabilityJson, to_json};
use crate::output::table;
use crate::query::filter::{HostSort, filter_hosts};
use crate::query::views::{assigned_visit_counts, available_hosts, unavailable_hosts};
use crate::store::Store;

fn find<'a>(store: &'a Store, name: &str) -> Result<&'a Host> {
    store
        .host(name)
        .with_context(|| format!("No host found matching \"{}\"", name))
}

pub fn list(store: &Store, search: Option<&str>, sort: HostSort, ctx: &RunContext) -> Result<()> {
    let hosts = filter_hosts(store.hosts(), search, sort, ctx.today);

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&hosts)),
        OutputMode::Tty => {
            if hosts.is_empty() {
                println!("No hosts found.");
                return Ok(());
            }
            let counts = assigned_visit_counts(store.visits());
            for host in &hosts {
                let assigned = counts.get(host.nom.as_str()).copied().unwrap_or(0);
                println!("{}", table::format_host_row(host, ctx.today, assigned));
            }
        }
    }

    Ok(())
}

pub fn show(store: &Store, name: &str, ctx: &RunContext) -> Result<()> {
    let host = find(store, name)?;
    ctx.output_mode.emit(host, || table::format_host_detail(host));
    Ok(())
}

pub fn add(
    store: &mut Store,
    name: &str,
    phone: &str,
    gender: Gender,
    address: Option<&str>,
    ctx: &RunContext,
) -> Result<()> {
    let host = Host {
        nom: name.trim().to_string(),
        telephone: phone.trim().to_string(),
        gender,
        address: address.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
        unavailability: Vec::new(),
        photo_url: None,
    };

    if !store.add_host(host.clone())? {
        if host.nom.is_empty() {
            bail!("A host needs a name");
        }
        if is_reserved_host_name(&host.nom) {
            bail!("\"{}\" is a reserved host value and cannot be used as a name", host.nom);
        }
        bail!("A host named \"{}\" already exists", host.nom);
    }

    ctx.output_mode
        .emit(&host, || format!("{} Added host {}", "✓".green(), host.nom.bold()));
    Ok(())
}

pub fn edit(
    store: &mut Store,
    name: &str,
    phone: Option<&str>,
    gender: Option<Gender>,
    address: Option<&str>,
    ctx: &RunContext,
) -> Result<()> {
    let nom = find(store, name)?.nom.clone();
    store.update_host(
        &nom,
        HostUpdate {
            telephone: phone.map(|p| p.trim().to_string()),
            gender,
            address: address.map(str::to_string),
            ..Default::default()
        },
    )?;

    let host = find(store, &nom)?;
    ctx.output_mode
        .emit(host, || format!("{} Updated host {}", "✓".green(), host.nom.bold()));
    Ok(())
}

pub fn remove(store: &mut Store, name: &str, ctx: &RunContext) -> Result<()> {
    let nom = find(store, name)?.nom.clone();
    let reassigned = store.delete_host(&nom)?;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Removed<'a> {
        nom: &'a str,
        reassigned_visits: usize,
    }
    ctx.output_mode.emit(
        &Removed {
            nom: &nom,
            reassigned_visits: reassigned,
        },
        || {
            let mut line = format!("{} Removed host {}", "✓".green(), nom.bold());
            if reassigned > 0 {
                line.push_str(&format!("; {} visit(s) now need a host", reassigned));
            }
            line
        },
    );
    Ok(())
}

pub fn block(
    store: &mut Store,
    name: &str,
    from: NaiveDate,
    to: NaiveDate,
    reason: Option<&str>,
    ctx: &RunContext,
) -> Result<()> {
    let nom = find(store, name)?.nom.clone();
    let period = store.add_unavailability(&nom, from, to, reason.map(str::to_string))?;

    ctx.output_mode.emit(&period, || {
        format!(
            "{} {} is unavailable {} → {} {}",
            "✓".green(),
            nom.bold(),
            table::format_date(period.start_date),
            table::format_date(period.end_date),
            format!("[{}]", period.id.chars().take(8).collect::<String>()).dimmed()
        )
    });
    Ok(())
}

pub fn unblock(store: &mut Store, name: &str, period_query: &str, ctx: &RunContext) -> Result<()> {
    let host = find(store, name)?;
    let nom = host.nom.clone();
    let period = resolve::period(&host.unavailability, period_query)?.clone();
    store.remove_unavailability(&nom, &period.id)?;

    ctx.output_mode.emit(&period, || {
        format!(
            "{} Removed unavailability {} → {} for {}",
            "✓".green(),
            table::format_date(period.start_date),
            table::format_date(period.end_date),
            nom.bold()
        )
    });
    Ok(())
}

pub fn available(store: &Store, date: NaiveDate, ctx: &RunContext) -> Result<()> {
    let availability = AvailabilityJson {
        date,
        available: available_hosts(store.hosts(), date),
        unavailable: unavailable_hosts(store.hosts(), date),
    };

    ctx.output_mode.emit(&availability, || {
        let mut lines = vec![format!("Hosts on {}:", table::format_date(date))];
        if availability.available.is_empty() {
            lines.push("  No host is available.".dimmed().to_string());
        }
        for host in &availability.available {
            lines.push(format!("  {} {} {}", "✓".green(), host.nom, host.telephone.dimmed()));
        }
        for host in &availability.unavailable {
            lines.push(format!("  {} {}", "✗".red(), host.nom.dimmed()));
        }
        lines.join("\n")
    });
    Ok(())
}
