//! The `kbv sync` command: pull the visit schedule from the configured Google
//! spreadsheet and reconcile it with the local store.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use crate::cli::context::RunContext;
use crate::output::format::OutputMode;
use crate::output::json::to_json;
use crate::output::progress::create_spinner;
use crate::output::table;
use crate::sheets::{SheetSource, SheetsClient, SyncPlan, collect_rows, plan};
use crate::store::{Store, SyncStats};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncJson<'a> {
    dry_run: bool,
    plan: &'a SyncPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<SyncStats>,
}

/// Run the sync command
pub fn run(store: &mut Store, dry_run: bool, ctx: &RunContext) -> Result<()> {
    let client = SheetsClient::new(store.google_sheet_id(), store.google_api_key())?;
    sync_from(store, &client, dry_run, ctx)?;
    Ok(())
}

/// Reconcile `store` with the rows of `source`.
pub fn sync_from(store: &mut Store, source: &dyn SheetSource, dry_run: bool, ctx: &RunContext) -> Result<SyncStats> {
    debug!("Starting sheet sync (dry_run={})", dry_run);

    let spinner = create_spinner("Reading the spreadsheet...");
    let rows = collect_rows(source);
    spinner.finish_and_clear();
    let rows = rows.context("Failed to read the schedule from Google Sheets")?;
    eprintln!("[kbv] {} schedule rows read", rows.len());

    let plan = plan(
        &rows,
        store.speakers(),
        store.visits(),
        ctx.today,
        &ctx.config.default_visit_time,
    );

    let applied = if dry_run || plan.is_empty() {
        None
    } else {
        Some(store.apply_sync_plan(&plan)?)
    };

    match ctx.output_mode {
        OutputMode::Json => println!(
            "{}",
            to_json(&SyncJson {
                dry_run,
                plan: &plan,
                applied,
            })
        ),
        OutputMode::Tty => {
            println!("{}", table::format_sync_plan(&plan));
            if let Some(stats) = &applied {
                println!("{}", table::format_sync_stats(stats));
            } else if dry_run && !plan.is_empty() {
                println!("Dry run: nothing was written.");
            }
        }
    }

    Ok(applied.unwrap_or_default())
}
