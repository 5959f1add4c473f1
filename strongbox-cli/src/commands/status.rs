//! Status command - custody summary

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        return output::print_json(&status);
    }

    println!("{}", "Custody Status".bold());
    println!();

    let policy = ctx.custody_service.policy();
    let mut table = output::create_table();
    table.add_row(vec!["Accounts".to_string(), status.total_accounts.to_string()]);
    table.add_row(vec!["Frozen".to_string(), status.frozen_accounts.to_string()]);
    table.add_row(vec![
        "Pending withdrawals".to_string(),
        status.pending_withdrawals.to_string(),
    ]);
    table.add_row(vec![
        "Total in custody".to_string(),
        output::format_amount(status.total_custody, &ctx.config.units),
    ]);
    table.add_row(vec![
        "Transfers".to_string(),
        ctx.repository.get_transfer_count()?.to_string(),
    ]);
    table.add_row(vec![
        "Timelock window".to_string(),
        format!(
            "{} to {}",
            output::format_duration(policy.min_delay_secs),
            output::format_duration(policy.max_delay_secs)
        ),
    ]);
    table.add_row(vec![
        "Database".to_string(),
        format!(
            "{} ({})",
            ctx.repository.db_path().display(),
            output::format_size(ctx.repository.get_db_size().unwrap_or(0))
        ),
    ]);
    println!("{}", table);
    Ok(())
}
