//! Recover command - emergency withdrawal to the backup address

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use super::{caller, execute, get_context, parse_amount};
use crate::output;

pub fn run(identity: Option<&str>, amount: &str, force: bool, json: bool) -> Result<()> {
    let owner = caller(identity)?;
    let ctx = get_context()?;
    let amount = parse_amount(&ctx, amount)?;

    if !force && !json {
        let details = ctx.custody_service.get_account_details(&owner)?;
        output::warning(&format!(
            "\nThis will send {} to backup address {}.",
            output::format_amount(amount, &ctx.config.units),
            details.backup_address
        ));
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let payout = execute("recover", "withdraw_to_backup", json, || {
        ctx.custody_service.withdraw_to_backup(&owner, amount)
    })?;

    if json {
        return output::print_json(&payout);
    }
    output::success(&format!(
        "✓ Sent {} to backup address {}",
        output::format_amount(payout.amount, &ctx.config.units),
        payout.recipient
    ));
    println!("  Transfer: {}", payout.id.to_string().dimmed());
    Ok(())
}
