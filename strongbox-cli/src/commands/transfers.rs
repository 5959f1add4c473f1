//! Transfers command - list the payout ledger

use anyhow::Result;

use super::{get_context, owner_or_caller};
use crate::output;

pub fn run(identity: Option<&str>, owner: Option<&str>, all: bool, json: bool) -> Result<()> {
    let owner = if all {
        None
    } else {
        Some(owner_or_caller(identity, owner)?)
    };
    let ctx = get_context()?;
    let transfers = ctx.repository.get_transfers(owner.as_ref())?;

    if json {
        return output::print_json(&transfers);
    }

    if transfers.is_empty() {
        println!("No transfers found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Account", "Recipient", "Kind", "Amount"]);
    for t in &transfers {
        table.add_row(vec![
            output::format_time(t.executed_at),
            t.owner.to_string(),
            t.recipient.to_string(),
            t.kind.as_str().to_string(),
            output::format_amount(t.amount, &ctx.config.units),
        ]);
    }
    println!("{}", table);
    Ok(())
}
