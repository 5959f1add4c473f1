//! Account commands - create, deposit, freeze, show

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use super::{caller, execute, get_context, owner_or_caller, parse_amount};
use crate::output;

pub fn create(identity: Option<&str>, backup: &str, json: bool) -> Result<()> {
    let owner = caller(identity)?;
    let backup = strongbox_core::Identity::new(backup)?;
    let ctx = get_context()?;

    let account = execute("create", "create_account", json, || {
        ctx.custody_service.create_account(&owner, backup)
    })?;

    if json {
        return output::print_json(account.details());
    }
    output::success(&format!("✓ Account created for {}", account.owner));
    println!("  Backup address: {}", account.backup_address);
    Ok(())
}

pub fn deposit(identity: Option<&str>, amount: &str, json: bool) -> Result<()> {
    let owner = caller(identity)?;
    let ctx = get_context()?;
    let amount = parse_amount(&ctx, amount)?;

    let account = execute("deposit", "deposit", json, || {
        ctx.custody_service.deposit(&owner, amount)
    })?;

    if json {
        return output::print_json(account.details());
    }
    output::success(&format!(
        "✓ Deposited {}",
        output::format_amount(amount, &ctx.config.units)
    ));
    println!(
        "  Balance: {}",
        output::format_amount(account.balance, &ctx.config.units)
    );
    Ok(())
}

pub fn freeze(identity: Option<&str>, force: bool, json: bool) -> Result<()> {
    let owner = caller(identity)?;
    let ctx = get_context()?;

    if !force && !json {
        output::warning(&format!("\nThis will permanently freeze the account of {}.", owner));
        println!(
            "{}\n",
            "Deposits and timelocked withdrawals stop; only recovery to the backup address remains."
                .dimmed()
        );
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let changed = execute("freeze", "freeze_account", json, || {
        ctx.custody_service.freeze_account(&owner)
    })?;

    if json {
        return output::print_json(serde_json::json!({ "frozen": true, "changed": changed }));
    }
    if changed {
        output::success("✓ Account frozen");
    } else {
        println!("{}", "Account was already frozen".dimmed());
    }
    Ok(())
}

pub fn show(identity: Option<&str>, owner: Option<&str>, json: bool) -> Result<()> {
    let owner = owner_or_caller(identity, owner)?;
    let ctx = get_context()?;
    let details = execute("show", "get_account_details", json, || {
        ctx.custody_service.get_account_details(&owner)
    })?;

    if json {
        return output::print_json(&details);
    }

    println!("{}", format!("Account {}", owner).bold());
    let mut table = output::create_table();
    table.add_row(vec![
        "Balance".to_string(),
        output::format_amount(details.balance, &ctx.config.units),
    ]);
    table.add_row(vec!["Backup address".to_string(), details.backup_address.to_string()]);
    table.add_row(vec![
        "Frozen".to_string(),
        if details.frozen {
            "yes".red().to_string()
        } else {
            "no".to_string()
        },
    ]);
    println!("{}", table);
    Ok(())
}
