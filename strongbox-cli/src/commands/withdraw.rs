//! Withdraw commands - the timelocked initiate / cancel / complete flow

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use strongbox_core::{StrongboxContext, WithdrawalDetails, WithdrawalStatus};

use super::{caller, execute, get_context, owner_or_caller, parse_amount};
use crate::output;

#[derive(Subcommand)]
pub enum WithdrawCommands {
    /// Start a withdrawal, replacing any previous request
    Initiate {
        /// Amount in display units
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cancel the pending withdrawal
    Cancel {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Complete the pending withdrawal inside its window
    Complete {
        /// Must equal the pending amount
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(identity: Option<&str>, command: WithdrawCommands) -> Result<()> {
    let owner = caller(identity)?;
    let ctx = get_context()?;

    match command {
        WithdrawCommands::Initiate { amount, json } => {
            let amount = parse_amount(&ctx, &amount)?;
            let slot = execute("withdraw", "initiate_withdrawal", json, || {
                ctx.custody_service.initiate_withdrawal(&owner, amount)
            })?;
            if json {
                return output::print_json(&slot);
            }
            output::success(&format!(
                "✓ Withdrawal of {} initiated",
                output::format_amount(slot.amount, &ctx.config.units)
            ));
            print_window(&ctx, &slot);
        }
        WithdrawCommands::Cancel { json } => {
            let slot = execute("withdraw", "cancel_withdrawal", json, || {
                ctx.custody_service.cancel_withdrawal(&owner)
            })?;
            if json {
                return output::print_json(&slot);
            }
            output::success(&format!(
                "✓ Withdrawal of {} cancelled",
                output::format_amount(slot.amount, &ctx.config.units)
            ));
        }
        WithdrawCommands::Complete { amount, json } => {
            let amount = parse_amount(&ctx, &amount)?;
            let payout = execute("withdraw", "complete_withdrawal", json, || {
                ctx.custody_service.complete_withdrawal(&owner, amount)
            })?;
            if json {
                return output::print_json(&payout);
            }
            output::success(&format!(
                "✓ Sent {} to {}",
                output::format_amount(payout.amount, &ctx.config.units),
                payout.recipient
            ));
            println!("  Transfer: {}", payout.id.to_string().dimmed());
        }
    }
    Ok(())
}

/// Show the withdrawal slot of an account
pub fn show(identity: Option<&str>, owner: Option<&str>, json: bool) -> Result<()> {
    let owner = owner_or_caller(identity, owner)?;
    let ctx = get_context()?;
    let slot = execute("withdrawal", "get_withdrawal_details", json, || {
        ctx.custody_service.get_withdrawal_details(&owner)
    })?;

    if json {
        return output::print_json(&slot);
    }

    let Some(slot) = slot else {
        println!("{}", "No withdrawal has been initiated".dimmed());
        return Ok(());
    };

    let mut table = output::create_table();
    table.add_row(vec!["Status".to_string(), output::format_status(slot.status)]);
    table.add_row(vec![
        "Amount".to_string(),
        output::format_amount(slot.amount, &ctx.config.units),
    ]);
    table.add_row(vec!["Initiated".to_string(), output::format_time(slot.initiated_at)]);
    println!("{}", table);

    if slot.status == WithdrawalStatus::Pending {
        print_window(&ctx, &slot);
    }
    Ok(())
}

fn print_window(ctx: &StrongboxContext, slot: &WithdrawalDetails) {
    let policy = ctx.custody_service.policy();
    let opens = policy.opens_at(slot.initiated_at);
    let closes = policy.closes_at(slot.initiated_at);
    println!(
        "  Completion window: {} to {}",
        output::format_time(opens),
        output::format_time(closes)
    );
    let now = chrono::Utc::now().timestamp();
    if now < opens {
        println!(
            "  {}",
            format!("Opens in {}", output::format_duration(opens - now)).dimmed()
        );
    } else if now > closes {
        println!("  {}", "Window has closed; initiate again".yellow());
    }
}
