use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::path::Path;

use dao_treasury::{Clock, DaoState, ProposalId, ProposalStatus, SystemClock};

use super::{format_time, read_snapshot};

fn status_label(status: ProposalStatus) -> ColoredString {
    match status {
        ProposalStatus::Open => "Open".bright_cyan(),
        ProposalStatus::Executable => "Executable".bright_green(),
        ProposalStatus::Unexecutable => "Unexecutable".yellow(),
        ProposalStatus::Executed => "Executed".dimmed(),
    }
}

/// Print the treasury overview
pub async fn execute(state_path: &Path) -> Result<()> {
    let snapshot = read_snapshot(state_path)?;
    let state: &DaoState = &snapshot.state;
    let now = SystemClock.now();

    println!("{}", "═══════════════════════════════════════════════════".bright_cyan());
    println!("{}", "        DAO Treasury Status".bright_cyan().bold());
    println!("{}", "═══════════════════════════════════════════════════".bright_cyan());
    println!();
    println!("  Admin:             {}", state.admin().to_string().bright_yellow());
    let window = if now <= state.contribution_end() {
        "open".bright_green()
    } else {
        "closed".yellow()
    };
    println!(
        "  Contributions end: {} ({})",
        format_time(state.contribution_end()),
        window
    );
    println!("  Voting window:     {}s", state.vote_time());
    println!("  Quorum:            {}%", state.quorum_percent());

    println!();
    println!("{}", "═══ Treasury ═══".bright_cyan());
    println!("  Held:      {}", state.held_balance());
    println!("  Available: {}", state.available_funds().to_string().bright_green());
    println!("  Reserved:  {}", state.reserved_funds());

    println!();
    println!("{}", "═══ Shares ═══".bright_cyan());
    println!("  Total shares: {}", state.total_shares());
    if state.ledger().redeemed_shares() > 0 {
        println!("  Redeemed:     {}", state.ledger().redeemed_shares());
    }
    for (address, account) in state.ledger().accounts() {
        if account.is_investor {
            println!("  {:<24} {}", address.to_string(), account.shares);
        }
    }

    println!();
    println!("{}", "═══ Proposals ═══".bright_cyan());
    if state.next_proposal_id() == 0 {
        println!("  {}", "No proposals yet".dimmed());
    }
    for proposal in state.proposals() {
        let status = state.proposal_status(proposal.id, now)?;
        println!(
            "  #{:<4} {:<20} {:>10} → {:<16} votes {:<8} {}",
            proposal.id,
            proposal.name,
            proposal.amount,
            proposal.recipient.to_string(),
            proposal.votes,
            status_label(status)
        );
    }

    let payouts = &snapshot.bank.balances;
    if !payouts.is_empty() {
        println!();
        println!("{}", "═══ Payouts ═══".bright_cyan());
        for (address, amount) in payouts {
            println!("  {:<24} {}", address.to_string(), amount);
        }
    }

    Ok(())
}

/// Print one proposal in detail
pub async fn proposal(state_path: &Path, id: ProposalId) -> Result<()> {
    let state = read_snapshot(state_path)?.state;
    let now = SystemClock.now();
    let proposal = state.proposal(id)?;
    let status = state.proposal_status(id, now)?;

    println!("{}", format!("Proposal #{}", proposal.id).bright_cyan().bold());
    println!("  Name:      {}", proposal.name.bright_white());
    println!("  Amount:    {}", proposal.amount);
    println!("  Recipient: {}", proposal.recipient.to_string().bright_yellow());
    println!("  Proposer:  {}", proposal.proposer);
    println!("  Created:   {}", format_time(proposal.created_at));
    println!("  Ends:      {}", format_time(proposal.end));
    println!(
        "  Votes:     {} of {} shares",
        proposal.votes,
        proposal.quorum_denominator(state.total_shares())
    );
    println!("  Status:    {}", status_label(status));

    Ok(())
}
