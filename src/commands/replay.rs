use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dao_treasury::{
    Address, Dao, DaoSettings, DaoSnapshot, InMemoryBank, ManualClock, Request, Response, Timestamp,
};

use super::CliError;

/// Deterministic sequence of operations against a fresh DAO
#[derive(Debug, Deserialize)]
pub struct ReplayScript {
    pub admin: Address,
    #[serde(default)]
    pub start: Timestamp,
    /// Addresses that refuse incoming transfers
    #[serde(default)]
    pub rejecting: Vec<Address>,
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Advance { advance_secs: i64 },
    Request(Request),
}

pub fn parse_script(contents: &str) -> Result<ReplayScript> {
    serde_json::from_str(contents).map_err(|e| CliError::InvalidScript(e.to_string()).into())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub applied: usize,
    pub rejected: usize,
}

/// Run `script` on a manual clock. With `strict`, stop at the first rejection.
pub fn run(
    settings: &DaoSettings,
    script: ReplayScript,
    strict: bool,
) -> Result<(ReplayOutcome, DaoSnapshot)> {
    let clock = Arc::new(ManualClock::new(script.start));
    let bank = Arc::new(InMemoryBank::new());
    for address in &script.rejecting {
        bank.reject(address);
    }
    let dao = Dao::new(script.admin, settings, clock.clone(), bank.clone())?;
    let mut outcome = ReplayOutcome::default();

    for (index, step) in script.steps.into_iter().enumerate() {
        match step {
            ScriptStep::Advance { advance_secs } => {
                clock.advance(advance_secs);
                println!("{:>4}  {} +{}s", index, "⏱".dimmed(), advance_secs);
            }
            ScriptStep::Request(request) => match dao.apply(&request) {
                Ok(response) => {
                    outcome.applied += 1;
                    let detail = match response {
                        Response::ProposalCreated { proposal_id } => format!(" (proposal {})", proposal_id),
                        Response::Voted { weight } => format!(" (weight {})", weight),
                        Response::Done => String::new(),
                    };
                    println!(
                        "{:>4}  {} {} by {}{}",
                        index,
                        "✓".bright_green(),
                        request.operation(),
                        request.caller(),
                        detail
                    );
                }
                Err(e) => {
                    outcome.rejected += 1;
                    println!(
                        "{:>4}  {} {} by {}: {}",
                        index,
                        "✗".bright_red(),
                        request.operation(),
                        request.caller(),
                        e
                    );
                    if strict {
                        return Err(e).with_context(|| format!("Replay stopped at step {}", index));
                    }
                }
            },
        }
    }

    let snapshot = DaoSnapshot {
        state: dao.snapshot()?,
        bank: bank.state(),
    };
    Ok((outcome, snapshot))
}

pub async fn execute(
    settings: &DaoSettings,
    script_path: &Path,
    output: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let contents = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read replay script {}", script_path.display()))?;
    let script = parse_script(&contents)?;

    println!("{}", format!("Replaying {}", script_path.display()).bright_cyan());
    let (outcome, snapshot) = run(settings, script, strict)?;

    println!();
    println!(
        "  Applied: {}  Rejected: {}",
        outcome.applied.to_string().bright_green(),
        outcome.rejected.to_string().yellow()
    );
    println!(
        "  Total shares: {}  Available: {}  Held: {}",
        snapshot.state.total_shares(),
        snapshot.state.available_funds(),
        snapshot.state.held_balance()
    );

    if let Some(path) = output {
        snapshot.save(&path)?;
        println!("  State written to {}", path.display().to_string().dimmed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DaoSettings {
        DaoSettings {
            contribution_duration_secs: 10,
            vote_duration_secs: 10,
            quorum_percent: 50,
            burn_on_redeem: false,
        }
    }

    const SCRIPT: &str = r#"{
        "admin": "owner",
        "steps": [
            {"op": "contribute", "caller": "a", "amount": 1},
            {"op": "contribute", "caller": "b", "amount": 1},
            {"op": "contribute", "caller": "c", "amount": 1},
            {"op": "create_proposal", "caller": "a", "name": "DAI", "amount": 1, "recipient": "payee"},
            {"op": "vote", "caller": "a", "proposal_id": 0},
            {"op": "vote", "caller": "b", "proposal_id": 0},
            {"op": "execute_proposal", "caller": "owner", "proposal_id": 0},
            {"advance_secs": 11},
            {"op": "execute_proposal", "caller": "owner", "proposal_id": 0}
        ]
    }"#;

    #[test]
    fn test_parse_script_steps() {
        let script = parse_script(SCRIPT).unwrap();
        assert_eq!(script.steps.len(), 9);
        assert!(matches!(script.steps[7], ScriptStep::Advance { advance_secs: 11 }));
        assert!(matches!(
            script.steps[0],
            ScriptStep::Request(Request::Contribute { amount: 1, .. })
        ));
    }

    #[test]
    fn test_parse_invalid_script() {
        let err = parse_script(r#"{"steps": 3}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid replay script"));
    }

    #[test]
    fn test_replay_counts_rejections() {
        let script = parse_script(SCRIPT).unwrap();
        let (outcome, snapshot) = run(&settings(), script, false).unwrap();

        // The first execute is rejected while voting is still open
        assert_eq!(outcome, ReplayOutcome { applied: 8, rejected: 1 });
        assert_eq!(snapshot.state.held_balance(), 2);
        assert_eq!(snapshot.bank.balances.get(&Address::from("payee")), Some(&1));
    }

    #[test]
    fn test_strict_replay_stops() {
        let script = parse_script(SCRIPT).unwrap();
        assert!(run(&settings(), script, true).is_err());
    }
}
