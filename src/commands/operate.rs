use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use dao_treasury::{DaoService, Request, Response};
use dao_treasury::service::DEFAULT_QUEUE_DEPTH;

use super::OpenDao;

/// Apply one mutating request to the persisted DAO.
///
/// The state file stays locked from load until the result is saved and is
/// only rewritten when the request succeeds.
pub async fn execute(state_path: &Path, request: Request) -> Result<()> {
    let path = state_path.to_path_buf();
    let open = tokio::task::spawn_blocking(move || OpenDao::open(&path)).await??;
    let (handle, task) = DaoService::spawn(open.dao.clone(), DEFAULT_QUEUE_DEPTH);

    let operation = request.operation();
    let caller = request.caller().clone();
    let result = handle.submit(request).await;

    drop(handle);
    task.await?;

    match result {
        Ok(response) => {
            open.save()?;
            println!("{} {} by {}", "✓".bright_green(), operation, caller.to_string().bright_yellow());
            match response {
                Response::ProposalCreated { proposal_id } => {
                    println!("  Proposal ID: {}", proposal_id.to_string().bright_cyan());
                }
                Response::Voted { weight } => {
                    println!("  Vote weight: {}", weight.to_string().bright_cyan());
                }
                Response::Done => {}
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {} rejected", "❌".bright_red(), operation);
            println!("  Reason:   {}", e);
            println!("  Category: {}", e.category().to_string().yellow());
            Err(e.into())
        }
    }
}
