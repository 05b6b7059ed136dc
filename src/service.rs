//! DAO command service
//!
//! A tokio task that owns a `Dao` and applies `Request`s from an mpsc queue
//! strictly in arrival order. Each command carries a oneshot reply channel.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dao::Dao;
use crate::error::{DaoError, DaoResult};
use crate::types::{Address, Amount, ProposalId};

/// Default depth of the command queue
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// One mutating DAO operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Contribute {
        caller: Address,
        amount: Amount,
    },
    RedeemShare {
        caller: Address,
        amount: Amount,
    },
    TransferShare {
        caller: Address,
        amount: Amount,
        to: Address,
    },
    CreateProposal {
        caller: Address,
        name: String,
        amount: Amount,
        recipient: Address,
    },
    Vote {
        caller: Address,
        proposal_id: ProposalId,
    },
    ExecuteProposal {
        caller: Address,
        proposal_id: ProposalId,
    },
    WithdrawEther {
        caller: Address,
        amount: Amount,
        to: Address,
    },
}

impl Request {
    pub fn caller(&self) -> &Address {
        match self {
            Request::Contribute { caller, .. }
            | Request::RedeemShare { caller, .. }
            | Request::TransferShare { caller, .. }
            | Request::CreateProposal { caller, .. }
            | Request::Vote { caller, .. }
            | Request::ExecuteProposal { caller, .. }
            | Request::WithdrawEther { caller, .. } => caller,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Request::Contribute { .. } => "contribute",
            Request::RedeemShare { .. } => "redeem_share",
            Request::TransferShare { .. } => "transfer_share",
            Request::CreateProposal { .. } => "create_proposal",
            Request::Vote { .. } => "vote",
            Request::ExecuteProposal { .. } => "execute_proposal",
            Request::WithdrawEther { .. } => "withdraw_ether",
        }
    }
}

/// Outcome of a successful `Request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Done,
    ProposalCreated { proposal_id: ProposalId },
    Voted { weight: Amount },
}

impl Dao {
    /// Apply a single request synchronously
    pub fn apply(&self, request: &Request) -> DaoResult<Response> {
        match request {
            Request::Contribute { caller, amount } => {
                self.contribute(caller, *amount).map(|()| Response::Done)
            }
            Request::RedeemShare { caller, amount } => {
                self.redeem_share(caller, *amount).map(|()| Response::Done)
            }
            Request::TransferShare { caller, amount, to } => self
                .transfer_share(caller, *amount, to)
                .map(|()| Response::Done),
            Request::CreateProposal {
                caller,
                name,
                amount,
                recipient,
            } => self
                .create_proposal(caller, name.clone(), *amount, recipient)
                .map(|proposal_id| Response::ProposalCreated { proposal_id }),
            Request::Vote {
                caller,
                proposal_id,
            } => self
                .vote(caller, *proposal_id)
                .map(|weight| Response::Voted { weight }),
            Request::ExecuteProposal {
                caller,
                proposal_id,
            } => self
                .execute_proposal(caller, *proposal_id)
                .map(|()| Response::Done),
            Request::WithdrawEther { caller, amount, to } => self
                .withdraw_ether(caller, *amount, to)
                .map(|()| Response::Done),
        }
    }
}

struct Command {
    request: Request,
    reply: oneshot::Sender<DaoResult<Response>>,
}

pub struct DaoService;

impl DaoService {
    /// Spawn the service task. It stops once every `DaoHandle` is dropped.
    pub fn spawn(dao: Arc<Dao>, queue_depth: usize) -> (DaoHandle, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Command>(queue_depth.max(1));

        let task = tokio::spawn(async move {
            info!("DAO service started");
            while let Some(Command { request, reply }) = receiver.recv().await {
                debug!("Applying {} from {}", request.operation(), request.caller());
                let result = dao.apply(&request);
                if reply.send(result).is_err() {
                    debug!("Caller of {} went away before the reply", request.operation());
                }
            }
            info!("DAO service stopped");
        });

        (DaoHandle { sender }, task)
    }
}

/// Cloneable async client of a running `DaoService`
#[derive(Clone)]
pub struct DaoHandle {
    sender: mpsc::Sender<Command>,
}

impl DaoHandle {
    pub async fn submit(&self, request: Request) -> DaoResult<Response> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Command { request, reply })
            .await
            .map_err(|_| DaoError::ServiceUnavailable)?;
        response.await.map_err(|_| DaoError::ServiceUnavailable)?
    }

    pub async fn contribute(&self, caller: &Address, amount: Amount) -> DaoResult<()> {
        self.submit(Request::Contribute {
            caller: caller.clone(),
            amount,
        })
        .await
        .map(|_| ())
    }

    pub async fn redeem_share(&self, caller: &Address, amount: Amount) -> DaoResult<()> {
        self.submit(Request::RedeemShare {
            caller: caller.clone(),
            amount,
        })
        .await
        .map(|_| ())
    }

    pub async fn transfer_share(&self, caller: &Address, amount: Amount, to: &Address) -> DaoResult<()> {
        self.submit(Request::TransferShare {
            caller: caller.clone(),
            amount,
            to: to.clone(),
        })
        .await
        .map(|_| ())
    }

    pub async fn create_proposal(
        &self,
        caller: &Address,
        name: impl Into<String>,
        amount: Amount,
        recipient: &Address,
    ) -> DaoResult<ProposalId> {
        let response = self
            .submit(Request::CreateProposal {
                caller: caller.clone(),
                name: name.into(),
                amount,
                recipient: recipient.clone(),
            })
            .await?;
        match response {
            Response::ProposalCreated { proposal_id } => Ok(proposal_id),
            _ => Err(DaoError::ServiceUnavailable),
        }
    }

    pub async fn vote(&self, caller: &Address, proposal_id: ProposalId) -> DaoResult<Amount> {
        let response = self
            .submit(Request::Vote {
                caller: caller.clone(),
                proposal_id,
            })
            .await?;
        match response {
            Response::Voted { weight } => Ok(weight),
            _ => Err(DaoError::ServiceUnavailable),
        }
    }

    pub async fn execute_proposal(&self, caller: &Address, proposal_id: ProposalId) -> DaoResult<()> {
        self.submit(Request::ExecuteProposal {
            caller: caller.clone(),
            proposal_id,
        })
        .await
        .map(|_| ())
    }

    pub async fn withdraw_ether(&self, caller: &Address, amount: Amount, to: &Address) -> DaoResult<()> {
        self.submit(Request::WithdrawEther {
            caller: caller.clone(),
            amount,
            to: to.clone(),
        })
        .await
        .map(|_| ())
    }
}
