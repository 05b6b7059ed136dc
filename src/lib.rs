// Library interface for the DAO treasury ledger
// The binary and the integration tests drive everything through these modules

pub mod access;
pub mod clock;
pub mod config;
pub mod dao;
pub mod error;
pub mod events;
pub mod execution;
pub mod ledger;
pub mod lock_utils;
pub mod proposals;
pub mod service;
pub mod store;
pub mod transfer;
pub mod treasury;
pub mod types;
pub mod voting;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DaoSettings, Settings};
pub use dao::{Dao, DaoConfig, DaoState};
pub use error::{DaoError, DaoResult, ErrorCategory};
pub use events::DaoEvent;
pub use proposals::{Proposal, ProposalStatus};
pub use service::{DaoHandle, DaoService, Request, Response};
pub use store::{DaoSnapshot, StateLock};
pub use transfer::{BankState, InMemoryBank, TransferError, ValueTransfer};
pub use types::{Address, Amount, Payout, ProposalId, Timestamp};
