//! End-to-end ledger scenarios on a manual clock

use std::sync::{Arc, Mutex, Weak};

use dao_treasury::{
    Address, Amount, Dao, DaoError, DaoResult, DaoSettings, ErrorCategory, InMemoryBank,
    ManualClock, ProposalStatus, TransferError, ValueTransfer,
};

const START: i64 = 1_700_000_000;

fn addr(s: &str) -> Address {
    Address::from(s)
}

fn settings(quorum: u8) -> DaoSettings {
    DaoSettings {
        contribution_duration_secs: 10,
        vote_duration_secs: 10,
        quorum_percent: quorum,
        burn_on_redeem: false,
    }
}

fn deploy(quorum: u8) -> (Dao, Arc<ManualClock>, Arc<InMemoryBank>) {
    let clock = Arc::new(ManualClock::new(START));
    let bank = Arc::new(InMemoryBank::new());
    let dao = Dao::new(addr("owner"), &settings(quorum), clock.clone(), bank.clone()).unwrap();
    (dao, clock, bank)
}

#[test]
fn test_three_investor_quorum_scenario() {
    let (dao, clock, bank) = deploy(50);
    for investor in ["a", "b", "c"] {
        dao.contribute(&addr(investor), 1).unwrap();
    }

    let id = dao.create_proposal(&addr("a"), "DAI", 1, &addr("payee")).unwrap();
    assert_eq!(dao.available_funds().unwrap(), 2);

    dao.vote(&addr("a"), id).unwrap();
    dao.vote(&addr("b"), id).unwrap();
    assert_eq!(
        dao.vote(&addr("a"), id).unwrap_err(),
        DaoError::AlreadyVoted {
            proposal_id: id,
            voter: addr("a")
        }
    );

    assert!(matches!(
        dao.execute_proposal(&addr("owner"), id),
        Err(DaoError::VotingStillOpen { .. })
    ));

    clock.advance(11);
    assert_eq!(dao.proposal_status(id).unwrap(), ProposalStatus::Executable);
    dao.execute_proposal(&addr("owner"), id).unwrap();

    assert_eq!(bank.balance(&addr("payee")), 1);
    assert!(dao.proposal(id).unwrap().executed);
    assert_eq!(
        dao.execute_proposal(&addr("owner"), id).unwrap_err(),
        DaoError::AlreadyExecuted(id)
    );
    assert_eq!(bank.balance(&addr("payee")), 1);
}

#[test]
fn test_execute_without_quorum() {
    let (dao, clock, bank) = deploy(50);
    for investor in ["a", "b", "c"] {
        dao.contribute(&addr(investor), 1).unwrap();
    }
    let id = dao.create_proposal(&addr("a"), "DAI", 1, &addr("payee")).unwrap();
    dao.vote(&addr("a"), id).unwrap();

    clock.advance(11);
    let err = dao.execute_proposal(&addr("owner"), id).unwrap_err();
    assert_eq!(
        err,
        DaoError::QuorumNotMet {
            proposal_id: id,
            percent: 33,
            quorum: 50
        }
    );
    assert_eq!(err.category(), ErrorCategory::StateConflict);
    assert_eq!(bank.balance(&addr("payee")), 0);
    assert_eq!(dao.proposal_status(id).unwrap(), ProposalStatus::Unexecutable);
}

#[test]
fn test_vote_after_window() {
    let (dao, clock, _) = deploy(50);
    dao.contribute(&addr("a"), 1).unwrap();
    let id = dao.create_proposal(&addr("a"), "DAI", 1, &addr("payee")).unwrap();

    clock.advance(10);
    dao.vote(&addr("a"), id).unwrap();

    dao.contribute(&addr("b"), 1).unwrap();
    clock.advance(1);
    assert!(matches!(
        dao.vote(&addr("b"), id),
        Err(DaoError::VotingClosed { .. })
    ));
}

#[test]
fn test_non_investor_cannot_vote() {
    let (dao, _, _) = deploy(50);
    dao.contribute(&addr("a"), 1).unwrap();
    let id = dao.create_proposal(&addr("a"), "DAI", 1, &addr("payee")).unwrap();
    assert_eq!(dao.vote(&addr("mallory"), id), Err(DaoError::NotInvestor));
}

#[test]
fn test_over_withdraw_leaves_balances_unchanged() {
    let (dao, _, bank) = deploy(50);
    dao.contribute(&addr("a"), 5).unwrap();
    let before = dao.snapshot().unwrap();

    assert_eq!(
        dao.withdraw_ether(&addr("owner"), 6, &addr("owner")),
        Err(DaoError::InsufficientFunds {
            need: 6,
            available: 5
        })
    );
    assert_eq!(dao.snapshot().unwrap(), before);
    assert_eq!(bank.balance(&addr("owner")), 0);

    assert_eq!(
        dao.withdraw_ether(&addr("a"), 1, &addr("a")),
        Err(DaoError::NotAdmin)
    );
}

#[test]
fn test_withdraw_cannot_touch_reserved_funds() {
    let (dao, _, bank) = deploy(50);
    dao.contribute(&addr("a"), 5).unwrap();
    dao.create_proposal(&addr("a"), "DAI", 3, &addr("payee")).unwrap();

    assert!(dao.withdraw_ether(&addr("owner"), 3, &addr("owner")).is_err());
    dao.withdraw_ether(&addr("owner"), 2, &addr("owner")).unwrap();
    assert_eq!(bank.balance(&addr("owner")), 2);
    assert_eq!(dao.available_funds().unwrap(), 0);
}

#[test]
fn test_transferred_shares_make_recipient_investor() {
    let (dao, _, _) = deploy(50);
    dao.contribute(&addr("a"), 4).unwrap();
    dao.transfer_share(&addr("a"), 3, &addr("b")).unwrap();

    assert!(dao.is_investor(&addr("b")).unwrap());
    assert_eq!(dao.shares(&addr("a")).unwrap(), 1);
    assert_eq!(dao.shares(&addr("b")).unwrap(), 3);
    assert_eq!(dao.total_shares().unwrap(), 4);

    assert_eq!(
        dao.transfer_share(&addr("a"), 2, &addr("b")),
        Err(DaoError::InsufficientShares { need: 2, have: 1 })
    );
}

#[test]
fn test_rejected_payout_rolls_back_execution() {
    let (dao, clock, bank) = deploy(50);
    dao.contribute(&addr("a"), 2).unwrap();
    let id = dao.create_proposal(&addr("a"), "DAI", 2, &addr("payee")).unwrap();
    dao.vote(&addr("a"), id).unwrap();
    clock.advance(11);

    bank.reject(&addr("payee"));
    let before = dao.snapshot().unwrap();
    let err = dao.execute_proposal(&addr("owner"), id).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Transfer);
    assert_eq!(dao.snapshot().unwrap(), before);
    assert!(!dao.proposal(id).unwrap().executed);

    // Same proposal succeeds once the destination accepts funds
    bank.accept(&addr("payee"));
    dao.execute_proposal(&addr("owner"), id).unwrap();
    assert_eq!(bank.balance(&addr("payee")), 2);
}

#[test]
fn test_burn_on_redeem_reduces_total() {
    let clock = Arc::new(ManualClock::new(START));
    let bank = Arc::new(InMemoryBank::new());
    let mut burning = settings(50);
    burning.burn_on_redeem = true;
    let dao = Dao::new(addr("owner"), &burning, clock, bank.clone()).unwrap();

    dao.contribute(&addr("a"), 3).unwrap();
    dao.redeem_share(&addr("a"), 2).unwrap();
    assert_eq!(dao.total_shares().unwrap(), 1);
    assert_eq!(bank.balance(&addr("a")), 2);
}

#[test]
fn test_burn_after_close_cannot_revive_proposal() {
    let clock = Arc::new(ManualClock::new(START));
    let bank = Arc::new(InMemoryBank::new());
    let mut burning = settings(50);
    burning.burn_on_redeem = true;
    let dao = Dao::new(addr("owner"), &burning, clock.clone(), bank.clone()).unwrap();

    dao.contribute(&addr("a"), 1).unwrap();
    dao.contribute(&addr("c"), 3).unwrap();
    let id = dao.create_proposal(&addr("a"), "DAI", 1, &addr("payee")).unwrap();
    dao.vote(&addr("a"), id).unwrap();

    clock.advance(11);
    let not_met = DaoError::QuorumNotMet {
        proposal_id: id,
        percent: 25,
        quorum: 50,
    };
    assert_eq!(dao.execute_proposal(&addr("owner"), id).unwrap_err(), not_met);

    // Burning after the window shrinks the supply but not this proposal's quorum base
    dao.redeem_share(&addr("c"), 2).unwrap();
    assert_eq!(dao.total_shares().unwrap(), 2);
    assert_eq!(dao.proposal(id).unwrap().closing_total_shares, Some(4));
    assert_eq!(dao.proposal_status(id).unwrap(), ProposalStatus::Unexecutable);
    assert_eq!(dao.execute_proposal(&addr("owner"), id).unwrap_err(), not_met);
    assert_eq!(bank.balance(&addr("payee")), 0);
}

#[test]
fn test_proposal_closed_before_burn_uses_live_supply_until_settled() {
    let clock = Arc::new(ManualClock::new(START));
    let bank = Arc::new(InMemoryBank::new());
    let mut burning = settings(50);
    burning.burn_on_redeem = true;
    let dao = Dao::new(addr("owner"), &burning, clock.clone(), bank.clone()).unwrap();

    dao.contribute(&addr("a"), 2).unwrap();
    dao.contribute(&addr("c"), 2).unwrap();
    let id = dao.create_proposal(&addr("a"), "DAI", 1, &addr("payee")).unwrap();
    dao.vote(&addr("a"), id).unwrap();

    // Burning while voting is open still counts
    dao.redeem_share(&addr("c"), 1).unwrap();
    clock.advance(11);
    assert_eq!(dao.proposal(id).unwrap().closing_total_shares, None);
    assert_eq!(dao.proposal_status(id).unwrap(), ProposalStatus::Executable);

    dao.execute_proposal(&addr("owner"), id).unwrap();
    assert_eq!(bank.balance(&addr("payee")), 1);
}

#[test]
fn test_redeem_keeps_total_by_default() {
    let (dao, _, _) = deploy(50);
    dao.contribute(&addr("a"), 3).unwrap();
    dao.redeem_share(&addr("a"), 2).unwrap();

    let state = dao.snapshot().unwrap();
    assert_eq!(state.total_shares(), 3);
    assert_eq!(state.ledger().redeemed_shares(), 2);
    assert_eq!(state.shares(&addr("a")), 1);
}

/// Transfer hook that calls back into the DAO it pays out from
struct ReentrantHook {
    dao: Mutex<Weak<Dao>>,
    inner_results: Mutex<Vec<DaoResult<()>>>,
}

impl ValueTransfer for ReentrantHook {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let dao = self.dao.lock().unwrap().upgrade();
        if let Some(dao) = dao {
            let result = dao.redeem_share(to, amount);
            self.inner_results.lock().unwrap().push(result);
        }
        Ok(())
    }
}

#[test]
fn test_transfer_hook_cannot_reenter() {
    let hook = Arc::new(ReentrantHook {
        dao: Mutex::new(Weak::new()),
        inner_results: Mutex::new(Vec::new()),
    });
    let dao = Arc::new(
        Dao::new(
            addr("owner"),
            &settings(50),
            Arc::new(ManualClock::new(START)),
            hook.clone(),
        )
        .unwrap(),
    );
    *hook.dao.lock().unwrap() = Arc::downgrade(&dao);

    dao.contribute(&addr("a"), 4).unwrap();
    dao.redeem_share(&addr("a"), 1).unwrap();

    let expected: Vec<DaoResult<()>> = vec![Err(DaoError::Reentrancy)];
    assert_eq!(*hook.inner_results.lock().unwrap(), expected);
    assert_eq!(dao.shares(&addr("a")).unwrap(), 3);
    assert_eq!(dao.available_funds().unwrap(), 3);
}

#[test]
fn test_concurrent_threads_are_serialized() {
    let (dao, _, _) = deploy(50);
    let dao = Arc::new(dao);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dao = dao.clone();
            std::thread::spawn(move || {
                let investor = Address::new(format!("investor-{}", i));
                for _ in 0..50 {
                    dao.contribute(&investor, 1).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(dao.total_shares().unwrap(), 400);
    assert_eq!(dao.available_funds().unwrap(), 400);
    assert_eq!(dao.snapshot().unwrap().events().len(), 401);
}
