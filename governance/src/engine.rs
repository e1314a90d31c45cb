//! The voting engine: rule administration, ballots, weighted tallies, and the
//! execution handshake with the proxy.
//!
//! One engine type serves both the Global and the Escrowed community; they
//! differ only in their [`WeightSource`] and their own configuration.
//!
//! Write access has two phases. Until the instance is sealed (explicitly, or
//! by the first proposal) the deploying authority may configure it directly.
//! Afterwards every write must arrive through the instance's proxy, i.e. as
//! the forwarded call of a passed ballot.

use std::collections::BTreeSet;

use jointer_types::{Address, Amount, SharedLedger, Timestamp, TokenClass};
use tracing::{debug, info};

use crate::ballot::{Ballot, BallotStatus, ExecutionReceipt, PassReason, VoteRecord};
use crate::call::{ArgValue, Call, CallReturn};
use crate::config::GovernanceConfig;
use crate::eligibility::{BlockedWallets, ExclusionSet};
use crate::error::GovernanceError;
use crate::rule::{Rule, RuleRegistry};
use crate::threshold::{MajorityLevels, ThresholdVector};
use crate::weights::{TokenWeights, WeightSource};

/// What the proxy must do for a ballot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Execution {
    /// Passed and not yet forwarded.
    Pending(Call),
    /// Already forwarded; repeat requests get the stored receipt.
    Done(ExecutionReceipt),
}

pub struct Governance<W: WeightSource> {
    address: Address,
    authority: Address,
    proxy: Option<Address>,
    /// A second proxy allowed to govern this instance (the Global proxy over
    /// the Escrowed instance).
    overseer: Option<Address>,
    ceo_wallets: BTreeSet<Address>,
    sealed: bool,
    voting_period_secs: u64,
    levels: MajorityLevels,
    rules: RuleRegistry,
    ballots: Vec<Ballot>,
    excluded: ExclusionSet,
    blocked: BlockedWallets,
    close_time: Timestamp,
    weights: W,
}

impl<W: WeightSource> Governance<W> {
    pub fn new(
        address: Address,
        authority: Address,
        ceo: Address,
        config: &GovernanceConfig,
        weights: W,
    ) -> Result<Self, GovernanceError> {
        Ok(Self {
            address,
            authority,
            proxy: None,
            overseer: None,
            ceo_wallets: BTreeSet::from([ceo]),
            sealed: false,
            voting_period_secs: config.voting_period_secs,
            levels: config.levels()?,
            rules: RuleRegistry::new(),
            ballots: Vec::new(),
            excluded: ExclusionSet::default(),
            blocked: BlockedWallets::default(),
            close_time: Timestamp::EPOCH,
            weights,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn proxy(&self) -> Option<Address> {
        self.proxy
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn levels(&self) -> MajorityLevels {
        self.levels
    }

    pub fn close_time(&self) -> Timestamp {
        self.close_time
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn rule(&self, id: u64) -> Result<&Rule, GovernanceError> {
        self.rules.get(id)
    }

    pub fn ballot(&self, id: u64) -> Result<&Ballot, GovernanceError> {
        self.ballots
            .get(self.ballot_index(id)?)
            .ok_or(GovernanceError::UnknownBallot(id))
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn is_blocked(&self, wallet: &Address) -> bool {
        self.blocked.contains(wallet)
    }

    pub fn is_excluded(&self, class: TokenClass, address: &Address) -> bool {
        self.excluded.contains(class, address)
    }

    pub fn is_ceo(&self, wallet: &Address) -> bool {
        self.ceo_wallets.contains(wallet)
    }

    pub fn ceo_wallets(&self) -> impl Iterator<Item = &Address> {
        self.ceo_wallets.iter()
    }

    pub fn weights(&self) -> &W {
        &self.weights
    }

    // ── Authorization ────────────────────────────────────────────────────

    fn authorize_bootstrap(&self, caller: &Address) -> Result<(), GovernanceError> {
        if !self.sealed && *caller == self.authority {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized(*caller))
        }
    }

    fn authorize_governed(&self, caller: &Address) -> Result<(), GovernanceError> {
        if self.proxy.as_ref() == Some(caller) || self.overseer.as_ref() == Some(caller) {
            return Ok(());
        }
        self.authorize_bootstrap(caller)
    }

    fn authorize_window(&self, caller: &Address) -> Result<(), GovernanceError> {
        let governed =
            self.proxy.as_ref() == Some(caller) || self.overseer.as_ref() == Some(caller);
        if *caller == self.authority || self.is_ceo(caller) || governed {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized(*caller))
        }
    }

    /// End the bootstrap phase. Afterwards only the proxy may write.
    pub fn seal(&mut self, caller: &Address) -> Result<(), GovernanceError> {
        self.authorize_bootstrap(caller)?;
        self.sealed = true;
        info!(governance = %self.address, "bootstrap sealed");
        Ok(())
    }

    pub fn set_governance_proxy(
        &mut self,
        caller: &Address,
        proxy: Address,
    ) -> Result<(), GovernanceError> {
        self.authorize_governed(caller)?;
        self.proxy = Some(proxy);
        info!(governance = %self.address, %proxy, "governance proxy set");
        Ok(())
    }

    /// Let another instance's proxy govern this one (bootstrap only).
    pub fn set_overseer(&mut self, caller: &Address, overseer: Address) -> Result<(), GovernanceError> {
        self.authorize_bootstrap(caller)?;
        self.overseer = Some(overseer);
        info!(governance = %self.address, %overseer, "overseer set");
        Ok(())
    }

    pub fn overseer(&self) -> Option<Address> {
        self.overseer
    }

    // ── Rule registry ────────────────────────────────────────────────────

    pub fn add_rule(
        &mut self,
        caller: &Address,
        target: Address,
        thresholds: ThresholdVector,
        selector: &str,
    ) -> Result<u64, GovernanceError> {
        self.authorize_governed(caller)?;
        let id = self.rules.add(target, thresholds, selector)?;
        info!(governance = %self.address, rule_id = id, %target, selector, "rule added");
        Ok(id)
    }

    pub fn change_rule_majority(
        &mut self,
        caller: &Address,
        rule_id: u64,
        thresholds: ThresholdVector,
    ) -> Result<(), GovernanceError> {
        self.authorize_governed(caller)?;
        self.rules.change_majority(rule_id, thresholds)?;
        info!(governance = %self.address, rule_id, ?thresholds, "rule majority changed");
        Ok(())
    }

    pub fn change_rule_address(
        &mut self,
        caller: &Address,
        rule_id: u64,
        target: Address,
    ) -> Result<(), GovernanceError> {
        self.authorize_governed(caller)?;
        self.rules.change_address(rule_id, target)?;
        info!(governance = %self.address, rule_id, %target, "rule target changed");
        Ok(())
    }

    pub fn set_absolute_level(&mut self, caller: &Address, level: u8) -> Result<(), GovernanceError> {
        self.authorize_governed(caller)?;
        self.levels = self.levels.with_absolute(level)?;
        info!(governance = %self.address, level, "absolute level set");
        Ok(())
    }

    pub fn set_expedited_level(&mut self, caller: &Address, level: u8) -> Result<(), GovernanceError> {
        self.authorize_governed(caller)?;
        self.levels = self.levels.with_expedited(level)?;
        info!(governance = %self.address, level, "expedited level set");
        Ok(())
    }

    // ── Eligibility ──────────────────────────────────────────────────────

    pub fn manage_blocked_wallet(
        &mut self,
        caller: &Address,
        wallet: Address,
        blocked: bool,
    ) -> Result<bool, GovernanceError> {
        self.authorize_governed(caller)?;
        let changed = self.blocked.set(wallet, blocked);
        info!(governance = %self.address, %wallet, blocked, changed, "blocked wallet updated");
        Ok(changed)
    }

    pub fn add_excluded(
        &mut self,
        caller: &Address,
        class: TokenClass,
        addresses: &[Address],
    ) -> Result<usize, GovernanceError> {
        self.authorize_governed(caller)?;
        let added = self.excluded.add(class, addresses);
        info!(governance = %self.address, %class, added, "supply exclusions added");
        Ok(added)
    }

    pub fn remove_excluded(
        &mut self,
        caller: &Address,
        class: TokenClass,
        addresses: &[Address],
    ) -> Result<usize, GovernanceError> {
        self.authorize_governed(caller)?;
        let removed = self.excluded.remove(class, addresses);
        info!(governance = %self.address, %class, removed, "supply exclusions removed");
        Ok(removed)
    }

    /// CEOs manage each other; a vote may too. The last CEO stays.
    pub fn manage_ceo_wallet(
        &mut self,
        caller: &Address,
        wallet: Address,
        add: bool,
    ) -> Result<(), GovernanceError> {
        if !self.is_ceo(caller) {
            self.authorize_governed(caller)?;
        }
        if add {
            self.ceo_wallets.insert(wallet);
        } else {
            if self.ceo_wallets.len() == 1 && self.ceo_wallets.contains(&wallet) {
                return Err(GovernanceError::LastCeo(wallet));
            }
            self.ceo_wallets.remove(&wallet);
        }
        info!(governance = %self.address, %wallet, add, "CEO wallets updated");
        Ok(())
    }

    // ── Voting window ────────────────────────────────────────────────────

    /// Push the deadline to one voting period past `now`, never earlier
    /// than the current deadline.
    pub fn update_close_time(
        &mut self,
        caller: &Address,
        now: Timestamp,
    ) -> Result<Timestamp, GovernanceError> {
        let until = now.plus(self.voting_period_secs).max(self.close_time);
        self.set_close_time(caller, until, now)?;
        Ok(until)
    }

    /// Extend the deadline to `until`, which must lie after `now` and not
    /// before the current deadline. Open ballots that are still live follow
    /// the window.
    pub fn set_close_time(
        &mut self,
        caller: &Address,
        until: Timestamp,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.authorize_window(caller)?;
        if until <= now || until < self.close_time {
            return Err(GovernanceError::InvalidWindow { until, now });
        }
        self.close_time = until;
        for ballot in self.ballots.iter_mut() {
            if ballot.is_open() && now < ballot.closes_at {
                ballot.closes_at = until;
            }
        }
        info!(governance = %self.address, close_time = %until, "voting window updated");
        Ok(())
    }

    // ── Ballots ──────────────────────────────────────────────────────────

    fn ballot_index(&self, id: u64) -> Result<usize, GovernanceError> {
        usize::try_from(id)
            .ok()
            .filter(|i| *i < self.ballots.len())
            .ok_or(GovernanceError::UnknownBallot(id))
    }

    /// Open a ballot for `rule_id` with the given positional arguments.
    pub fn propose(
        &mut self,
        proposer: Address,
        rule_id: u64,
        args: Vec<ArgValue>,
        now: Timestamp,
    ) -> Result<u64, GovernanceError> {
        if self.close_time <= now {
            return Err(GovernanceError::InvalidWindow {
                until: self.close_time,
                now,
            });
        }
        let rule = self.rules.get(rule_id)?;
        let call = Call::new(rule.target, rule.selector.clone(), args)?;
        let payload = call.encode()?;

        let id = self.ballots.len() as u64;
        self.ballots.push(Ballot {
            id,
            rule_id,
            proposer,
            call,
            payload,
            opened_at: now,
            closes_at: self.close_time,
            approve: [Amount::ZERO; TokenClass::COUNT],
            reject: [Amount::ZERO; TokenClass::COUNT],
            votes: Default::default(),
            status: BallotStatus::Open,
            receipt: None,
        });
        if !self.sealed {
            self.sealed = true;
            info!(governance = %self.address, "bootstrap sealed by first proposal");
        }
        info!(governance = %self.address, ballot_id = id, rule_id, %proposer, "ballot opened");
        Ok(id)
    }

    /// Weight `voter` brings to `class` right now.
    pub fn vote_weight(&self, voter: &Address, class: TokenClass) -> Amount {
        if self.blocked.contains(voter) || self.excluded.contains(class, voter) {
            return Amount::ZERO;
        }
        self.weights
            .balance_of(class, voter)
            .unwrap_or(Amount::ZERO)
    }

    /// Circulating supply of `class`: total supply minus excluded holdings.
    /// `None` when the class has no source.
    pub fn eligible_supply(&self, class: TokenClass) -> Option<Amount> {
        let total = self.weights.total_supply(class)?;
        let excluded: Amount = self
            .excluded
            .iter(class)
            .filter_map(|a| self.weights.balance_of(class, a))
            .sum();
        Some(total.saturating_sub(excluded))
    }

    /// Record a vote. A repeat vote by the same voter replaces the earlier
    /// one. The ballot passes the moment a threshold is reached.
    pub fn cast_vote(
        &mut self,
        ballot_id: u64,
        voter: Address,
        support: bool,
        now: Timestamp,
    ) -> Result<BallotStatus, GovernanceError> {
        let index = self.ballot_index(ballot_id)?;
        let ballot = &self.ballots[index];
        if !ballot.is_open() || now >= ballot.closes_at {
            return Err(GovernanceError::BallotClosed(ballot_id));
        }

        let thresholds = self.rules.get(ballot.rule_id)?.thresholds.resolve(&self.levels);
        let weights = TokenClass::ALL.map(|c| self.vote_weight(&voter, c));
        let supplies = TokenClass::ALL.map(|c| self.eligible_supply(c));
        let expedited = self.levels.expedited();

        let ballot = &mut self.ballots[index];
        ballot.record_vote(
            voter,
            VoteRecord {
                support,
                weights,
                cast_at: now,
            },
        );
        debug!(ballot_id, %voter, support, ?weights, "vote recorded");

        if let Some(reason) = evaluate(&ballot.approve, thresholds, &supplies, expedited) {
            ballot.status = BallotStatus::Passed { at: now, reason };
            info!(governance = %self.address, ballot_id, ?reason, "ballot passed");
        }
        Ok(ballot.status.clone())
    }

    /// Materialise expiry for `ballot_id` and return it.
    pub fn poll(&mut self, ballot_id: u64, now: Timestamp) -> Result<&Ballot, GovernanceError> {
        let index = self.ballot_index(ballot_id)?;
        if self.ballots[index].expire_if_due(now) {
            info!(governance = %self.address, ballot_id, "ballot expired");
        }
        Ok(&self.ballots[index])
    }

    /// Expire every open ballot whose deadline has passed.
    pub fn expire_due(&mut self, now: Timestamp) -> Vec<u64> {
        let expired: Vec<u64> = self
            .ballots
            .iter_mut()
            .filter_map(|b| b.expire_if_due(now).then_some(b.id))
            .collect();
        if !expired.is_empty() {
            info!(governance = %self.address, count = expired.len(), "ballots expired");
        }
        expired
    }

    /// First half of execute-then-forward. Does not mutate.
    pub fn begin_execution(&self, ballot_id: u64) -> Result<Execution, GovernanceError> {
        let ballot = self.ballot(ballot_id)?;
        if !ballot.is_passed() {
            return Err(GovernanceError::BallotNotPassed(ballot_id));
        }
        Ok(match &ballot.receipt {
            Some(receipt) => Execution::Done(receipt.clone()),
            None => Execution::Pending(ballot.call.clone()),
        })
    }

    /// Second half: record that the call was forwarded.
    pub fn complete_execution(
        &mut self,
        ballot_id: u64,
        result: CallReturn,
        now: Timestamp,
    ) -> Result<ExecutionReceipt, GovernanceError> {
        let index = self.ballot_index(ballot_id)?;
        let ballot = &mut self.ballots[index];
        if !ballot.is_passed() {
            return Err(GovernanceError::BallotNotPassed(ballot_id));
        }
        if ballot.is_executed() {
            return Err(GovernanceError::AlreadyExecuted(ballot_id));
        }
        let receipt = ExecutionReceipt {
            ballot_id,
            rule_id: ballot.rule_id,
            target: ballot.call.target,
            selector: ballot.call.signature(),
            result,
            executed_at: now,
        };
        ballot.receipt = Some(receipt.clone());
        info!(
            governance = %self.address,
            ballot_id,
            target = %receipt.target,
            selector = %receipt.selector,
            "ballot executed"
        );
        Ok(receipt)
    }
}

impl Governance<TokenWeights> {
    /// Bind a token ledger to `class` (bootstrap only).
    pub fn set_token_source(
        &mut self,
        caller: &Address,
        class: TokenClass,
        ledger: SharedLedger,
    ) -> Result<(), GovernanceError> {
        self.authorize_bootstrap(caller)?;
        self.weights.set_token(class, ledger);
        info!(governance = %self.address, %class, "token source bound");
        Ok(())
    }

    /// Add escrow holdings to holders' weight in `class` (bootstrap only).
    pub fn set_escrow_source(
        &mut self,
        caller: &Address,
        class: TokenClass,
        ledger: SharedLedger,
    ) -> Result<(), GovernanceError> {
        self.authorize_bootstrap(caller)?;
        self.weights.set_overlay(class, ledger);
        info!(governance = %self.address, %class, "escrow overlay bound");
        Ok(())
    }
}

/// Smallest approving weight that is at least `percent`% of `supply`.
fn required_weight(supply: Amount, percent: u8) -> u128 {
    let s = supply.raw();
    let p = percent as u128;
    (s / 100) * p + ((s % 100) * p + 99) / 100
}

fn reaches(approve: Amount, supply: Amount, percent: u8) -> bool {
    approve.raw() >= required_weight(supply, percent)
}

/// Decide whether the approving tallies pass a rule.
///
/// Each class with a nonzero threshold and a nonzero circulating supply is
/// checked on its own; any one reaching its threshold passes the ballot.
/// When two or more such classes co-vote, their combined approval reaching
/// the expedited tier passes it as well. Classes without supply are skipped,
/// never counted as satisfied or as blocking.
pub(crate) fn evaluate(
    approve: &[Amount; TokenClass::COUNT],
    thresholds: [u8; TokenClass::COUNT],
    supplies: &[Option<Amount>; TokenClass::COUNT],
    expedited: u8,
) -> Option<PassReason> {
    let live: Vec<TokenClass> = TokenClass::ALL
        .into_iter()
        .filter(|c| thresholds[c.index()] > 0)
        .filter(|c| supplies[c.index()].is_some_and(|s| !s.is_zero()))
        .collect();

    for class in &live {
        let i = class.index();
        if let Some(supply) = supplies[i] {
            if reaches(approve[i], supply, thresholds[i]) {
                return Some(PassReason::ClassMajority(*class));
            }
        }
    }

    if live.len() >= 2 {
        let approved: Amount = live.iter().map(|c| approve[c.index()]).sum();
        let supply: Amount = live
            .iter()
            .filter_map(|c| supplies[c.index()])
            .sum();
        if reaches(approved, supply, expedited) {
            return Some(PassReason::Expedited);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::Threshold;
    use jointer_nullables::NullTokenLedger;
    use std::sync::Arc;

    const T0: u64 = 1_000_000;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    struct Fixture {
        gov: Governance<TokenWeights>,
        primary: Arc<NullTokenLedger>,
        authority: Address,
        proxy: Address,
        now: Timestamp,
    }

    /// Governance over a 1000-unit primary token; `company` holds 100 and is
    /// excluded and blocked, leaving 900 circulating.
    fn fixture() -> Fixture {
        let authority = addr("authority");
        let proxy = addr("proxy");
        let primary = Arc::new(NullTokenLedger::new());
        primary.set_total_supply(1_000);
        primary.set_balance(addr("company"), 100);

        let mut gov = Governance::new(
            addr("governance"),
            authority,
            addr("ceo"),
            &GovernanceConfig::default(),
            TokenWeights::new(),
        )
        .unwrap();
        gov.set_token_source(&authority, TokenClass::Primary, primary.clone())
            .unwrap();
        gov.set_governance_proxy(&authority, proxy).unwrap();
        gov.add_excluded(&authority, TokenClass::Primary, &[addr("company")])
            .unwrap();
        gov.manage_blocked_wallet(&authority, addr("company"), true)
            .unwrap();
        let now = Timestamp::new(T0);
        gov.update_close_time(&authority, now).unwrap();
        gov.add_rule(
            &authority,
            addr("escrow"),
            ThresholdVector::absolute_for(TokenClass::Primary),
            "addGroup(uint256)",
        )
        .unwrap();
        Fixture {
            gov,
            primary,
            authority,
            proxy,
            now,
        }
    }

    #[test]
    fn all_zero_rule_rejected() {
        let mut f = fixture();
        let err = f
            .gov
            .add_rule(
                &f.authority,
                addr("escrow"),
                ThresholdVector::from_percentages([0; 4]),
                "addGroup(uint256)",
            )
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidThreshold(_)));
        assert_eq!(f.gov.rules().len(), 1);
    }

    #[test]
    fn passes_at_ninety_one_percent() {
        let mut f = fixture();
        f.primary.set_balance(addr("whale"), 819); // 91% of 900
        f.primary.set_balance(addr("minnow"), 81);
        let id = f.gov.propose(addr("whale"), 0, vec![ArgValue::Uint(150)], f.now).unwrap();

        let status = f.gov.cast_vote(id, addr("whale"), true, f.now).unwrap();
        assert_eq!(
            status,
            BallotStatus::Passed {
                at: f.now,
                reason: PassReason::ClassMajority(TokenClass::Primary)
            }
        );
        assert!(matches!(
            f.gov.cast_vote(id, addr("minnow"), true, f.now),
            Err(GovernanceError::BallotClosed(_))
        ));
    }

    #[test]
    fn eighty_five_percent_expires() {
        let mut f = fixture();
        f.primary.set_balance(addr("holder"), 765); // 85% of 900
        let id = f.gov.propose(addr("holder"), 0, vec![ArgValue::Uint(150)], f.now).unwrap();
        assert_eq!(
            f.gov.cast_vote(id, addr("holder"), true, f.now).unwrap(),
            BallotStatus::Open
        );

        let after = f.gov.close_time();
        assert_eq!(f.gov.expire_due(after), vec![id]);
        assert_eq!(f.gov.ballot(id).unwrap().status, BallotStatus::Expired { at: after });
        assert_eq!(
            f.gov.begin_execution(id).unwrap_err(),
            GovernanceError::BallotNotPassed(id)
        );
    }

    #[test]
    fn blocked_and_excluded_voters_weigh_nothing() {
        let mut f = fixture();
        f.primary.set_balance(addr("company"), 1_000_000);
        f.primary.set_balance(addr("reserve"), 500);
        f.gov
            .add_excluded(&f.authority, TokenClass::Primary, &[addr("reserve")])
            .unwrap();
        let id = f.gov.propose(addr("x"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();

        f.gov.cast_vote(id, addr("company"), true, f.now).unwrap();
        f.gov.cast_vote(id, addr("reserve"), true, f.now).unwrap();
        let ballot = f.gov.ballot(id).unwrap();
        assert!(ballot.approve.iter().all(Amount::is_zero));
        assert!(ballot.is_open());
        assert_eq!(ballot.votes.len(), 2);
    }

    #[test]
    fn revote_replaces_contribution() {
        let mut f = fixture();
        f.primary.set_balance(addr("alice"), 300);
        let id = f.gov.propose(addr("alice"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();

        f.gov.cast_vote(id, addr("alice"), true, f.now).unwrap();
        f.gov.cast_vote(id, addr("alice"), true, f.now).unwrap();
        let ballot = f.gov.ballot(id).unwrap();
        assert_eq!(ballot.approve[0], Amount::new(300));

        f.gov.cast_vote(id, addr("alice"), false, f.now).unwrap();
        let ballot = f.gov.ballot(id).unwrap();
        assert_eq!(ballot.approve[0], Amount::ZERO);
        assert_eq!(ballot.reject[0], Amount::new(300));
    }

    #[test]
    fn revote_uses_fresh_balance() {
        let mut f = fixture();
        f.primary.set_balance(addr("alice"), 300);
        let id = f.gov.propose(addr("alice"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();
        f.gov.cast_vote(id, addr("alice"), true, f.now).unwrap();
        f.primary.set_balance(addr("alice"), 200);
        f.gov.cast_vote(id, addr("alice"), true, f.now).unwrap();
        assert_eq!(f.gov.ballot(id).unwrap().approve[0], Amount::new(200));
    }

    #[test]
    fn execution_handshake_is_idempotent() {
        let mut f = fixture();
        f.primary.set_balance(addr("whale"), 900);
        let id = f.gov.propose(addr("whale"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();
        f.gov.cast_vote(id, addr("whale"), true, f.now).unwrap();

        let Execution::Pending(call) = f.gov.begin_execution(id).unwrap() else {
            panic!("expected pending execution");
        };
        assert_eq!(call.signature(), "addGroup(uint256)");
        let receipt = f.gov.complete_execution(id, CallReturn::Id(1), f.now).unwrap();

        assert_eq!(f.gov.begin_execution(id).unwrap(), Execution::Done(receipt));
        assert_eq!(
            f.gov.complete_execution(id, CallReturn::Id(1), f.now).unwrap_err(),
            GovernanceError::AlreadyExecuted(id)
        );
    }

    #[test]
    fn open_ballot_cannot_execute() {
        let mut f = fixture();
        let id = f.gov.propose(addr("x"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();
        assert_eq!(
            f.gov.begin_execution(id).unwrap_err(),
            GovernanceError::BallotNotPassed(id)
        );
    }

    #[test]
    fn proposal_args_are_type_checked() {
        let mut f = fixture();
        let err = f
            .gov
            .propose(addr("x"), 0, vec![ArgValue::Bool(true)], f.now)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Call(_)));
        assert!(f.gov.ballots().is_empty());
        assert_eq!(
            f.gov.propose(addr("x"), 9, vec![], f.now).unwrap_err(),
            GovernanceError::UnknownRule(9)
        );
    }

    #[test]
    fn first_proposal_seals_bootstrap() {
        let mut f = fixture();
        assert!(!f.gov.is_sealed());
        f.gov.propose(addr("x"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();
        assert!(f.gov.is_sealed());
        assert_eq!(
            f.gov
                .manage_blocked_wallet(&f.authority, addr("y"), true)
                .unwrap_err(),
            GovernanceError::Unauthorized(f.authority)
        );
        // The proxy keeps write access.
        assert!(f.gov.manage_blocked_wallet(&f.proxy, addr("y"), true).unwrap());
    }

    #[test]
    fn overseer_may_govern_after_seal() {
        let mut f = fixture();
        let overseer = addr("global-proxy");
        f.gov.set_overseer(&f.authority, overseer).unwrap();
        f.gov.seal(&f.authority).unwrap();
        f.gov.set_expedited_level(&overseer, 60).unwrap();
        assert_eq!(f.gov.levels().expedited(), 60);
        assert!(f.gov.set_overseer(&f.authority, addr("other")).is_err());
    }

    #[test]
    fn strangers_cannot_write() {
        let mut f = fixture();
        let stranger = addr("stranger");
        assert_eq!(
            f.gov.set_absolute_level(&stranger, 80).unwrap_err(),
            GovernanceError::Unauthorized(stranger)
        );
        assert!(f.gov.update_close_time(&stranger, f.now).is_err());
    }

    #[test]
    fn close_time_rules() {
        let mut f = fixture();
        let ceo = addr("ceo");
        assert!(matches!(
            f.gov.set_close_time(&ceo, f.now, f.now),
            Err(GovernanceError::InvalidWindow { .. })
        ));
        let later = f.now.plus(30 * 24 * 3600);
        f.gov.set_close_time(&ceo, later, f.now).unwrap();
        assert_eq!(f.gov.close_time(), later);
        // Re-calling never pulls the deadline back below the current one.
        assert_eq!(f.gov.update_close_time(&ceo, f.now).unwrap(), later);
    }

    #[test]
    fn extending_window_extends_open_ballots() {
        let mut f = fixture();
        let id = f.gov.propose(addr("x"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();
        let later = f.gov.close_time().plus(3600);
        f.gov.set_close_time(&f.authority, later, f.now).unwrap();
        assert_eq!(f.gov.ballot(id).unwrap().closes_at, later);
    }

    #[test]
    fn deadline_cannot_be_pulled_forward() {
        let mut f = fixture();
        let ceo = addr("ceo");
        let id = f.gov.propose(addr("x"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();
        let deadline = f.gov.close_time();

        assert!(matches!(
            f.gov.set_close_time(&ceo, f.now.plus(1), f.now),
            Err(GovernanceError::InvalidWindow { .. })
        ));
        assert_eq!(f.gov.close_time(), deadline);
        assert_eq!(f.gov.ballot(id).unwrap().closes_at, deadline);
        assert!(f.gov.expire_due(f.now.plus(2)).is_empty());
        assert!(f.gov.ballot(id).unwrap().is_open());

        // Re-setting the same deadline is accepted.
        f.gov.set_close_time(&ceo, deadline, f.now).unwrap();
    }

    #[test]
    fn proposing_outside_window_fails() {
        let mut f = fixture();
        let after = f.gov.close_time();
        assert!(matches!(
            f.gov.propose(addr("x"), 0, vec![ArgValue::Uint(1)], after),
            Err(GovernanceError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn tier_change_reaches_symbolic_rules_only() {
        let mut f = fixture();
        let literal = f
            .gov
            .add_rule(
                &f.authority,
                addr("gateway"),
                ThresholdVector::from_percentages([90, 0, 0, 0]),
                "addChannel(string)",
            )
            .unwrap();
        f.gov.set_absolute_level(&f.authority, 80).unwrap();
        f.primary.set_balance(addr("holder"), 729); // 81% of 900

        let symbolic_ballot = f.gov.propose(addr("h"), 0, vec![ArgValue::Uint(1)], f.now).unwrap();
        let literal_ballot = f
            .gov
            .propose(addr("h"), literal, vec![ArgValue::Text("x".into())], f.now)
            .unwrap();
        assert!(f
            .gov
            .cast_vote(symbolic_ballot, addr("holder"), true, f.now)
            .map(|s| matches!(s, BallotStatus::Passed { .. }))
            .unwrap());
        assert_eq!(
            f.gov.cast_vote(literal_ballot, addr("holder"), true, f.now).unwrap(),
            BallotStatus::Open
        );
    }

    #[test]
    fn ceo_management() {
        let mut f = fixture();
        let ceo = addr("ceo");
        let deputy = addr("deputy");
        f.gov.manage_ceo_wallet(&ceo, deputy, true).unwrap();
        f.gov.manage_ceo_wallet(&deputy, ceo, false).unwrap();
        assert_eq!(
            f.gov.manage_ceo_wallet(&deputy, deputy, false).unwrap_err(),
            GovernanceError::LastCeo(deputy)
        );
        assert!(f.gov.is_ceo(&deputy));
        assert!(!f.gov.is_ceo(&ceo));
    }

    #[test]
    fn evaluate_skips_classes_without_supply() {
        let approve = [Amount::ZERO, Amount::new(95), Amount::ZERO, Amount::ZERO];
        let supplies = [Some(Amount::ZERO), Some(Amount::new(100)), None, None];
        // Primary has no circulating supply; it neither passes nor blocks.
        assert_eq!(
            evaluate(&approve, [90, 90, 90, 0], &supplies, 75),
            Some(PassReason::ClassMajority(TokenClass::SecondaryA))
        );
        assert_eq!(evaluate(&[Amount::ZERO; 4], [90, 0, 0, 0], &supplies, 75), None);
    }

    #[test]
    fn evaluate_expedited_needs_two_classes() {
        let supplies = [Some(Amount::new(100)), Some(Amount::new(100)), None, None];
        let approve = [Amount::new(80), Amount::new(80), Amount::ZERO, Amount::ZERO];
        assert_eq!(
            evaluate(&approve, [90, 90, 0, 0], &supplies, 75),
            Some(PassReason::Expedited)
        );
        // A single-class rule ignores the expedited tier.
        assert_eq!(evaluate(&approve, [90, 0, 0, 0], &supplies, 75), None);
    }

    #[test]
    fn required_weight_rounds_up() {
        assert_eq!(required_weight(Amount::new(100), 90), 90);
        assert_eq!(required_weight(Amount::new(3), 90), 3);
        assert_eq!(required_weight(Amount::new(900), 90), 810);
        assert_eq!(required_weight(Amount::new(u128::MAX), 100), u128::MAX);
    }

    #[test]
    fn symbolic_threshold_vector_is_accepted() {
        let mut f = fixture();
        let v = ThresholdVector::new([
            Threshold::Absolute,
            Threshold::Expedited,
            Threshold::DISABLED,
            Threshold::DISABLED,
        ]);
        assert!(f.gov.add_rule(&f.authority, addr("g"), v, "f()").is_ok());
    }
}
