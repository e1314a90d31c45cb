//! The governance proxy: the stable address that owns every governed
//! contract and forwards passed ballots to whichever Governance
//! implementation it currently points at.

use jointer_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ballot::ExecutionReceipt;
use crate::call::{Call, CallReturn};
use crate::engine::{Execution, Governance};
use crate::error::GovernanceError;
use crate::weights::WeightSource;

/// One implementation switch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrade {
    pub from: Address,
    pub to: Address,
    pub at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceProxy {
    address: Address,
    implementation: Address,
    /// Deployer key allowed to upgrade outside of a vote, until renounced.
    admin: Option<Address>,
    history: Vec<Upgrade>,
}

impl GovernanceProxy {
    pub fn new(address: Address, implementation: Address, admin: Address) -> Self {
        Self {
            address,
            implementation,
            admin: Some(admin),
            history: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn implementation(&self) -> Address {
        self.implementation
    }

    pub fn admin(&self) -> Option<Address> {
        self.admin
    }

    pub fn history(&self) -> &[Upgrade] {
        &self.history
    }

    fn authorize(&self, caller: &Address) -> Result<(), GovernanceError> {
        if *caller == self.address || self.admin.as_ref() == Some(caller) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized(*caller))
        }
    }

    /// Point the proxy at another deployed implementation.
    ///
    /// Allowed for the proxy itself (a passed `upgradeTo` ballot) and the
    /// admin. `is_deployed` tells whether `implementation` exists.
    pub fn upgrade_to<F>(
        &mut self,
        caller: &Address,
        implementation: Address,
        is_deployed: F,
        now: Timestamp,
    ) -> Result<(), GovernanceError>
    where
        F: Fn(&Address) -> bool,
    {
        self.authorize(caller)?;
        if !is_deployed(&implementation) {
            return Err(GovernanceError::UnknownContract(implementation));
        }
        let from = self.implementation;
        self.implementation = implementation;
        self.history.push(Upgrade {
            from,
            to: implementation,
            at: now,
        });
        info!(proxy = %self.address, %from, to = %implementation, "implementation upgraded");
        Ok(())
    }

    /// Give up the admin key; afterwards only votes can upgrade.
    pub fn renounce_admin(&mut self, caller: &Address) -> Result<(), GovernanceError> {
        match self.admin {
            Some(admin) if admin == *caller => {
                self.admin = None;
                info!(proxy = %self.address, "admin renounced");
                Ok(())
            }
            _ => Err(GovernanceError::Unauthorized(*caller)),
        }
    }

    /// Calls addressed to the proxy itself. Only `upgradeTo(address)` exists.
    pub fn invoke<F>(
        &mut self,
        caller: &Address,
        call: &Call,
        is_deployed: F,
        now: Timestamp,
    ) -> Result<CallReturn, GovernanceError>
    where
        F: Fn(&Address) -> bool,
    {
        if call.target != self.address {
            return Err(GovernanceError::UnknownContract(call.target));
        }
        match call.signature().as_str() {
            "upgradeTo(address)" => {
                self.upgrade_to(caller, call.address(0)?, is_deployed, now)?;
                Ok(CallReturn::Unit)
            }
            _ => Err(call.unknown().into()),
        }
    }

    /// Execute a passed ballot of the current implementation.
    ///
    /// `dispatch` performs the call with the proxy as sender; it receives the
    /// implementation back so calls targeting governance itself can go
    /// through. A ballot already executed returns its stored receipt without
    /// dispatching again. A failed dispatch leaves the ballot executable.
    pub fn forward<W, E, F>(
        &self,
        governance: &mut Governance<W>,
        ballot_id: u64,
        now: Timestamp,
        dispatch: F,
    ) -> Result<ExecutionReceipt, E>
    where
        W: WeightSource,
        E: From<GovernanceError>,
        F: FnOnce(&mut Governance<W>, &Address, &Call) -> Result<CallReturn, E>,
    {
        if governance.address() != self.implementation {
            return Err(GovernanceError::UnknownContract(governance.address()).into());
        }
        match governance.begin_execution(ballot_id)? {
            Execution::Done(receipt) => Ok(receipt),
            Execution::Pending(call) => {
                let result = dispatch(governance, &self.address, &call)?;
                Ok(governance.complete_execution(ballot_id, result, now)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;

    use jointer_nullables::NullTokenLedger;
    use jointer_types::TokenClass;

    use super::*;
    use crate::call::{ArgValue, Selector};
    use crate::config::GovernanceConfig;
    use crate::threshold::ThresholdVector;
    use crate::weights::TokenWeights;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn proxy() -> GovernanceProxy {
        GovernanceProxy::new(addr("proxy"), addr("impl-v1"), addr("deployer"))
    }

    fn deployed(a: &Address) -> bool {
        *a == addr("impl-v1") || *a == addr("impl-v2")
    }

    // ── Upgrades ─────────────────────────────────────────────────────────

    #[test]
    fn admin_and_self_may_upgrade() {
        let mut p = proxy();
        p.upgrade_to(&addr("deployer"), addr("impl-v2"), deployed, Timestamp::new(1))
            .unwrap();
        p.upgrade_to(&addr("proxy"), addr("impl-v1"), deployed, Timestamp::new(2))
            .unwrap();
        assert_eq!(p.implementation(), addr("impl-v1"));
        assert_eq!(p.history().len(), 2);
        assert_eq!(p.history()[0].to, addr("impl-v2"));
    }

    #[test]
    fn stranger_cannot_upgrade() {
        let mut p = proxy();
        assert_eq!(
            p.upgrade_to(&addr("mallory"), addr("impl-v2"), deployed, Timestamp::EPOCH)
                .unwrap_err(),
            GovernanceError::Unauthorized(addr("mallory"))
        );
        assert_eq!(p.implementation(), addr("impl-v1"));
    }

    #[test]
    fn upgrade_requires_deployed_implementation() {
        let mut p = proxy();
        assert_eq!(
            p.upgrade_to(&addr("deployer"), addr("nowhere"), deployed, Timestamp::EPOCH)
                .unwrap_err(),
            GovernanceError::UnknownContract(addr("nowhere"))
        );
        assert!(p.history().is_empty());
    }

    #[test]
    fn renounced_admin_loses_upgrade_rights() {
        let mut p = proxy();
        p.renounce_admin(&addr("deployer")).unwrap();
        assert!(p.admin().is_none());
        assert!(p
            .upgrade_to(&addr("deployer"), addr("impl-v2"), deployed, Timestamp::EPOCH)
            .is_err());
        assert!(p.renounce_admin(&addr("deployer")).is_err());
    }

    #[test]
    fn upgrade_via_call() {
        let mut p = proxy();
        let call = Call::new(
            addr("proxy"),
            Selector::parse("upgradeTo(address)").unwrap(),
            vec![ArgValue::Address(addr("impl-v2"))],
        )
        .unwrap();
        assert_eq!(
            p.invoke(&addr("proxy"), &call, deployed, Timestamp::EPOCH).unwrap(),
            CallReturn::Unit
        );
        assert_eq!(p.implementation(), addr("impl-v2"));
    }

    // ── Forwarding ───────────────────────────────────────────────────────

    fn passed_ballot() -> Governance<TokenWeights> {
        let authority = addr("deployer");
        let token = Arc::new(NullTokenLedger::new());
        token.set_total_supply(100);
        token.set_balance(addr("holder"), 100);
        let mut g = Governance::new(
            addr("impl-v1"),
            authority,
            addr("ceo"),
            &GovernanceConfig::default(),
            TokenWeights::new().with_token(TokenClass::Primary, token),
        )
        .unwrap();
        g.set_governance_proxy(&authority, addr("proxy")).unwrap();
        g.update_close_time(&authority, Timestamp::EPOCH).unwrap();
        g.add_rule(
            &authority,
            addr("impl-v1"),
            ThresholdVector::absolute_for(TokenClass::Primary),
            "setAbsoluteLevel(uint256)",
        )
        .unwrap();
        let id = g
            .propose(addr("holder"), 0, vec![ArgValue::Uint(95)], Timestamp::EPOCH)
            .unwrap();
        g.cast_vote(id, addr("holder"), true, Timestamp::EPOCH).unwrap();
        g
    }

    #[test]
    fn forward_runs_self_call_once() {
        let p = proxy();
        let mut g = passed_ballot();
        let dispatched = Cell::new(0);
        let dispatch = |g: &mut Governance<TokenWeights>, sender: &Address, call: &Call| {
            dispatched.set(dispatched.get() + 1);
            g.invoke(sender, call, Timestamp::new(5))
        };

        let first = p.forward(&mut g, 0, Timestamp::new(5), dispatch).unwrap();
        assert_eq!(g.levels().absolute(), 95);
        let second = p
            .forward(&mut g, 0, Timestamp::new(9), |g: &mut Governance<TokenWeights>, s: &Address, c: &Call| {
                dispatched.set(dispatched.get() + 1);
                g.invoke(s, c, Timestamp::new(9))
            })
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(dispatched.get(), 1);
    }

    #[test]
    fn failed_dispatch_keeps_ballot_executable() {
        let p = proxy();
        let mut g = passed_ballot();
        let err = p
            .forward(&mut g, 0, Timestamp::new(5), |_: &mut Governance<TokenWeights>, _: &Address, _: &Call| {
                Err(GovernanceError::Unauthorized(addr("x")))
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::Unauthorized(addr("x")));
        assert!(!g.ballot(0).unwrap().is_executed());
        assert!(p
            .forward(&mut g, 0, Timestamp::new(6), |g: &mut Governance<TokenWeights>, s: &Address, c: &Call| {
                g.invoke(s, c, Timestamp::new(6))
            })
            .is_ok());
    }

    #[test]
    fn forward_rejects_stale_implementation() {
        let mut p = proxy();
        p.upgrade_to(&addr("deployer"), addr("impl-v2"), deployed, Timestamp::EPOCH)
            .unwrap();
        let mut g = passed_ballot();
        let err = p
            .forward(&mut g, 0, Timestamp::new(5), |g: &mut Governance<TokenWeights>, s: &Address, c: &Call| {
                g.invoke(s, c, Timestamp::new(5))
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::UnknownContract(addr("impl-v1")));
    }
}
