//! Managed contracts outside this workspace.

use jointer_governance::{Call, CallReturn};
use jointer_types::{Address, Timestamp};

use crate::error::ControlError;

/// A contract owned by a governance proxy and driven by passed ballots, such
/// as an auction or a real-estate wallet, registered with the control plane
/// by address.
///
/// Implementations decode `call` into their own operations and must reject
/// selectors they do not know.
pub trait ExternalContract: Send {
    fn address(&self) -> Address;

    fn invoke(
        &mut self,
        caller: &Address,
        call: &Call,
        now: Timestamp,
    ) -> Result<CallReturn, ControlError>;
}
