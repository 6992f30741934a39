//! # Funding Ledger
//!
//! Tracks purchases of pool space for the current round.
//!
//! ## Guarantees
//!
//! 1. **Bounded**: committed units never exceed `CAPACITY`
//! 2. **All-or-nothing**: a request that does not fit is rejected whole
//! 3. **No drift**: committed and remaining are derived from the purchase list,
//!    never stored beside it
//!
//! The ledger does not know about round phases; the state machine checks the
//! phase before calling [`FundingLedger::commit`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PurchaseRejection, WheelError, WheelResult};

/// Fundable units per round (percentage points).
pub const CAPACITY: u32 = 100;

/// Opaque participant identifier (a wallet address in practice).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An accepted purchase. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// 1-based position within the round.
    pub sequence: u64,
    /// Who bought the space.
    pub participant: ParticipantId,
    /// Units bought, in `1..=CAPACITY`.
    pub units: u32,
    /// Quoted price in minor currency units (`units * unit_price`).
    pub cost: u64,
}

/// Units and spend per participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantShare {
    /// The participant.
    pub participant: ParticipantId,
    /// Total units held this round.
    pub units: u32,
    /// Total quoted cost this round.
    pub cost: u64,
}

/// Purchases against the round's capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingLedger {
    unit_price: u64,
    purchases: Vec<Purchase>,
}

impl FundingLedger {
    /// Creates an empty ledger quoting `unit_price` per unit.
    #[must_use]
    pub fn new(unit_price: u64) -> Self {
        Self {
            unit_price,
            purchases: Vec::new(),
        }
    }

    /// Rebuilds a ledger from a saved purchase list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any purchase is empty or the total
    /// exceeds capacity.
    pub fn restore(unit_price: u64, purchases: Vec<Purchase>) -> WheelResult<Self> {
        let mut total: u64 = 0;
        for purchase in &purchases {
            if purchase.units == 0 {
                return Err(WheelError::InvalidConfiguration(format!(
                    "saved purchase {} has zero units",
                    purchase.sequence
                )));
            }
            total += u64::from(purchase.units);
        }
        if total > u64::from(CAPACITY) {
            return Err(WheelError::InvalidConfiguration(format!(
                "saved purchases total {total} units, capacity is {CAPACITY}"
            )));
        }
        Ok(Self {
            unit_price,
            purchases,
        })
    }

    /// Total fundable units.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        CAPACITY
    }

    /// Price quoted per unit.
    #[inline]
    #[must_use]
    pub const fn unit_price(&self) -> u64 {
        self.unit_price
    }

    /// Units accepted so far.
    #[must_use]
    pub fn committed(&self) -> u32 {
        self.purchases.iter().map(|p| p.units).sum()
    }

    /// Units still available.
    #[must_use]
    pub fn remaining_space(&self) -> u32 {
        CAPACITY - self.committed()
    }

    /// Returns true once every unit is sold.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.remaining_space() == 0
    }

    /// Accepted purchases, in acceptance order.
    #[inline]
    #[must_use]
    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    /// Checks a request without recording it.
    ///
    /// # Errors
    ///
    /// `NonPositiveUnits` for `units <= 0`, `ExceedsRemainingSpace` if it
    /// does not fit.
    pub fn check(&self, units: i64) -> Result<u32, PurchaseRejection> {
        if units <= 0 {
            return Err(PurchaseRejection::NonPositiveUnits { requested: units });
        }
        let remaining = self.remaining_space();
        if units > i64::from(remaining) {
            return Err(PurchaseRejection::ExceedsRemainingSpace {
                requested: units,
                remaining,
            });
        }
        // units <= remaining <= CAPACITY, so the cast is lossless
        Ok(units as u32)
    }

    /// Records a purchase if it fits. A rejected request leaves the ledger untouched.
    ///
    /// # Errors
    ///
    /// See [`FundingLedger::check`].
    pub fn commit(
        &mut self,
        participant: ParticipantId,
        units: i64,
    ) -> Result<Purchase, PurchaseRejection> {
        let units = self.check(units)?;
        let purchase = Purchase {
            sequence: self.purchases.len() as u64 + 1,
            participant,
            units,
            cost: u64::from(units).saturating_mul(self.unit_price),
        };
        self.purchases.push(purchase.clone());
        Ok(purchase)
    }

    /// Units held by `participant` this round.
    #[must_use]
    pub fn units_for(&self, participant: &ParticipantId) -> u32 {
        self.purchases
            .iter()
            .filter(|p| &p.participant == participant)
            .map(|p| p.units)
            .sum()
    }

    /// Per-participant totals, in order of each participant's first purchase.
    #[must_use]
    pub fn shares(&self) -> Vec<ParticipantShare> {
        let mut shares: Vec<ParticipantShare> = Vec::new();
        for purchase in &self.purchases {
            match shares.iter_mut().find(|s| s.participant == purchase.participant) {
                Some(share) => {
                    share.units += purchase.units;
                    share.cost = share.cost.saturating_add(purchase.cost);
                }
                None => shares.push(ParticipantShare {
                    participant: purchase.participant.clone(),
                    units: purchase.units,
                    cost: purchase.cost,
                }),
            }
        }
        shares
    }

    /// Sum of quoted costs.
    #[must_use]
    pub fn total_cost(&self) -> u64 {
        self.purchases
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.cost))
    }

    /// Empties the ledger, returning what was in it.
    pub fn clear(&mut self) -> Vec<Purchase> {
        std::mem::take(&mut self.purchases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    #[test]
    fn test_fill_exactly() {
        let mut ledger = FundingLedger::new(10);
        let first = ledger.commit(wallet("alice"), 40).unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.cost, 400);
        assert_eq!(ledger.remaining_space(), 60);
        assert!(!ledger.is_full());

        ledger.commit(wallet("bob"), 60).unwrap();
        assert_eq!(ledger.committed(), 100);
        assert_eq!(ledger.remaining_space(), 0);
        assert!(ledger.is_full());
    }

    #[test]
    fn test_overfill_rejected_whole() {
        let mut ledger = FundingLedger::new(1);
        ledger.commit(wallet("alice"), 50).unwrap();

        let err = ledger.commit(wallet("bob"), 60).unwrap_err();
        assert_eq!(
            err,
            PurchaseRejection::ExceedsRemainingSpace {
                requested: 60,
                remaining: 50
            }
        );
        assert!(err.to_string().contains("exceeds remaining space"));
        assert_eq!(ledger.committed(), 50);
        assert_eq!(ledger.purchases().len(), 1);
    }

    #[test]
    fn test_non_positive_rejected() {
        let mut ledger = FundingLedger::new(1);
        for units in [0, -5, i64::MIN] {
            assert_eq!(
                ledger.commit(wallet("mallory"), units),
                Err(PurchaseRejection::NonPositiveUnits { requested: units })
            );
        }
        assert_eq!(ledger.committed(), 0);
    }

    #[test]
    fn test_huge_request_rejected() {
        let mut ledger = FundingLedger::new(1);
        let err = ledger.commit(wallet("whale"), i64::MAX).unwrap_err();
        assert!(matches!(err, PurchaseRejection::ExceedsRemainingSpace { .. }));
    }

    #[test]
    fn test_shares_aggregate_in_first_purchase_order() {
        let mut ledger = FundingLedger::new(2);
        ledger.commit(wallet("bob"), 10).unwrap();
        ledger.commit(wallet("alice"), 20).unwrap();
        ledger.commit(wallet("bob"), 5).unwrap();

        let shares = ledger.shares();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].participant, wallet("bob"));
        assert_eq!(shares[0].units, 15);
        assert_eq!(shares[0].cost, 30);
        assert_eq!(shares[1].units, 20);
        assert_eq!(ledger.units_for(&wallet("bob")), 15);
        assert_eq!(ledger.units_for(&wallet("carol")), 0);
        assert_eq!(ledger.total_cost(), 70);
    }

    #[test]
    fn test_clear_returns_purchases() {
        let mut ledger = FundingLedger::new(1);
        ledger.commit(wallet("alice"), 30).unwrap();
        let drained = ledger.clear();
        assert_eq!(drained.len(), 1);
        assert_eq!(ledger.committed(), 0);
        assert!(ledger.purchases().is_empty());

        // Sequence restarts with the next round
        assert_eq!(ledger.commit(wallet("bob"), 1).unwrap().sequence, 1);
    }

    #[test]
    fn test_restore_validates_capacity() {
        let over = vec![
            Purchase {
                sequence: 1,
                participant: wallet("a"),
                units: 70,
                cost: 0,
            },
            Purchase {
                sequence: 2,
                participant: wallet("b"),
                units: 40,
                cost: 0,
            },
        ];
        assert!(FundingLedger::restore(1, over).is_err());

        let ok = vec![Purchase {
            sequence: 1,
            participant: wallet("a"),
            units: 70,
            cost: 70,
        }];
        let ledger = FundingLedger::restore(1, ok).unwrap();
        assert_eq!(ledger.remaining_space(), 30);
    }
}
