//! Property-based tests for the three-way membership diff.
//!
//! Properties verified over arbitrary (applied, desired, live) triples:
//! - additions never target a member the remote already has
//! - applying the diff to the live set converges it on the desired set,
//!   leaving unmanaged live members alone
//! - the diff is idempotent once live equals desired

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeSet;

use proptest::prelude::*;

use regroup_core::{MemberRef, MemberSet};
use regroup_reconciler::member_diff;

/// Build a member set from indices into a small shared universe.
fn member_set(indices: &BTreeSet<usize>) -> MemberSet {
    indices
        .iter()
        .map(|i| MemberRef::new(format!("zones/z/instances/m{i}")))
        .collect()
}

fn subset() -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::btree_set(0..8usize, 0..8)
}

proptest! {
    /// Additions never intersect the live set: the remote rejects adding a
    /// present member as a hard error.
    #[test]
    fn additions_never_target_live_members(
        applied in subset(),
        desired in subset(),
        live in subset(),
    ) {
        let (applied, desired, live) =
            (member_set(&applied), member_set(&desired), member_set(&live));
        let diff = member_diff(&applied, &desired, &live);

        prop_assert!(diff.to_add.intersection(&live).is_empty());
        prop_assert!(diff.to_add.intersection(&diff.to_remove).is_empty());
    }

    /// Removals only ever target previously-applied members that are no
    /// longer desired.
    #[test]
    fn removals_come_from_the_applied_record(
        applied in subset(),
        desired in subset(),
        live in subset(),
    ) {
        let (applied, desired, live) =
            (member_set(&applied), member_set(&desired), member_set(&live));
        let diff = member_diff(&applied, &desired, &live);

        prop_assert_eq!(diff.to_remove.intersection(&applied).len(), diff.to_remove.len());
        prop_assert!(diff.to_remove.intersection(&desired).is_empty());
    }

    /// Applying removals then additions to the live set yields every desired
    /// member, and anything extra is an unmanaged live member (never applied,
    /// never desired).
    #[test]
    fn applying_the_diff_converges_on_desired(
        applied in subset(),
        desired in subset(),
        live in subset(),
    ) {
        let (applied, desired, live) =
            (member_set(&applied), member_set(&desired), member_set(&live));
        let diff = member_diff(&applied, &desired, &live);

        let converged = live.difference(&diff.to_remove).union(&diff.to_add);

        prop_assert_eq!(converged.intersection(&desired), desired.clone());
        let leftovers = converged.difference(&desired);
        prop_assert!(leftovers.intersection(&applied).is_empty());
        prop_assert_eq!(leftovers.intersection(&live).len(), leftovers.len());
    }

    /// Once live equals desired, the diff computes no additions, whatever
    /// the applied record says.
    #[test]
    fn live_equal_to_desired_adds_nothing(
        applied in subset(),
        desired in subset(),
    ) {
        let (applied, desired) = (member_set(&applied), member_set(&desired));
        let diff = member_diff(&applied, &desired, &desired);

        prop_assert!(diff.to_add.is_empty());
    }
}

#[test]
fn bootstrap_and_teardown_extremes() {
    let full = member_set(&(0..4).collect());
    let empty = MemberSet::new();

    let bootstrap = member_diff(&empty, &full, &empty);
    assert_eq!(bootstrap.to_add, full);
    assert!(bootstrap.to_remove.is_empty());

    let teardown = member_diff(&full, &empty, &full);
    assert!(teardown.to_add.is_empty());
    assert_eq!(teardown.to_remove, full);
}
