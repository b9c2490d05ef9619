//! Three-way membership diff.
//!
//! The diff is a pure function of three sets so it can be property-tested
//! exhaustively without network mocks; idempotent absence-tolerance belongs
//! to the mutation layer, not here.

use regroup_core::MemberSet;

/// Computed add/remove intent for one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDiff {
    /// Members to add to the live group.
    pub to_add: MemberSet,
    /// Members to remove from the live group.
    pub to_remove: MemberSet,
}

impl MemberDiff {
    /// Whether the diff computes no action.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the minimal add/remove sets driving `live` toward `desired`.
///
/// The two sides are deliberately asymmetric:
///
/// - `to_add` is every desired member absent from `live`. Checking live
///   keeps the add path safe against concurrent external additions (the
///   remote rejects adding a present member as a hard error) and re-adds
///   declared members that drifted out of the group, even when the applied
///   record still lists them.
/// - `to_remove` is every previously-applied member no longer desired,
///   regardless of live presence. The diff reports intent; removing an
///   already-absent member is a harmless no-op at the mutation layer.
///
/// An empty `applied` is the bootstrap case: every live-absent desired
/// member is added and nothing is removed.
pub fn member_diff(applied: &MemberSet, desired: &MemberSet, live: &MemberSet) -> MemberDiff {
    MemberDiff {
        to_add: desired.difference(live),
        to_remove: applied.difference(desired),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use regroup_core::MemberRef;

    fn set(refs: &[&str]) -> MemberSet {
        refs.iter().copied().map(MemberRef::from).collect()
    }

    #[test]
    fn replaced_member_is_swapped() {
        // applied {i1,i2}, desired {i2,i3}, live {i1,i2}
        let diff = member_diff(&set(&["i1", "i2"]), &set(&["i2", "i3"]), &set(&["i1", "i2"]));
        assert_eq!(diff.to_add, set(&["i3"]));
        assert_eq!(diff.to_remove, set(&["i1"]));
    }

    #[test]
    fn member_added_out_of_band_is_not_re_added() {
        // applied {i1,i2}, desired {i1,i2,i3}, live {i1,i2,i3}: i3 arrived
        // externally, adding it again would be a hard remote error.
        let diff = member_diff(
            &set(&["i1", "i2"]),
            &set(&["i1", "i2", "i3"]),
            &set(&["i1", "i2", "i3"]),
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn live_equal_to_desired_computes_nothing() {
        let desired = set(&["a", "b", "c"]);
        for applied in [set(&[]), set(&["a"]), set(&["a", "b", "c"]), set(&["x"])] {
            let diff = member_diff(&applied, &desired, &desired);
            assert!(diff.to_add.is_empty(), "applied={applied:?}");
        }
    }

    #[test]
    fn bootstrap_adds_everything() {
        let diff = member_diff(&set(&[]), &set(&["a", "b"]), &set(&[]));
        assert_eq!(diff.to_add, set(&["a", "b"]));
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn full_teardown_removes_the_applied_set() {
        let applied = set(&["a", "b"]);
        let diff = member_diff(&applied, &set(&[]), &set(&["a", "x"]));
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, applied);
    }

    #[test]
    fn externally_removed_declared_member_is_re_added() {
        // b was applied and desired but vanished from live: drift repair.
        let diff = member_diff(&set(&["a", "b"]), &set(&["a", "b"]), &set(&["a"]));
        assert_eq!(diff.to_add, set(&["b"]));
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn add_never_intersects_live() {
        let universe = ["a", "b", "c"];
        // Sweep every (applied, desired, live) triple over a small universe.
        for mask in 0u16..(1 << 9) {
            let pick = |offset: u16| -> MemberSet {
                universe
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask >> (offset + *i as u16) & 1 == 1)
                    .map(|(_, r)| MemberRef::from(*r))
                    .collect()
            };
            let (applied, desired, live) = (pick(0), pick(3), pick(6));
            let diff = member_diff(&applied, &desired, &live);
            assert!(diff.to_add.intersection(&live).is_empty());
            assert!(diff.to_add.intersection(&diff.to_remove).is_empty());
        }
    }
}
