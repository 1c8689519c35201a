// Label-independent comparison of two splits.

use crate::model::TeamPair;

/// Whether two pairs partition the same participants the same way,
/// regardless of which team is labelled A.
///
/// Membership is compared as sorted id sets, so ordering and duplicate
/// entries inside a team do not matter.
pub fn same_split(left: &TeamPair, right: &TeamPair) -> bool {
    let (la, lb) = (left.a.id_set(), left.b.id_set());
    let (ra, rb) = (right.a.id_set(), right.b.id_set());
    (la == ra && lb == rb) || (la == rb && lb == ra)
}
