//! Per-request floor enforcement decision.

use crate::rules::FloorRulesDocument;
use crate::validation::RATE_MAX;

/// Decide whether floors are enforced on this request.
///
/// The decision is persisted into `enforcement.enforcepbs` and the
/// document's request-scoped marker, so repeated calls for the same
/// request return the same answer without drawing again.
pub fn should_enforce_floors(
    doc: &mut FloorRulesDocument,
    configured_rate: i32,
    mut draw: impl FnMut(i32) -> i32,
) -> bool {
    if doc.is_skipped() {
        return false;
    }
    if let Some(decided) = doc.enforce_decision {
        return decided;
    }

    let enforcement = doc.enforcement.get_or_insert_with(Default::default);
    if enforcement.enforce_pbs == Some(false) {
        doc.enforce_decision = Some(false);
        return false;
    }

    let rate = if enforcement.enforce_rate > 0 {
        enforcement.enforce_rate
    } else {
        configured_rate
    };
    let enforce = rate > draw(RATE_MAX + 1);

    enforcement.enforce_pbs = Some(enforce);
    doc.enforce_decision = Some(enforce);
    enforce
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
