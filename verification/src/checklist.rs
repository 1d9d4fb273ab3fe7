//! Checklist vocabularies per verification kind.
//!
//! Every item must be confirmed before a task of that kind can be submitted.

use crate::types::TaskKind;

const VILLAGE_ITEMS: &[&str] = &[
    "gram_sabha_resolution",
    "site_inspected",
    "beneficiary_list_verified",
    "scheme_convergence_checked",
];

const COMMITTEE_ITEMS: &[&str] = &[
    "committee_constituted",
    "member_identity_verified",
    "meeting_minutes_reviewed",
];

const AGENCY_ITEMS: &[&str] = &[
    "agency_registration_verified",
    "technical_capacity_verified",
    "past_performance_reviewed",
];

/// Checklist item ids for a task kind, in display order.
pub fn checklist_items(kind: TaskKind) -> &'static [&'static str] {
    match kind {
        TaskKind::Village => VILLAGE_ITEMS,
        TaskKind::Committee => COMMITTEE_ITEMS,
        TaskKind::Agency => AGENCY_ITEMS,
    }
}

/// Whether `item_id` belongs to the kind's checklist.
pub fn is_checklist_item(kind: TaskKind, item_id: &str) -> bool {
    checklist_items(kind).contains(&item_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_items() {
        for kind in TaskKind::all() {
            assert!(!checklist_items(kind).is_empty());
        }
    }

    #[test]
    fn test_items_do_not_cross_kinds() {
        assert!(is_checklist_item(TaskKind::Village, "site_inspected"));
        assert!(!is_checklist_item(TaskKind::Agency, "site_inspected"));
        assert!(!is_checklist_item(TaskKind::Committee, "agency_registration_verified"));
    }
}
