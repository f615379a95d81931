//! Task status, priority, and assignee bookkeeping.

use std::collections::BTreeSet;

use crate::types::DbId;

string_enum! {
    /// Task lifecycle state.
    TaskStatus {
        Todo = "todo",
        InProgress = "in_progress",
        Done = "done",
    }
}

impl TaskStatus {
    /// Statuses swept for deadline notifications.
    pub const OPEN: &'static [TaskStatus] = &[TaskStatus::Todo, TaskStatus::InProgress];

    pub fn is_open(self) -> bool {
        !matches!(self, TaskStatus::Done)
    }
}

string_enum! {
    /// Task urgency.
    #[derive(Default)]
    Priority {
        Low = "low",
        #[default]
        Normal = "normal",
        High = "high",
        Urgent = "urgent",
    }
}

impl Priority {
    /// Position on the ERP's four-point priority scale.
    pub fn erp_level(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }
}

/// How much of a task an actor may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEditScope {
    /// Any field, including assignees.
    Full,
    /// Only the `status` field, and nothing else in the same request.
    StatusOnly,
}

/// Assignees present in `requested` but not in `current`, in ascending id
/// order. These are the users the auto-membership and task-assigned
/// side effects fire for; removals trigger nothing.
pub fn new_assignees(current: &[DbId], requested: &[DbId]) -> Vec<DbId> {
    let current: BTreeSet<DbId> = current.iter().copied().collect();
    requested
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|id| !current.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_is_the_only_closed_status() {
        assert!(TaskStatus::Todo.is_open());
        assert!(TaskStatus::InProgress.is_open());
        assert!(!TaskStatus::Done.is_open());
        assert_eq!(TaskStatus::OPEN.len(), 2);
    }

    #[test]
    fn priority_maps_to_erp_scale() {
        assert_eq!(Priority::Low.erp_level(), 0);
        assert_eq!(Priority::Normal.erp_level(), 1);
        assert_eq!(Priority::High.erp_level(), 2);
        assert_eq!(Priority::Urgent.erp_level(), 3);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn parses_wire_values() {
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn new_assignees_ignores_existing_and_duplicates() {
        assert_eq!(new_assignees(&[1, 2], &[2, 3, 3, 4]), vec![3, 4]);
        assert!(new_assignees(&[1, 2], &[1]).is_empty());
        assert_eq!(new_assignees(&[], &[7]), vec![7]);
    }
}
