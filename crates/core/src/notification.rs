//! Notification kinds, deadline windows, recipients, and rendered content.

use std::collections::BTreeSet;

use chrono::Duration;

use crate::project::ProjectType;
use crate::types::{Date, DbId};

string_enum! {
    /// What a notification is about.
    NotificationKind {
        Deadline3Days = "deadline_3days",
        Deadline1Day = "deadline_1day",
        DeadlineToday = "deadline_today",
        DeadlineOverdue = "deadline_overdue",
        ProjectAssigned = "project_assigned",
        ProjectLeadAssigned = "project_lead_assigned",
        TaskAssigned = "task_assigned",
    }
}

impl NotificationKind {
    /// The four kinds produced by the deadline sweep, in sweep order.
    pub const DEADLINE: &'static [NotificationKind] = &[
        NotificationKind::Deadline3Days,
        NotificationKind::Deadline1Day,
        NotificationKind::DeadlineToday,
        NotificationKind::DeadlineOverdue,
    ];

    /// Deadline kinds deduplicate per calendar day; every other kind is
    /// created at most once per (recipient, target).
    pub fn is_deadline(self) -> bool {
        Self::DEADLINE.contains(&self)
    }
}

/// Which tasks a deadline kind selects, relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineWindow {
    /// `deadline == date`
    On(Date),
    /// `deadline < date`
    Before(Date),
}

impl DeadlineWindow {
    /// Window for `kind` on `today`. `None` for non-deadline kinds.
    pub fn for_kind(kind: NotificationKind, today: Date) -> Option<Self> {
        match kind {
            NotificationKind::Deadline3Days => Some(Self::On(today + Duration::days(3))),
            NotificationKind::Deadline1Day => Some(Self::On(today + Duration::days(1))),
            NotificationKind::DeadlineToday => Some(Self::On(today)),
            NotificationKind::DeadlineOverdue => Some(Self::Before(today)),
            _ => None,
        }
    }

    pub fn contains(self, deadline: Date) -> bool {
        match self {
            Self::On(date) => deadline == date,
            Self::Before(date) => deadline < date,
        }
    }
}

/// Deadline kind that applies to a task due on `deadline`, if any.
pub fn deadline_kind(deadline: Date, today: Date) -> Option<NotificationKind> {
    NotificationKind::DEADLINE.iter().copied().find(|kind| {
        DeadlineWindow::for_kind(*kind, today).is_some_and(|w| w.contains(deadline))
    })
}

/// Assignees plus the project lead, each once.
pub fn deadline_recipients(assignees: &[DbId], lead_id: Option<DbId>) -> BTreeSet<DbId> {
    assignees.iter().copied().chain(lead_id).collect()
}

/// Title and message of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub message: String,
}

impl NotificationContent {
    fn new(title: impl Into<String>, message: String) -> Self {
        Self {
            title: title.into(),
            message,
        }
    }

    /// Content for a deadline kind. The overdue message carries the number
    /// of days overdue as of `today`. `None` for non-deadline kinds.
    pub fn deadline(
        kind: NotificationKind,
        task_title: &str,
        deadline: Date,
        today: Date,
    ) -> Option<Self> {
        let detail = match kind {
            NotificationKind::Deadline3Days => deadline.format("%d/%m/%Y").to_string(),
            NotificationKind::DeadlineOverdue => {
                format!("{} day(s) overdue", (today - deadline).num_days())
            }
            other => deadline_detail(other)?.to_string(),
        };
        Some(Self::new(deadline_title(kind)?, format!("{task_title} • {detail}")))
    }

    /// Content for a deadline notification pushed by the ERP. The ERP does
    /// not send a day count, so overdue messages omit it.
    pub fn remote_deadline(
        kind: NotificationKind,
        task_title: &str,
        deadline: Option<Date>,
    ) -> Option<Self> {
        let title = deadline_title(kind)?;
        let message = match (kind, deadline) {
            (NotificationKind::Deadline3Days, Some(d)) => {
                format!("{task_title} • {}", d.format("%d/%m"))
            }
            (NotificationKind::Deadline3Days, None) => task_title.to_string(),
            (NotificationKind::DeadlineOverdue, _) => format!("{task_title} • Overdue"),
            (other, _) => format!("{task_title} • {}", deadline_detail(other)?),
        };
        Some(Self::new(title, message))
    }

    pub fn task_assigned(task_title: &str, deadline: Option<Date>) -> Self {
        let when = deadline
            .map(|d| d.format("%d/%m").to_string())
            .unwrap_or_else(|| "No deadline".to_string());
        Self::new("New task assigned", format!("{task_title} • {when}"))
    }

    pub fn project_assigned(project_title: &str, project_type: ProjectType) -> Self {
        Self::new(
            "New project assigned",
            format!("{project_title} • {}", project_type.label()),
        )
    }

    pub fn project_lead_assigned(project_title: &str, project_type: ProjectType) -> Self {
        Self::new(
            "You were designated project lead",
            format!("{project_title} • {} • awaiting your answer", project_type.label()),
        )
    }
}

fn deadline_title(kind: NotificationKind) -> Option<&'static str> {
    match kind {
        NotificationKind::Deadline3Days => Some("Deadline in 3 days"),
        NotificationKind::Deadline1Day => Some("Deadline tomorrow"),
        NotificationKind::DeadlineToday => Some("Deadline TODAY"),
        NotificationKind::DeadlineOverdue => Some("Task overdue"),
        _ => None,
    }
}

fn deadline_detail(kind: NotificationKind) -> Option<&'static str> {
    match kind {
        NotificationKind::Deadline1Day => Some("Due tomorrow"),
        NotificationKind::DeadlineToday => Some("Due today"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn deadline_kinds_by_distance() {
        let today = day(2026, 3, 10);
        assert_eq!(
            deadline_kind(day(2026, 3, 13), today),
            Some(NotificationKind::Deadline3Days)
        );
        assert_eq!(
            deadline_kind(day(2026, 3, 11), today),
            Some(NotificationKind::Deadline1Day)
        );
        assert_eq!(deadline_kind(today, today), Some(NotificationKind::DeadlineToday));
        assert_eq!(
            deadline_kind(day(2026, 2, 28), today),
            Some(NotificationKind::DeadlineOverdue)
        );
        assert_eq!(deadline_kind(day(2026, 3, 12), today), None);
        assert_eq!(deadline_kind(day(2026, 3, 20), today), None);
    }

    #[test]
    fn windows_cross_month_boundaries() {
        let today = day(2026, 1, 30);
        assert_eq!(
            DeadlineWindow::for_kind(NotificationKind::Deadline3Days, today),
            Some(DeadlineWindow::On(day(2026, 2, 2)))
        );
        assert_eq!(
            DeadlineWindow::for_kind(NotificationKind::TaskAssigned, today),
            None
        );
    }

    #[test]
    fn recipients_merge_lead_and_assignees() {
        let r = deadline_recipients(&[3, 1, 3], Some(1));
        assert_eq!(r.into_iter().collect::<Vec<_>>(), vec![1, 3]);

        let r = deadline_recipients(&[], Some(9));
        assert_eq!(r.into_iter().collect::<Vec<_>>(), vec![9]);

        assert!(deadline_recipients(&[], None).is_empty());
    }

    #[test]
    fn overdue_message_counts_days() {
        let c = NotificationContent::deadline(
            NotificationKind::DeadlineOverdue,
            "Mix reel",
            day(2026, 3, 7),
            day(2026, 3, 10),
        )
        .unwrap();
        assert_eq!(c.title, "Task overdue");
        assert_eq!(c.message, "Mix reel • 3 day(s) overdue");
    }

    #[test]
    fn three_day_message_shows_date() {
        let c = NotificationContent::deadline(
            NotificationKind::Deadline3Days,
            "Storyboard",
            day(2026, 3, 13),
            day(2026, 3, 10),
        )
        .unwrap();
        assert_eq!(c.message, "Storyboard • 13/03/2026");
    }

    #[test]
    fn non_deadline_kind_has_no_deadline_content() {
        assert!(NotificationContent::deadline(
            NotificationKind::TaskAssigned,
            "x",
            day(2026, 1, 1),
            day(2026, 1, 1),
        )
        .is_none());
        assert!(NotificationContent::remote_deadline(NotificationKind::ProjectAssigned, "x", None)
            .is_none());
    }

    #[test]
    fn remote_overdue_omits_day_count() {
        let c = NotificationContent::remote_deadline(
            NotificationKind::DeadlineOverdue,
            "Color grade",
            Some(day(2026, 1, 1)),
        )
        .unwrap();
        assert_eq!(c.message, "Color grade • Overdue");
    }

    #[test]
    fn remote_today_without_deadline() {
        let c = NotificationContent::remote_deadline(NotificationKind::DeadlineToday, "Cut", None)
            .unwrap();
        assert_eq!(c.message, "Cut • Due today");
    }

    #[test]
    fn assignment_content() {
        assert_eq!(
            NotificationContent::task_assigned("Edit", Some(day(2026, 4, 2))).message,
            "Edit • 02/04"
        );
        assert_eq!(
            NotificationContent::task_assigned("Edit", None).message,
            "Edit • No deadline"
        );
        assert_eq!(
            NotificationContent::project_assigned("Teaser", ProjectType::ShortFilm).message,
            "Teaser • Short film"
        );
    }

    #[test]
    fn only_sweep_kinds_are_deadline_kinds() {
        for kind in NotificationKind::ALL {
            assert_eq!(
                kind.is_deadline(),
                kind.as_str().starts_with("deadline_"),
                "{kind}"
            );
        }
    }
}
