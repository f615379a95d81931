//! Project lifecycle: statuses, the suggested workflow, the admin
//! auto-promotion rule, and the project-lead acceptance handshake.

use crate::access::ProjectAccess;
use crate::actor::Actor;
use crate::error::CoreError;
use crate::types::DbId;

string_enum! {
    /// Project lifecycle state. Declaration order is the canonical
    /// workflow order.
    ProjectStatus {
        Draft = "draft",
        Pending = "pending",
        InProgress = "in_progress",
        InReview = "in_review",
        Done = "done",
        Cancelled = "cancelled",
    }
}

/// Statuses a designated project lead may move a project into.
pub const LEAD_SETTABLE_STATUSES: &[ProjectStatus] = &[
    ProjectStatus::InReview,
    ProjectStatus::Done,
    ProjectStatus::Cancelled,
];

impl ProjectStatus {
    /// Draft and pending projects are hidden from everyone except the
    /// admin tier and their creator.
    pub fn is_restricted(self) -> bool {
        matches!(self, ProjectStatus::Draft | ProjectStatus::Pending)
    }

    /// Statuses visible to members, lead, client, and the pole lead.
    pub fn is_public(self) -> bool {
        !self.is_restricted()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Done | ProjectStatus::Cancelled)
    }

    /// Next step of the suggested workflow. Terminal states map to
    /// themselves; no transition is ever forced.
    pub fn next(self) -> ProjectStatus {
        match self {
            ProjectStatus::Draft => ProjectStatus::Pending,
            ProjectStatus::Pending => ProjectStatus::InProgress,
            ProjectStatus::InProgress => ProjectStatus::InReview,
            ProjectStatus::InReview => ProjectStatus::Done,
            terminal => terminal,
        }
    }
}

string_enum! {
    /// Creative-work category.
    ProjectType {
        Film = "film",
        ShortFilm = "short_film",
        WebSeries = "web_series",
        Event = "event",
        Workshop = "workshop",
        Music = "music",
        Other = "other",
    }
}

impl ProjectType {
    /// Human-readable label used in notification messages.
    pub fn label(self) -> &'static str {
        match self {
            ProjectType::Film => "Film",
            ProjectType::ShortFilm => "Short film",
            ProjectType::WebSeries => "Web series",
            ProjectType::Event => "Event",
            ProjectType::Workshop => "Workshop",
            ProjectType::Music => "Music",
            ProjectType::Other => "Other",
        }
    }
}

string_enum! {
    /// State of the designated lead's answer.
    LeadStatus {
        Pending = "pending",
        Accepted = "accepted",
        Declined = "declined",
    }
}

/// The designated lead's answer to a designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadDecision {
    Accept,
    Decline,
}

impl LeadDecision {
    fn outcome(self) -> LeadStatus {
        match self {
            LeadDecision::Accept => LeadStatus::Accepted,
            LeadDecision::Decline => LeadStatus::Declined,
        }
    }
}

/// Suggested next status in the workflow.
pub fn get_next_status(current: ProjectStatus) -> ProjectStatus {
    current.next()
}

/// Admins skip the approval gate: a draft or pending status requested by
/// an admin-tier actor becomes in-progress.
pub fn auto_adjust_status_for_admin(status: ProjectStatus, is_admin: bool) -> ProjectStatus {
    if is_admin && status.is_restricted() {
        ProjectStatus::InProgress
    } else {
        status
    }
}

/// Status a newly created project is persisted with. Only used at
/// creation time.
pub fn initial_status(actor: &Actor, requested: Option<ProjectStatus>) -> ProjectStatus {
    auto_adjust_status_for_admin(
        requested.unwrap_or(ProjectStatus::Draft),
        actor.is_admin_tier(),
    )
}

/// Lead status after a create or update that may have changed the lead.
///
/// A new (different) lead always restarts the handshake at pending; an
/// unchanged lead keeps its current answer; no lead means no status.
pub fn lead_status_after_assignment(
    previous_lead: Option<DbId>,
    new_lead: Option<DbId>,
    current: Option<LeadStatus>,
) -> Option<LeadStatus> {
    match new_lead {
        None => None,
        Some(lead) if previous_lead != Some(lead) => Some(LeadStatus::Pending),
        Some(_) => current.or(Some(LeadStatus::Pending)),
    }
}

/// Whether an update replaces the lead with somebody new.
pub fn is_new_lead(previous_lead: Option<DbId>, new_lead: Option<DbId>) -> bool {
    new_lead.is_some() && new_lead != previous_lead
}

/// Resolve an accept/decline call by `actor` on `project`.
///
/// Only the designated lead may answer, and only while the designation is
/// pending. Repeated answers are rejected, not ignored.
pub fn decide_lead(
    actor: &Actor,
    project: &ProjectAccess,
    decision: LeadDecision,
) -> Result<LeadStatus, CoreError> {
    if !actor.is(project.lead_id) {
        return Err(CoreError::Forbidden(
            "You are not the designated lead for this project".into(),
        ));
    }

    match project.lead_status {
        Some(LeadStatus::Accepted) => Err(CoreError::InvalidTransition(
            "Lead designation was already accepted".into(),
        )),
        Some(LeadStatus::Declined) => Err(CoreError::InvalidTransition(
            "Lead designation was already declined".into(),
        )),
        Some(LeadStatus::Pending) | None => Ok(decision.outcome()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::roles::Role;

    fn project_with_lead(lead: Option<DbId>, status: Option<LeadStatus>) -> ProjectAccess {
        ProjectAccess {
            lead_id: lead,
            lead_status: status,
            ..ProjectAccess::new(1, ProjectStatus::InProgress)
        }
    }

    #[test]
    fn workflow_order_is_canonical() {
        assert_eq!(
            ProjectStatus::ALL,
            &[
                ProjectStatus::Draft,
                ProjectStatus::Pending,
                ProjectStatus::InProgress,
                ProjectStatus::InReview,
                ProjectStatus::Done,
                ProjectStatus::Cancelled,
            ]
        );
    }

    #[test]
    fn next_status_follows_workflow() {
        assert_eq!(get_next_status(ProjectStatus::Draft), ProjectStatus::Pending);
        assert_eq!(get_next_status(ProjectStatus::Pending), ProjectStatus::InProgress);
        assert_eq!(get_next_status(ProjectStatus::InProgress), ProjectStatus::InReview);
        assert_eq!(get_next_status(ProjectStatus::InReview), ProjectStatus::Done);
    }

    #[test]
    fn terminal_statuses_do_not_advance() {
        for &status in ProjectStatus::ALL {
            assert_eq!(get_next_status(status) == status, status.is_terminal(), "{status}");
        }
    }

    #[test]
    fn admin_creating_draft_gets_in_progress() {
        let admin = Actor::with_role(1, Role::Admin, None);
        assert_eq!(
            initial_status(&admin, Some(ProjectStatus::Draft)),
            ProjectStatus::InProgress
        );
        assert_eq!(
            initial_status(&admin, Some(ProjectStatus::Pending)),
            ProjectStatus::InProgress
        );
        assert_eq!(initial_status(&admin, None), ProjectStatus::InProgress);
    }

    #[test]
    fn admin_requesting_later_status_keeps_it() {
        let admin = Actor::with_role(1, Role::SuperAdmin, None);
        assert_eq!(
            initial_status(&admin, Some(ProjectStatus::InReview)),
            ProjectStatus::InReview
        );
    }

    #[test]
    fn non_admin_creating_draft_keeps_draft() {
        let lead = Actor::with_role(2, Role::PoleLead, Some(1));
        assert_eq!(
            initial_status(&lead, Some(ProjectStatus::Draft)),
            ProjectStatus::Draft
        );
        assert_eq!(initial_status(&lead, None), ProjectStatus::Draft);
    }

    #[test]
    fn assigning_first_lead_starts_pending() {
        assert_eq!(
            lead_status_after_assignment(None, Some(5), None),
            Some(LeadStatus::Pending)
        );
    }

    #[test]
    fn replacing_lead_resets_to_pending() {
        assert_eq!(
            lead_status_after_assignment(Some(4), Some(5), Some(LeadStatus::Accepted)),
            Some(LeadStatus::Pending)
        );
    }

    #[test]
    fn unchanged_lead_keeps_answer() {
        assert_eq!(
            lead_status_after_assignment(Some(5), Some(5), Some(LeadStatus::Declined)),
            Some(LeadStatus::Declined)
        );
    }

    #[test]
    fn removing_lead_clears_status() {
        assert_eq!(
            lead_status_after_assignment(Some(5), None, Some(LeadStatus::Accepted)),
            None
        );
    }

    #[test]
    fn lead_accepts_once() {
        let lead = Actor::with_role(5, Role::Member, None);
        let project = project_with_lead(Some(5), Some(LeadStatus::Pending));
        assert_eq!(
            decide_lead(&lead, &project, LeadDecision::Accept).unwrap(),
            LeadStatus::Accepted
        );

        let accepted = project_with_lead(Some(5), Some(LeadStatus::Accepted));
        assert_matches!(
            decide_lead(&lead, &accepted, LeadDecision::Accept),
            Err(CoreError::InvalidTransition(_))
        );
        assert_matches!(
            decide_lead(&lead, &accepted, LeadDecision::Decline),
            Err(CoreError::InvalidTransition(_))
        );
    }

    #[test]
    fn lead_declines_once() {
        let lead = Actor::with_role(5, Role::Member, None);
        let project = project_with_lead(Some(5), Some(LeadStatus::Pending));
        assert_eq!(
            decide_lead(&lead, &project, LeadDecision::Decline).unwrap(),
            LeadStatus::Declined
        );

        let declined = project_with_lead(Some(5), Some(LeadStatus::Declined));
        assert_matches!(
            decide_lead(&lead, &declined, LeadDecision::Accept),
            Err(CoreError::InvalidTransition(_))
        );
    }

    #[test]
    fn only_designated_lead_may_answer() {
        let admin = Actor::with_role(1, Role::Admin, None);
        let project = project_with_lead(Some(5), Some(LeadStatus::Pending));
        assert_matches!(
            decide_lead(&admin, &project, LeadDecision::Accept),
            Err(CoreError::Forbidden(_))
        );

        let leaderless = project_with_lead(None, None);
        assert_matches!(
            decide_lead(&admin, &leaderless, LeadDecision::Decline),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn public_and_restricted_partition() {
        for status in ProjectStatus::ALL {
            assert_ne!(status.is_public(), status.is_restricted());
        }
        assert!(ProjectStatus::Cancelled.is_public());
        assert!(ProjectStatus::Pending.is_restricted());
    }
}
