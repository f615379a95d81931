//! Visibility and management policy.
//!
//! Every entry point (HTTP handlers, webhook receiver, background jobs)
//! asks these functions; none of them re-derive role rules. All checks
//! fail closed: an actor without a profile is granted nothing, even on a
//! project it created.

use serde::Serialize;

use crate::actor::Actor;
use crate::error::CoreError;
use crate::project::{LeadStatus, ProjectStatus, LEAD_SETTABLE_STATUSES};
use crate::roles::Role;
use crate::task::TaskEditScope;
use crate::types::DbId;

/// The slice of a project the policy needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectAccess {
    pub id: DbId,
    pub created_by: Option<DbId>,
    pub status: ProjectStatus,
    pub pole_id: Option<DbId>,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub lead_status: Option<LeadStatus>,
    pub member_ids: Vec<DbId>,
}

impl ProjectAccess {
    /// A project nobody is attached to yet.
    pub fn new(id: DbId, status: ProjectStatus) -> Self {
        Self {
            id,
            created_by: None,
            status,
            pole_id: None,
            client_id: None,
            lead_id: None,
            lead_status: None,
            member_ids: Vec::new(),
        }
    }

    pub fn is_member(&self, user_id: DbId) -> bool {
        self.member_ids.contains(&user_id)
    }

    fn created_by(&self, actor: &Actor) -> bool {
        actor.is(self.created_by)
    }

    fn led_by(&self, actor: &Actor) -> bool {
        actor.is(self.lead_id)
    }

    fn led_by_accepted(&self, actor: &Actor) -> bool {
        self.led_by(actor) && self.lead_status == Some(LeadStatus::Accepted)
    }
}

/// Turn a policy answer into a `Forbidden` error.
pub fn ensure(allowed: bool, message: &str) -> Result<(), CoreError> {
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(message.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub fn can_view_project(actor: &Actor, project: &ProjectAccess) -> bool {
    if !actor.has_profile() {
        return false;
    }
    if actor.is_admin_tier() || project.created_by(actor) {
        return true;
    }
    if project.status.is_restricted() {
        return false;
    }
    project.is_member(actor.user_id)
        || project.led_by(actor)
        || actor.is(project.client_id)
        || actor.leads_pole(project.pole_id)
}

/// Admin-tier and pole leads (of any pole) may create projects.
pub fn can_create_project(actor: &Actor) -> bool {
    actor.is_admin_tier() || actor.is_pole_lead()
}

/// Update any field other than the status.
pub fn can_manage_project(actor: &Actor, project: &ProjectAccess) -> bool {
    if !actor.has_profile() {
        return false;
    }
    actor.is_admin_tier() || project.created_by(actor) || actor.leads_pole(project.pole_id)
}

/// Deletion is reserved to super-admins; plain admins cannot delete.
pub fn can_delete_project(actor: &Actor, _project: &ProjectAccess) -> bool {
    actor.is_super_admin()
}

/// Whether `actor` may move `project` to `new_status`.
///
/// With `new_status == None` this answers "may change status at all",
/// which the designated lead can.
pub fn can_change_status(
    actor: &Actor,
    project: &ProjectAccess,
    new_status: Option<ProjectStatus>,
) -> bool {
    if can_manage_project(actor, project) {
        return true;
    }
    if !actor.has_profile() || !project.led_by(actor) {
        return false;
    }
    match new_status {
        None => true,
        Some(status) => LEAD_SETTABLE_STATUSES.contains(&status),
    }
}

/// Statuses offered to `actor`, in workflow order.
pub fn get_available_statuses(actor: &Actor, project: &ProjectAccess) -> Vec<ProjectStatus> {
    if can_manage_project(actor, project) {
        ProjectStatus::ALL.to_vec()
    } else if actor.has_profile() && project.led_by(actor) {
        LEAD_SETTABLE_STATUSES.to_vec()
    } else {
        Vec::new()
    }
}

pub fn can_manage_members(actor: &Actor, project: &ProjectAccess) -> bool {
    if !actor.has_profile() {
        return false;
    }
    actor.is_admin_tier() || actor.leads_pole(project.pole_id) || project.led_by(actor)
}

/// Status supplied through the general project update. Outside the admin
/// tier only the pre-approval statuses may be set there; everything else
/// goes through the dedicated status transition.
pub fn check_update_status(actor: &Actor, requested: Option<ProjectStatus>) -> Result<(), CoreError> {
    match requested {
        Some(status) if !actor.is_admin_tier() && !status.is_restricted() => {
            Err(CoreError::Forbidden(format!(
                "Only administrators can set status '{status}' directly"
            )))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub fn can_view_task(actor: &Actor, project: &ProjectAccess, assignees: &[DbId]) -> bool {
    if !actor.has_profile() {
        return false;
    }
    actor.is_admin_tier()
        || actor.leads_pole(project.pole_id)
        || project.created_by(actor)
        || project.led_by(actor)
        || project.is_member(actor.user_id)
        || assignees.contains(&actor.user_id)
}

/// Admin-tier; the pole lead of the project's pole; the designated lead
/// once they have accepted.
pub fn can_create_task(actor: &Actor, project: &ProjectAccess) -> bool {
    if !actor.has_profile() {
        return false;
    }
    actor.is_admin_tier() || actor.leads_pole(project.pole_id) || project.led_by_accepted(actor)
}

/// Edit rights on a task, or `None` if the actor may not edit it.
pub fn task_edit_scope(
    actor: &Actor,
    project: &ProjectAccess,
    assignees: &[DbId],
) -> Option<TaskEditScope> {
    if !actor.has_profile() {
        return None;
    }
    if actor.is_admin_tier()
        || actor.leads_pole(project.pole_id)
        || project.created_by(actor)
        || project.led_by_accepted(actor)
    {
        Some(TaskEditScope::Full)
    } else if assignees.contains(&actor.user_id) {
        Some(TaskEditScope::StatusOnly)
    } else {
        None
    }
}

pub fn can_delete_task(actor: &Actor, project: &ProjectAccess, assignees: &[DbId]) -> bool {
    task_edit_scope(actor, project, assignees) == Some(TaskEditScope::Full)
}

/// Validate a task update given the names of the fields it supplies.
///
/// Status-only editors must send `status` and nothing else; a request
/// carrying any other field is rejected as a whole.
pub fn check_task_update(
    actor: &Actor,
    project: &ProjectAccess,
    assignees: &[DbId],
    fields: &[&str],
) -> Result<TaskEditScope, CoreError> {
    let scope = task_edit_scope(actor, project, assignees).ok_or_else(|| {
        CoreError::Forbidden("You do not have permission to modify this task".into())
    })?;

    if scope == TaskEditScope::StatusOnly {
        let extra: Vec<&str> = fields.iter().copied().filter(|f| *f != "status").collect();
        if !extra.is_empty() {
            return Err(CoreError::InvalidTransition(format!(
                "Assignees may only change the task status (rejected fields: {})",
                extra.join(", ")
            )));
        }
    }

    Ok(scope)
}

// ---------------------------------------------------------------------------
// Poles, users, documents
// ---------------------------------------------------------------------------

pub fn can_view_poles(actor: &Actor) -> bool {
    matches!(
        actor.role(),
        Some(Role::SuperAdmin | Role::Admin | Role::PoleLead | Role::Member)
    )
}

pub fn can_manage_poles(actor: &Actor) -> bool {
    actor.is_admin_tier()
}

pub fn can_view_directory(actor: &Actor) -> bool {
    actor.role().is_some_and(Role::can_browse_directory)
}

/// Role and pole assignment.
pub fn can_manage_users(actor: &Actor) -> bool {
    actor.is_admin_tier()
}

pub fn can_delete_document(actor: &Actor, uploaded_by: Option<DbId>) -> bool {
    actor.has_profile() && (actor.is_admin_tier() || actor.is(uploaded_by))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const CREATOR: DbId = 1;
    const LEAD: DbId = 2;
    const MEMBER: DbId = 3;
    const CLIENT: DbId = 4;
    const STRANGER: DbId = 5;
    const POLE: DbId = 10;
    const OTHER_POLE: DbId = 11;

    fn project(status: ProjectStatus) -> ProjectAccess {
        ProjectAccess {
            created_by: Some(CREATOR),
            pole_id: Some(POLE),
            client_id: Some(CLIENT),
            lead_id: Some(LEAD),
            lead_status: Some(LeadStatus::Pending),
            member_ids: vec![MEMBER],
            ..ProjectAccess::new(100, status)
        }
    }

    fn member(id: DbId) -> Actor {
        Actor::with_role(id, Role::Member, Some(POLE))
    }

    fn admin() -> Actor {
        Actor::with_role(90, Role::Admin, None)
    }

    fn super_admin() -> Actor {
        Actor::with_role(91, Role::SuperAdmin, None)
    }

    fn pole_lead(pole: DbId) -> Actor {
        Actor::with_role(92, Role::PoleLead, Some(pole))
    }

    fn every_actor() -> Vec<Actor> {
        let mut actors = vec![
            admin(),
            super_admin(),
            pole_lead(POLE),
            pole_lead(OTHER_POLE),
            Actor::without_profile(CREATOR),
        ];
        for id in [CREATOR, LEAD, MEMBER, CLIENT, STRANGER] {
            for role in Role::ALL {
                actors.push(Actor::with_role(id, *role, Some(OTHER_POLE)));
            }
        }
        actors
    }

    // -- visibility ---------------------------------------------------------

    #[test]
    fn restricted_projects_visible_only_to_admin_tier_and_creator() {
        for status in [ProjectStatus::Draft, ProjectStatus::Pending] {
            let p = project(status);
            for actor in every_actor() {
                let expected = actor.has_profile()
                    && (actor.is_admin_tier() || actor.user_id == CREATOR);
                assert_eq!(
                    can_view_project(&actor, &p),
                    expected,
                    "{actor:?} on {status}"
                );
            }
        }
    }

    #[test]
    fn public_projects_visible_to_participants() {
        for status in ProjectStatus::ALL.iter().filter(|s| s.is_public()) {
            let p = project(*status);
            for id in [MEMBER, LEAD, CLIENT] {
                for role in Role::ALL {
                    let actor = Actor::with_role(id, *role, None);
                    assert!(can_view_project(&actor, &p), "{actor:?} on {status}");
                }
            }
            assert!(can_view_project(&pole_lead(POLE), &p));
            assert!(!can_view_project(&pole_lead(OTHER_POLE), &p));
            assert!(!can_view_project(&member(STRANGER), &p));
        }
    }

    #[test]
    fn missing_profile_is_denied_even_for_creator() {
        let actor = Actor::without_profile(CREATOR);
        assert!(!can_view_project(&actor, &project(ProjectStatus::InProgress)));
        assert!(!can_manage_project(&actor, &project(ProjectStatus::InProgress)));
    }

    #[test]
    fn pole_lead_sees_nothing_when_project_has_no_pole() {
        let p = ProjectAccess {
            pole_id: None,
            ..project(ProjectStatus::InProgress)
        };
        assert!(!can_view_project(&Actor::with_role(92, Role::PoleLead, None), &p));
    }

    // -- management ---------------------------------------------------------

    #[test]
    fn only_super_admin_deletes() {
        let p = project(ProjectStatus::InProgress);
        for actor in every_actor() {
            assert_eq!(
                can_delete_project(&actor, &p),
                actor.role() == Some(Role::SuperAdmin)
            );
        }
        assert!(!can_delete_project(&admin(), &p));
    }

    #[test]
    fn manage_rights() {
        let p = project(ProjectStatus::InProgress);
        assert!(can_manage_project(&admin(), &p));
        assert!(can_manage_project(&member(CREATOR), &p));
        assert!(can_manage_project(&pole_lead(POLE), &p));
        assert!(!can_manage_project(&pole_lead(OTHER_POLE), &p));
        assert!(!can_manage_project(&member(LEAD), &p));
        assert!(!can_manage_project(&member(MEMBER), &p));
    }

    #[test]
    fn lead_changes_status_only_forward() {
        let p = project(ProjectStatus::InProgress);
        let lead = member(LEAD);
        assert!(can_change_status(&lead, &p, None));
        assert!(can_change_status(&lead, &p, Some(ProjectStatus::InReview)));
        assert!(can_change_status(&lead, &p, Some(ProjectStatus::Done)));
        assert!(can_change_status(&lead, &p, Some(ProjectStatus::Cancelled)));
        assert!(!can_change_status(&lead, &p, Some(ProjectStatus::Draft)));
        assert!(!can_change_status(&lead, &p, Some(ProjectStatus::Pending)));
        assert!(!can_change_status(&lead, &p, Some(ProjectStatus::InProgress)));
    }

    #[test]
    fn managers_change_status_freely() {
        let p = project(ProjectStatus::Done);
        for actor in [admin(), member(CREATOR), pole_lead(POLE)] {
            for status in ProjectStatus::ALL {
                assert!(can_change_status(&actor, &p, Some(*status)));
            }
        }
        assert!(!can_change_status(&member(MEMBER), &p, None));
    }

    #[test]
    fn lead_gets_forward_statuses_regardless_of_current() {
        for status in ProjectStatus::ALL {
            let p = project(*status);
            assert_eq!(
                get_available_statuses(&member(LEAD), &p),
                vec![
                    ProjectStatus::InReview,
                    ProjectStatus::Done,
                    ProjectStatus::Cancelled
                ]
            );
        }
    }

    #[test]
    fn managers_get_full_status_list_in_order() {
        let p = project(ProjectStatus::Draft);
        assert_eq!(get_available_statuses(&admin(), &p), ProjectStatus::ALL.to_vec());
        assert_eq!(get_available_statuses(&pole_lead(POLE), &p), ProjectStatus::ALL.to_vec());
        assert!(get_available_statuses(&member(MEMBER), &p).is_empty());
        assert!(get_available_statuses(&Actor::without_profile(LEAD), &p).is_empty());
    }

    #[test]
    fn creating_projects() {
        assert!(can_create_project(&admin()));
        assert!(can_create_project(&pole_lead(OTHER_POLE)));
        assert!(!can_create_project(&member(CREATOR)));
        assert!(!can_create_project(&Actor::without_profile(1)));
    }

    #[test]
    fn member_management() {
        let p = project(ProjectStatus::InProgress);
        assert!(can_manage_members(&admin(), &p));
        assert!(can_manage_members(&pole_lead(POLE), &p));
        assert!(can_manage_members(&member(LEAD), &p));
        assert!(!can_manage_members(&pole_lead(OTHER_POLE), &p));
        assert!(!can_manage_members(&member(MEMBER), &p));
    }

    #[test]
    fn general_update_restricts_status_for_non_admins() {
        let lead = pole_lead(POLE);
        assert!(check_update_status(&lead, None).is_ok());
        assert!(check_update_status(&lead, Some(ProjectStatus::Pending)).is_ok());
        assert_matches!(
            check_update_status(&lead, Some(ProjectStatus::Done)),
            Err(CoreError::Forbidden(_))
        );
        assert!(check_update_status(&admin(), Some(ProjectStatus::Done)).is_ok());
    }

    // -- tasks --------------------------------------------------------------

    #[test]
    fn pole_lead_of_other_pole_cannot_create_task() {
        let p = project(ProjectStatus::InProgress);
        assert!(!can_create_task(&pole_lead(OTHER_POLE), &p));
        assert!(can_create_task(&pole_lead(POLE), &p));
        assert!(can_create_task(&admin(), &p));
    }

    #[test]
    fn lead_creates_tasks_only_after_accepting() {
        let pending = project(ProjectStatus::InProgress);
        assert!(!can_create_task(&member(LEAD), &pending));

        let accepted = ProjectAccess {
            lead_status: Some(LeadStatus::Accepted),
            ..project(ProjectStatus::InProgress)
        };
        assert!(can_create_task(&member(LEAD), &accepted));

        let declined = ProjectAccess {
            lead_status: Some(LeadStatus::Declined),
            ..project(ProjectStatus::InProgress)
        };
        assert!(!can_create_task(&member(LEAD), &declined));
        assert!(!can_create_task(&member(MEMBER), &accepted));
    }

    #[test]
    fn assignee_only_edits_status() {
        let p = project(ProjectStatus::InProgress);
        let assignee = member(STRANGER);
        let assignees = [STRANGER];

        assert_eq!(
            check_task_update(&assignee, &p, &assignees, &["status"]).unwrap(),
            TaskEditScope::StatusOnly
        );
        assert_matches!(
            check_task_update(&assignee, &p, &assignees, &["status", "title"]),
            Err(CoreError::InvalidTransition(_))
        );
        assert!(!can_delete_task(&assignee, &p, &assignees));
    }

    #[test]
    fn non_assignee_cannot_edit() {
        let p = project(ProjectStatus::InProgress);
        assert_matches!(
            check_task_update(&member(MEMBER), &p, &[STRANGER], &["status"]),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn full_editors_touch_any_field() {
        let p = ProjectAccess {
            lead_status: Some(LeadStatus::Accepted),
            ..project(ProjectStatus::InProgress)
        };
        for actor in [admin(), pole_lead(POLE), member(CREATOR), member(LEAD)] {
            assert_eq!(
                check_task_update(&actor, &p, &[], &["title", "assignee_ids"]).unwrap(),
                TaskEditScope::Full
            );
            assert!(can_delete_task(&actor, &p, &[]));
        }
    }

    #[test]
    fn pending_lead_who_is_assignee_only_edits_status() {
        let p = project(ProjectStatus::InProgress);
        assert_eq!(
            task_edit_scope(&member(LEAD), &p, &[LEAD]),
            Some(TaskEditScope::StatusOnly)
        );
    }

    #[test]
    fn task_visibility() {
        let p = project(ProjectStatus::InProgress);
        assert!(can_view_task(&member(MEMBER), &p, &[]));
        assert!(can_view_task(&member(LEAD), &p, &[]));
        assert!(can_view_task(&member(STRANGER), &p, &[STRANGER]));
        assert!(can_view_task(&pole_lead(POLE), &p, &[]));
        assert!(!can_view_task(&pole_lead(OTHER_POLE), &p, &[]));
        assert!(!can_view_task(&member(STRANGER), &p, &[]));
        assert!(!can_view_task(&Actor::without_profile(MEMBER), &p, &[]));
    }

    #[test]
    fn pole_lead_of_other_pole_still_sees_own_assignments() {
        let p = project(ProjectStatus::InProgress);
        let lead = pole_lead(OTHER_POLE);
        assert!(can_view_task(&lead, &p, &[lead.user_id]));
    }

    // -- directory ----------------------------------------------------------

    #[test]
    fn poles_and_directory() {
        assert!(can_view_poles(&member(1)));
        assert!(!can_view_poles(&Actor::with_role(1, Role::Client, None)));
        assert!(can_manage_poles(&admin()));
        assert!(!can_manage_poles(&pole_lead(POLE)));

        assert!(can_view_directory(&Actor::with_role(1, Role::Artist, None)));
        assert!(!can_view_directory(&Actor::with_role(1, Role::Intern, None)));
        assert!(!can_view_directory(&Actor::without_profile(1)));
        assert!(can_manage_users(&super_admin()));
        assert!(!can_manage_users(&member(1)));
    }

    #[test]
    fn document_deletion() {
        assert!(can_delete_document(&member(MEMBER), Some(MEMBER)));
        assert!(can_delete_document(&admin(), Some(MEMBER)));
        assert!(!can_delete_document(&member(STRANGER), Some(MEMBER)));
        assert!(!can_delete_document(&member(STRANGER), None));
    }
}
