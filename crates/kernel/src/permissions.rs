//! Role and ownership checks for reviews and site administration.
//!
//! Every predicate here is pure. The editor uses them to decide which actions
//! to offer; `ReviewService` calls them again against the stored record before
//! any write reaches the store.

use crate::models::{Actor, Review, Role};

/// Create new reviews. Authors and administrators.
pub fn can_create(actor: &Actor) -> bool {
    matches!(actor.role, Role::Author | Role::Administrator)
}

/// Edit a review.
///
/// - Administrators may edit any review.
/// - Authors may edit reviews they own.
/// - Viewers may not edit.
pub fn can_edit(actor: &Actor, review: &Review) -> bool {
    match actor.role {
        Role::Administrator => true,
        Role::Author => !actor.is_anonymous() && actor.id == review.owner_id,
        Role::Viewer => false,
    }
}

/// Delete a review. Administrators only, including for an author's own work.
pub fn can_delete(actor: &Actor, _review: &Review) -> bool {
    actor.is_admin()
}

/// Create users, change roles, remove accounts.
pub fn can_manage_users(actor: &Actor) -> bool {
    actor.is_admin()
}

/// Edit site-wide copy such as the about and contact sections.
pub fn can_edit_site_content(actor: &Actor) -> bool {
    actor.is_admin()
}
