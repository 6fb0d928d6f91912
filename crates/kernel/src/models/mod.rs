//! Domain models.

pub mod actor;
pub mod review;

pub use actor::{ANONYMOUS_ACTOR_ID, Actor, Role};
pub use review::{DEFAULT_RATING, RATING_RANGE, Review};
