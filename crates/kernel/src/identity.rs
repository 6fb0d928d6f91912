//! Identity resolution.
//!
//! An [`IdentityProvider`] answers "who is acting right now". Resolution is
//! bounded by a time budget; a provider that is slow or failing degrades to
//! the anonymous viewer instead of blocking the caller.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::error::ContentError;
use crate::models::Actor;

/// Default identity resolution budget.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Source of the current actor.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The actor for the current session.
    async fn current_actor(&self) -> Result<Actor>;

    /// Receiver that observes login and logout.
    fn subscribe(&self) -> watch::Receiver<Actor>;
}

/// Resolve the current actor within `budget`.
///
/// Never fails: a timeout or provider error yields [`Actor::anonymous`].
pub async fn resolve_actor(provider: &dyn IdentityProvider, budget: Duration) -> Actor {
    match tokio::time::timeout(budget, provider.current_actor()).await {
        Ok(Ok(actor)) => {
            debug!(actor_id = %actor.id, role = %actor.role, "actor resolved");
            actor
        }
        Ok(Err(e)) => {
            warn!(error = %e, "identity provider failed, continuing as anonymous");
            Actor::anonymous()
        }
        Err(_) => {
            let err = ContentError::AuthTimeout(budget);
            warn!(error = %err, "continuing as anonymous");
            Actor::anonymous()
        }
    }
}

/// In-process session holding the logged-in actor.
pub struct SessionIdentity {
    tx: watch::Sender<Actor>,
}

impl SessionIdentity {
    /// A session with nobody logged in.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Actor::anonymous());
        Self { tx }
    }

    /// A session with `actor` already logged in.
    pub fn logged_in(actor: Actor) -> Self {
        let (tx, _rx) = watch::channel(actor);
        Self { tx }
    }

    pub fn login(&self, actor: Actor) {
        info!(actor_id = %actor.id, role = %actor.role, "login");
        self.tx.send_replace(actor);
    }

    pub fn logout(&self) {
        let previous = self.tx.send_replace(Actor::anonymous());
        if !previous.is_anonymous() {
            info!(actor_id = %previous.id, "logout");
        }
    }

    /// Stream of actors, starting with the current one.
    pub fn changes(&self) -> WatchStream<Actor> {
        WatchStream::new(self.tx.subscribe())
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("actor", &*self.tx.borrow())
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current_actor(&self) -> Result<Actor> {
        Ok(*self.tx.borrow())
    }

    fn subscribe(&self) -> watch::Receiver<Actor> {
        self.tx.subscribe()
    }
}
