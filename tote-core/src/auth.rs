//! # Access Control
//!
//! Capability checks for privileged calls. The engine never tracks an
//! ambient "current admin"; every privileged operation names its acting
//! identity and is checked through a host-supplied predicate.
//!
//! Oracle authority is deliberately not a role here. Which identities may
//! resolve an event is configuration carried by the market itself, see
//! [`crate::market::Market::is_oracle`].

use crate::id::{ActorId, MarketId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Roles a host can grant an actor on a market.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// May create markets and administer their configuration.
    Admin,
    /// May create and run prediction events.
    EventCreator,
}

/// Boolean capability predicate supplied by the host application.
pub trait AccessPolicy: Send + Sync {
    /// Whether `actor` holds `role` for `market_id`.
    fn authorized(&self, actor: ActorId, market_id: MarketId, role: Role) -> bool;
}

/// Fixed-set policy: global admin and event-creator sets, same answer for
/// every market.
///
/// Enough for tests, demos, and single-tenant deployments. Hosts with a
/// real capability system implement [`AccessPolicy`] themselves.
#[derive(Debug, Default, Clone)]
pub struct StaticPolicy {
    admins: BTreeSet<ActorId>,
    event_creators: BTreeSet<ActorId>,
}

impl StaticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `actor` the admin role everywhere.
    pub fn with_admin(mut self, actor: ActorId) -> Self {
        self.admins.insert(actor);
        self
    }

    /// Grant `actor` the event-creator role everywhere.
    pub fn with_event_creator(mut self, actor: ActorId) -> Self {
        self.event_creators.insert(actor);
        self
    }
}

impl AccessPolicy for StaticPolicy {
    fn authorized(&self, actor: ActorId, _market_id: MarketId, role: Role) -> bool {
        match role {
            Role::Admin => self.admins.contains(&actor),
            // Admins create events too; a separate grant is not required.
            Role::EventCreator => {
                self.event_creators.contains(&actor) || self.admins.contains(&actor)
            }
        }
    }
}
