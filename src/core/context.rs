use crate::core::error::{CoreError, CoreResult};

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub email: Option<String>,
}

/// Per-call identity context, passed explicitly to every core operation
#[derive(Debug, Clone, Default)]
pub struct ActorContext {
    actor: Option<Actor>,
}

impl ActorContext {
    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    pub fn with_actor(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    /// Context for a bare actor id
    pub fn for_actor(id: impl Into<String>) -> Self {
        Self::with_actor(Actor {
            id: id.into(),
            email: None,
        })
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn require_actor(&self) -> CoreResult<&Actor> {
        self.actor.as_ref().ok_or(CoreError::Unauthenticated)
    }
}
