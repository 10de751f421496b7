use thiserror::Error;

use super::{EntityId, SystemId};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("component `{component}` not found on entity {entity}")]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },
    #[error("system {0} not found")]
    SystemNotFound(SystemId),
    #[error("system {id} is not a `{expected}`")]
    SystemTypeMismatch { id: SystemId, expected: &'static str },
    #[error("system {id} (`{name}`) failed")]
    SystemFailed {
        id: SystemId,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WorldError {
    /// `true` for the variants that report a missing entity, component or
    /// system.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorldError::EntityNotFound(_)
                | WorldError::ComponentNotFound { .. }
                | WorldError::SystemNotFound(_)
        )
    }
}
