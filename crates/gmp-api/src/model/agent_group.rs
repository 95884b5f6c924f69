// Agent group entity.
//
// The exemplar entity for the command layer: it exercises the base
// property parsing, list normalization for its member agents, and the
// composite create/save path in `command::agent_groups`.

use crate::xml::Element;

use super::{EntityData, EntityRef, Model};

/// A named group of scan agents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentGroup {
    pub entity: EntityData,
    /// Weak references to the member agents (id/name pairs).
    pub agents: Vec<EntityRef>,
}

impl Model for AgentGroup {
    const ENTITY_TYPE: &'static str = "agent_group";

    fn from_element(element: Option<&Element>) -> Self {
        let Some(element) = element else {
            return Self::default();
        };
        let agents = element
            .child("agents")
            .map(|agents| {
                agents
                    .children("agent")
                    .into_iter()
                    .map(|a| EntityRef::from_element(Some(a)))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            entity: EntityData::from_element(Some(element)),
            agents,
        }
    }

    fn id(&self) -> Option<&str> {
        self.entity.id.as_deref()
    }
}
