// Agent group commands.
//
// Agent groups are a composite entity: the group record itself plus
// per-agent configuration applied with a secondary `modify_agents`
// command. Create and save run the two commands as a sequential saga —
// the secondary is only issued after the primary succeeds, and a
// secondary failure is surfaced as `Error::PartialSuccess` carrying the
// id from the primary step (no rollback; the group exists).

use std::sync::Arc;

use tracing::warn;

use crate::error::Error;
use crate::filter::Filter;
use crate::http::{GmpHttp, Params};
use crate::model::{AgentGroup, YesNo};

use super::{EntitiesCommand, EntityCommand, EntityList, Response};

/// Payload for creating or saving an agent group. Field names are
/// caller-side; the command maps them to the protocol's snake_case
/// parameters, with `agent_ids` using the trailing-colon list convention.
#[derive(Debug, Clone, Default)]
pub struct AgentGroupArgs {
    pub name: String,
    pub comment: Option<String>,
    pub agent_ids: Vec<String>,
    /// Per-agent configuration applied by the secondary command.
    pub config: Option<AgentConfig>,
}

/// Configuration applied to every agent in the group after the group
/// command itself has succeeded.
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    pub authorized: Option<YesNo>,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: Option<i64>,
}

impl AgentGroupArgs {
    fn group_params(&self) -> Params {
        Params::new()
            .add("name", &self.name)
            .add_opt("comment", self.comment.as_deref())
            .add_list("agent_ids:", self.agent_ids.iter().cloned())
    }
}

impl AgentConfig {
    fn params(&self) -> Params {
        Params::new()
            .add_opt("authorized", self.authorized.map(YesNo::as_param))
            .add_opt(
                "heartbeat_interval",
                self.heartbeat_interval.map(|v| v.to_string()),
            )
    }
}

/// Commands for a single agent group.
pub struct AgentGroupCommand {
    entity: EntityCommand<AgentGroup>,
}

impl AgentGroupCommand {
    pub fn new(http: Arc<GmpHttp>) -> Self {
        Self {
            entity: EntityCommand::new(http),
        }
    }

    pub async fn get(
        &self,
        id: &str,
        filter: Option<&Filter>,
    ) -> Result<Response<AgentGroup>, Error> {
        self.entity.get(id, filter).await
    }

    /// Create the group, then apply the per-agent configuration.
    ///
    /// The secondary command runs strictly after the primary resolves. If
    /// it fails, the group still exists — the error is `PartialSuccess`
    /// with the new id, never a silent swallow.
    pub async fn create(&self, args: &AgentGroupArgs) -> Result<Response<String>, Error> {
        let created = self.entity.create(args.group_params()).await?;
        self.apply_config(&created.data, args).await?;
        Ok(created)
    }

    /// Save the group, then apply the per-agent configuration.
    pub async fn save(&self, id: &str, args: &AgentGroupArgs) -> Result<Response<()>, Error> {
        let saved = self.entity.save(id, args.group_params()).await?;
        self.apply_config(id, args).await?;
        Ok(saved)
    }

    async fn apply_config(&self, id: &str, args: &AgentGroupArgs) -> Result<(), Error> {
        let Some(config) = &args.config else {
            return Ok(());
        };
        let params = Params::new()
            .add("cmd", "modify_agents")
            .add("agent_group_id", id)
            .add_list("agent_ids:", args.agent_ids.iter().cloned())
            .merge(config.params());
        if let Err(error) = self.entity.http().post(&params).await {
            warn!(%id, %error, "agent configuration failed after group command succeeded");
            return Err(Error::PartialSuccess {
                id: id.to_owned(),
                message: error.to_string(),
            });
        }
        Ok(())
    }

    pub async fn clone_entity(&self, id: &str) -> Result<Response<String>, Error> {
        self.entity.clone_entity(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.entity.delete(id).await
    }

    pub async fn export(&self, id: &str) -> Result<Vec<u8>, Error> {
        self.entity.export(id).await
    }
}

/// Commands for agent group collections.
pub struct AgentGroupsCommand {
    entities: EntitiesCommand<AgentGroup>,
}

impl AgentGroupsCommand {
    pub fn new(http: Arc<GmpHttp>) -> Self {
        Self {
            entities: EntitiesCommand::new(http, "agent_groups"),
        }
    }

    pub async fn get_all(
        &self,
        filter: Option<&Filter>,
    ) -> Result<Response<EntityList<AgentGroup>>, Error> {
        self.entities.get_all(filter).await
    }

    pub async fn export_by_ids(&self, ids: &[&str]) -> Result<Vec<u8>, Error> {
        self.entities.export_by_ids(ids).await
    }
}
