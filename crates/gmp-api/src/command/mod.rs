// Generic entity command layer
//
// Maps CRUD-style verbs onto GMP's command-name and argument conventions:
// `get_<entity>` / `get_<entities>` / `create_<entity>` / `save_<entity>` /
// `clone` / `delete_<entity>` / `bulk_export`. Commands are parameterized
// by the model type (which carries the canonical entity name) and a
// `locate` function that finds the entity substructure inside the parsed
// envelope — composition, not inheritance.

mod agent_groups;
mod response;
mod wizard;

pub use agent_groups::{AgentConfig, AgentGroupArgs, AgentGroupCommand, AgentGroupsCommand};
pub use response::Response;
pub use wizard::WizardCommand;

use std::marker::PhantomData;
use std::sync::Arc;

use crate::counts::CollectionCounts;
use crate::error::Error;
use crate::filter::Filter;
use crate::http::{GmpHttp, Params};
use crate::model::Model;
use crate::xml::{Element, Envelope, parse_envelope};

/// Finds the entity substructure inside the parsed envelope payload.
type Locate = Box<dyn for<'a> Fn(&'a Element) -> Option<&'a Element> + Send + Sync>;

/// Attach a filter to a command's parameters.
///
/// A filter carrying a stable server-side id is sent as `filter_id` instead
/// of a (potentially large) filter string. Servers depend on this exact
/// parameter shape.
fn add_filter(params: Params, filter: Option<&Filter>) -> Params {
    match filter {
        Some(filter) => match filter.id() {
            Some(id) => params.add("filter_id", id),
            None => params.add("filter", filter.to_filter_string()),
        },
        None => params,
    }
}

/// POST a command and parse the envelope. Embedded `action_result`
/// failures come back as `Error::Response` from the envelope parser.
async fn post_command(http: &GmpHttp, params: Params) -> Result<Envelope, Error> {
    let raw = http.post(&params).await?;
    parse_envelope(&raw.body_text())
}

/// Read the new-entity id reported by a create/clone `action_result`.
fn action_result_id(envelope: &Envelope, context: &str) -> Result<String, Error> {
    envelope
        .root
        .child("action_result")
        .and_then(|ar| ar.child_text("id"))
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingElement {
            context: format!("{context}: action_result/id"),
        })
}

/// `bulk_export` for one or more ids. The response body is returned
/// untouched — exports are not necessarily XML.
async fn bulk_export(http: &GmpHttp, entity: &str, ids: &[&str]) -> Result<Vec<u8>, Error> {
    let mut params = Params::new()
        .add("cmd", "bulk_export")
        .add("resource_type", entity)
        .add("bulk_select", "1");
    for id in ids {
        params = params.add(format!("bulk_selected:{id}"), "1");
    }
    let raw = http.post(&params).await?;
    Ok(raw.body)
}

// ── Single-entity commands ───────────────────────────────────────────

/// Commands addressing one entity of type `T`.
pub struct EntityCommand<T: Model> {
    http: Arc<GmpHttp>,
    name: &'static str,
    locate: Locate,
    _model: PhantomData<T>,
}

impl<T: Model> EntityCommand<T> {
    /// A command set for `T` with the conventional locate function:
    /// `get_<entity>_response` → `<entity>`.
    pub fn new(http: Arc<GmpHttp>) -> Self {
        let name = T::ENTITY_TYPE;
        let response_name = format!("get_{name}_response");
        Self {
            http,
            name,
            locate: Box::new(move |root| {
                root.child(&response_name).and_then(|r| r.child(name))
            }),
            _model: PhantomData,
        }
    }

    /// Override the locate function for entities whose responses deviate
    /// from the `get_<entity>_response`/`<entity>` convention.
    pub fn with_locate<F>(mut self, locate: F) -> Self
    where
        F: for<'a> Fn(&'a Element) -> Option<&'a Element> + Send + Sync + 'static,
    {
        self.locate = Box::new(locate);
        self
    }

    pub fn http(&self) -> &Arc<GmpHttp> {
        &self.http
    }

    /// Fetch one entity: `cmd=get_<entity>`, `<entity>_id=<id>`.
    ///
    /// A response whose envelope parses but lacks the located entity is a
    /// contract violation and fails loudly — never a partial model.
    pub async fn get(&self, id: &str, filter: Option<&Filter>) -> Result<Response<T>, Error> {
        let params = Params::new()
            .add("cmd", format!("get_{}", self.name))
            .add(format!("{}_id", self.name), id);
        let params = add_filter(params, filter);

        let raw = self.http.get(&params).await?;
        let envelope = parse_envelope(&raw.body_text())?;
        let element = (self.locate)(&envelope.root).ok_or_else(|| Error::MissingElement {
            context: format!("get_{}_response/{}", self.name, self.name),
        })?;
        Ok(Response::new(T::from_element(Some(element)), envelope.meta))
    }

    /// Create an entity from pre-mapped parameters; returns the new id.
    pub async fn create(&self, params: Params) -> Result<Response<String>, Error> {
        let params = Params::new()
            .add("cmd", format!("create_{}", self.name))
            .merge(params);
        let envelope = post_command(&self.http, params).await?;
        let id = action_result_id(&envelope, &format!("create_{}", self.name))?;
        Ok(Response::new(id, envelope.meta))
    }

    /// Save (update) an entity from pre-mapped parameters.
    pub async fn save(&self, id: &str, params: Params) -> Result<Response<()>, Error> {
        let params = Params::new()
            .add("cmd", format!("save_{}", self.name))
            .add(format!("{}_id", self.name), id)
            .merge(params);
        let envelope = post_command(&self.http, params).await?;
        Ok(Response::new((), envelope.meta))
    }

    /// Clone an entity: `cmd=clone` with the entity given via
    /// `resource_type`. Returns the new entity's id.
    pub async fn clone_entity(&self, id: &str) -> Result<Response<String>, Error> {
        let params = Params::new()
            .add("cmd", "clone")
            .add("resource_type", self.name)
            .add("id", id);
        let envelope = post_command(&self.http, params).await?;
        let id = action_result_id(&envelope, "clone")?;
        Ok(Response::new(id, envelope.meta))
    }

    /// Delete an entity. Resolves with no payload — delete has none.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let params = Params::new()
            .add("cmd", format!("delete_{}", self.name))
            .add(format!("{}_id", self.name), id);
        post_command(&self.http, params).await?;
        Ok(())
    }

    /// Export one entity via the bulk path (the protocol has no
    /// single-entity export command).
    pub async fn export(&self, id: &str) -> Result<Vec<u8>, Error> {
        bulk_export(&self.http, self.name, &[id]).await
    }
}

// ── Collection commands ──────────────────────────────────────────────

/// A typed page of entities plus the filter and counts that produced it.
#[derive(Debug, Clone)]
pub struct EntityList<T> {
    pub entities: Vec<T>,
    /// The filter as echoed by the server (carries the stored-filter id).
    pub filter: Filter,
    pub counts: CollectionCounts,
}

/// Commands addressing collections of entities of type `T`.
pub struct EntitiesCommand<T: Model> {
    http: Arc<GmpHttp>,
    name: &'static str,
    /// Plural entity name used in command construction (`agent_groups`).
    plural: &'static str,
    _model: PhantomData<T>,
}

impl<T: Model> EntitiesCommand<T> {
    pub fn new(http: Arc<GmpHttp>, plural: &'static str) -> Self {
        Self {
            http,
            name: T::ENTITY_TYPE,
            plural,
            _model: PhantomData,
        }
    }

    /// Fetch a filtered page: `cmd=get_<entities>` plus the filter.
    pub async fn get_all(&self, filter: Option<&Filter>) -> Result<Response<EntityList<T>>, Error> {
        let params = Params::new().add("cmd", format!("get_{}", self.plural));
        let params = add_filter(params, filter);

        let raw = self.http.get(&params).await?;
        let envelope = parse_envelope(&raw.body_text())?;
        let response_name = format!("get_{}_response", self.plural);
        let payload = envelope
            .root
            .child(&response_name)
            .ok_or_else(|| Error::MissingElement {
                context: response_name.clone(),
            })?;

        let entities: Vec<T> = payload
            .children(self.name)
            .into_iter()
            .map(|el| T::from_element(Some(el)))
            .collect();

        // The echoed filter wins over the requested one: it carries the
        // server-side id and any defaults the server filled in.
        let filter = payload
            .child("filters")
            .map(Filter::from_element)
            .or_else(|| filter.cloned())
            .unwrap_or_default();

        let counts = self.parse_counts(payload, &filter, entities.len());
        Ok(Response::new(
            EntityList {
                entities,
                filter,
                counts,
            },
            envelope.meta,
        ))
    }

    /// Collection counts from the `<entity>_count` element and the paging
    /// attributes on the `<entities>` element.
    fn parse_counts(&self, payload: &Element, filter: &Filter, length: usize) -> CollectionCounts {
        let count_el = payload.child(&format!("{}_count", self.name));
        let all = count_el.and_then(|el| el.text()).and_then(|t| t.parse().ok());
        let filtered = count_el
            .and_then(|el| el.child_text("filtered"))
            .and_then(|t| t.parse().ok());

        let paging = payload.child(self.plural);
        let attr_int = |name: &str| {
            paging
                .and_then(|el| el.attr(name))
                .and_then(|v| v.parse::<i64>().ok())
        };

        let length = i64::try_from(length).unwrap_or(i64::MAX);
        CollectionCounts::new(
            filter,
            attr_int("start").unwrap_or(1),
            attr_int("max").unwrap_or(length),
            filtered.unwrap_or(length),
            all.unwrap_or(length),
            length,
        )
    }

    /// Export several entities; raw bytes, no XML transform.
    pub async fn export_by_ids(&self, ids: &[&str]) -> Result<Vec<u8>, Error> {
        bulk_export(&self.http, self.name, ids).await
    }
}
