// Typed model layer
//
// GMP entities arrive as loosely-typed XML: snake_case names, string
// scalars, attributes duplicated into child elements, lists collapsed to
// a single child. Every entity type implements `Model::from_element` to
// turn that into a typed record. The contract is total: `from_element(None)`
// yields a model with conventional defaults and never panics.

mod agent_group;
mod parse;
mod permission;

pub use agent_group::AgentGroup;
pub use parse::{
    YesNo, parse_bool, parse_csv, parse_date, parse_float, parse_int, parse_severity,
    parse_text, parse_yes_no,
};
pub use permission::Permission;

use chrono::{DateTime, FixedOffset};

use crate::xml::Element;

/// A typed GMP entity.
///
/// `ENTITY_TYPE` is the canonical protocol name (`"task"`, `"agent_group"`)
/// used by the command layer for command construction.
pub trait Model: Sized {
    const ENTITY_TYPE: &'static str;

    /// Build a model from the located entity element. Total over `None`:
    /// absence yields defaults (empty lists, unset scalars), never a panic
    /// and never a null-like sentinel.
    fn from_element(element: Option<&Element>) -> Self;

    fn id(&self) -> Option<&str>;
}

/// A weak reference to another entity: id and name, optionally the
/// entity's type, never the full record. Parents exclusively own their
/// nested value objects; cross-entity links stay weak to keep models
/// acyclic and freely shareable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub entity_type: Option<String>,
}

impl EntityRef {
    pub fn from_element(element: Option<&Element>) -> Self {
        let Some(element) = element else {
            return Self::default();
        };
        Self {
            id: element.attr("id").map(str::to_owned),
            name: element.child_text("name").map(str::to_owned),
            entity_type: element.child_text("type").map(str::to_owned),
        }
    }
}

/// The base properties shared by every GMP entity. Concrete models embed
/// this and add their own fields on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityData {
    pub id: Option<String>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub creation_time: Option<DateTime<FixedOffset>>,
    pub modification_time: Option<DateTime<FixedOffset>>,
    pub owner: Option<String>,
    pub writable: Option<YesNo>,
    pub in_use: Option<YesNo>,
    pub permissions: Vec<Permission>,
}

impl EntityData {
    pub fn from_element(element: Option<&Element>) -> Self {
        let Some(element) = element else {
            return Self::default();
        };
        Self {
            // The wire duplicates the id as an attribute and occasionally as
            // a child element; the attribute is authoritative.
            id: element
                .attr("id")
                .or_else(|| element.child_text("id"))
                .map(str::to_owned),
            name: parse_text(element.child_text("name")),
            comment: parse_text(element.child_text("comment")),
            creation_time: parse_date(element.child_text("creation_time")),
            modification_time: parse_date(element.child_text("modification_time")),
            owner: element
                .child("owner")
                .and_then(|o| o.child_text("name"))
                .map(str::to_owned),
            writable: parse_yes_no(element.child_text("writable")),
            in_use: parse_yes_no(element.child_text("in_use")),
            permissions: Permission::parse_list(element.child("permissions")),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(xml: &str) -> Element {
        let doc = roxmltree::Document::parse(xml).expect("test XML must parse");
        Element::from_node(doc.root_element())
    }

    #[test]
    fn entity_data_from_full_element() {
        let el = parse(
            r#"<task id="t1">
                 <name>Weekly scan</name>
                 <comment>all hosts</comment>
                 <creation_time>2026-08-01T10:00:00+02:00</creation_time>
                 <modification_time>2026-08-20T09:30:00+02:00</modification_time>
                 <owner><name>admin</name></owner>
                 <writable>1</writable>
                 <in_use>0</in_use>
                 <permissions><permission><name>get_tasks</name></permission></permissions>
               </task>"#,
        );
        let data = EntityData::from_element(Some(&el));
        assert_eq!(data.id.as_deref(), Some("t1"));
        assert_eq!(data.name.as_deref(), Some("Weekly scan"));
        assert_eq!(data.owner.as_deref(), Some("admin"));
        assert_eq!(data.writable, Some(YesNo::Yes));
        assert_eq!(data.in_use, Some(YesNo::No));
        assert_eq!(data.permissions.len(), 1);
        let created = data.creation_time.expect("creation time parsed");
        assert_eq!(created.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn entity_data_from_none_is_all_defaults() {
        let data = EntityData::from_element(None);
        assert_eq!(data, EntityData::default());
        assert!(data.permissions.is_empty());
    }

    #[test]
    fn id_attribute_wins_over_child() {
        let el = parse(r#"<task id="attr"><id>child</id></task>"#);
        assert_eq!(EntityData::from_element(Some(&el)).id.as_deref(), Some("attr"));
    }

    #[test]
    fn tri_state_fields_stay_absent_when_missing() {
        let el = parse("<task/>");
        let data = EntityData::from_element(Some(&el));
        assert_eq!(data.writable, None);
        assert_eq!(data.in_use, None);
    }
}
