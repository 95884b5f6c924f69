// Permission records nested inside every entity response.

use crate::xml::Element;

use super::EntityRef;

/// One granted permission on an entity: the command name it allows plus
/// weak references to the subject it was granted to and the resource it
/// covers (both optional — `<permissions>` inside an entity usually carry
/// only the name).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Permission {
    pub name: Option<String>,
    pub subject: Option<EntityRef>,
    pub resource: Option<EntityRef>,
}

impl Permission {
    pub fn from_element(element: Option<&Element>) -> Self {
        let Some(element) = element else {
            return Self::default();
        };
        Self {
            name: element.child_text("name").map(str::to_owned),
            subject: element.child("subject").map(|el| EntityRef::from_element(Some(el))),
            resource: element
                .child("resource")
                .map(|el| EntityRef::from_element(Some(el))),
        }
    }

    /// Parse the `<permissions>` wrapper into an always-present list.
    pub fn parse_list(element: Option<&Element>) -> Vec<Self> {
        element
            .map(|el| {
                el.children("permission")
                    .into_iter()
                    .map(|p| Self::from_element(Some(p)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Element {
        let doc = roxmltree::Document::parse(xml).expect("test XML must parse");
        Element::from_node(doc.root_element())
    }

    #[test]
    fn list_normalizes_single_permission() {
        let el = parse("<permissions><permission><name>get_tasks</name></permission></permissions>");
        let perms = Permission::parse_list(Some(&el));
        assert_eq!(perms.len(), 1);
        assert_eq!(perms[0].name.as_deref(), Some("get_tasks"));
    }

    #[test]
    fn absent_wrapper_is_empty_list() {
        assert!(Permission::parse_list(None).is_empty());
    }

    #[test]
    fn subject_and_resource_are_weak_references() {
        let el = parse(
            r#"<permission>
                 <name>modify_task</name>
                 <subject id="u1"><name>alice</name><type>user</type></subject>
                 <resource id="t1"><name>scan</name><type>task</type></resource>
               </permission>"#,
        );
        let perm = Permission::from_element(Some(&el));
        let subject = perm.subject.expect("subject parsed");
        assert_eq!(subject.id.as_deref(), Some("u1"));
        assert_eq!(subject.name.as_deref(), Some("alice"));
        assert_eq!(subject.entity_type.as_deref(), Some("user"));
        assert_eq!(perm.resource.expect("resource parsed").id.as_deref(), Some("t1"));
    }
}
