// Envelope parsing
//
// Every GMP response over HTTP arrives wrapped in an `<envelope>` root
// whose direct children mix protocol metadata (version, time, timezone,
// backend operation) with exactly one command-specific payload element.
// This module splits the two and turns embedded error reports into
// `Error::Response` rejections.

use crate::error::Error;

use super::Element;

/// Protocol metadata extracted from the envelope. These nodes are removed
/// from the payload before command-layer parsing — they are never
/// legitimate entity fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMeta {
    pub version: Option<String>,
    pub backend_operation: Option<String>,
    pub vendor_version: Option<String>,
    pub i18n: Option<String>,
    pub time: Option<String>,
    pub timezone: Option<String>,
}

const META_FIELDS: &[&str] = &[
    "version",
    "backend_operation",
    "vendor_version",
    "i18n",
    "time",
    "timezone",
];

/// A parsed response: metadata plus the payload element tree (the envelope
/// root with the metadata children already removed).
#[derive(Debug, Clone)]
pub struct Envelope {
    pub meta: ResponseMeta,
    pub root: Element,
}

/// Parse a response body into an [`Envelope`].
///
/// A body that is not XML, or whose root is not `<envelope>`, is a
/// malformed protocol response — a defect, not a rejection. A well-formed
/// envelope carrying a failing `action_result` (or a `gsad_response`
/// diagnostic) is the expected error shape and comes back as
/// [`Error::Response`].
pub fn parse_envelope(body: &str) -> Result<Envelope, Error> {
    let doc = roxmltree::Document::parse(body).map_err(|e| Error::MalformedResponse {
        message: format!("response body is not XML: {e}"),
    })?;
    let root_node = doc.root_element();
    if root_node.tag_name().name() != "envelope" {
        return Err(Error::MalformedResponse {
            message: format!(
                "expected <envelope> root, found <{}>",
                root_node.tag_name().name()
            ),
        });
    }

    let mut root = Element::from_node(root_node);

    let mut meta = ResponseMeta::default();
    for field in META_FIELDS {
        let value = root.remove_child(field).and_then(|el| {
            el.text().map(str::to_owned)
        });
        match *field {
            "version" => meta.version = value,
            "backend_operation" => meta.backend_operation = value,
            "vendor_version" => meta.vendor_version = value,
            "i18n" => meta.i18n = value,
            "time" => meta.time = value,
            "timezone" => meta.timezone = value,
            _ => {}
        }
    }

    if let Some(error) = embedded_error(&root, None) {
        return Err(error);
    }

    Ok(Envelope { meta, root })
}

/// Extract the server's diagnostic message from a rejection body without
/// full envelope validation. Used for non-2xx responses, whose bodies are
/// best-effort XML.
pub fn extract_rejection_message(body: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(body).ok()?;
    let root = Element::from_node(doc.root_element());
    rejection_message(&root)
}

/// The embedded error for a parsed envelope, if its payload reports one.
///
/// `action_result` carries a numeric status; anything outside 2xx is a
/// failure. A bare `gsad_response` element is always a failure report.
fn embedded_error(root: &Element, http_status: Option<u16>) -> Option<Error> {
    let failed_action = root
        .child("action_result")
        .and_then(|ar| ar.child_text("status"))
        .and_then(|s| s.parse::<u16>().ok())
        .is_some_and(|status| !(200..300).contains(&status));

    if failed_action || root.child("gsad_response").is_some() {
        let message = rejection_message(root).unwrap_or_else(|| "Unknown error".to_owned());
        return Some(Error::Response {
            message,
            status: http_status,
        });
    }
    None
}

/// Message extraction precedence: `gsad_response` overrides `action_result`
/// — it is the gateway's more specific diagnostic. Preserved exactly;
/// servers depend on this shape.
fn rejection_message(root: &Element) -> Option<String> {
    let from = |name: &str| {
        root.child(name)
            .and_then(|el| el.child_text("message"))
            .map(str::to_owned)
    };
    from("gsad_response").or_else(|| from("action_result"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ENVELOPE: &str = r#"
        <envelope>
          <version>22.04</version>
          <vendor_version/>
          <token>abc</token>
          <time>Mon Aug 24 12:00:00 2026 CEST</time>
          <timezone>Europe/Berlin</timezone>
          <backend_operation>0.02</backend_operation>
          <i18n>en</i18n>
          <get_tasks_response status="200" status_text="OK">
            <task id="t1"/>
          </get_tasks_response>
        </envelope>"#;

    #[test]
    fn meta_is_extracted_and_removed_from_payload() {
        let envelope = parse_envelope(ENVELOPE).expect("envelope parses");
        assert_eq!(envelope.meta.version.as_deref(), Some("22.04"));
        assert_eq!(envelope.meta.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(envelope.meta.i18n.as_deref(), Some("en"));
        assert_eq!(envelope.meta.backend_operation.as_deref(), Some("0.02"));
        assert_eq!(envelope.meta.vendor_version, None);

        // Payload keeps the command response but none of the meta nodes.
        assert!(envelope.root.child("get_tasks_response").is_some());
        for field in ["version", "time", "timezone", "backend_operation", "i18n"] {
            assert!(envelope.root.child(field).is_none(), "{field} not removed");
        }
    }

    #[test]
    fn non_xml_body_is_a_defect() {
        let err = parse_envelope("not xml at all").expect_err("must fail");
        assert!(err.is_defect());
    }

    #[test]
    fn wrong_root_is_a_defect() {
        let err = parse_envelope("<html/>").expect_err("must fail");
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn failing_action_result_becomes_rejection() {
        let body = r#"
            <envelope>
              <action_result>
                <status>400</status>
                <message>Bogus command</message>
              </action_result>
            </envelope>"#;
        let err = parse_envelope(body).expect_err("must reject");
        assert!(!err.is_defect());
        assert_eq!(err.server_message(), Some("Bogus command"));
    }

    #[test]
    fn successful_action_result_is_not_an_error() {
        let body = r#"
            <envelope>
              <action_result>
                <status>201</status>
                <message>OK, resource created</message>
              </action_result>
            </envelope>"#;
        assert!(parse_envelope(body).is_ok());
    }

    #[test]
    fn gsad_response_message_wins_over_action_result() {
        let body = r#"
            <envelope>
              <action_result>
                <status>400</status>
                <message>foo</message>
              </action_result>
              <gsad_response>
                <message>bar</message>
              </gsad_response>
            </envelope>"#;
        let err = parse_envelope(body).expect_err("must reject");
        assert_eq!(err.server_message(), Some("bar"));
        assert_eq!(extract_rejection_message(body).as_deref(), Some("bar"));
    }
}
