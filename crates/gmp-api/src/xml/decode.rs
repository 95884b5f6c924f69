// Fixed XML entity map
//
// gsad escapes entity values a second time inside the XML document, so the
// text the XML parser hands back still contains literal `&quot;` etc.
// Every attribute value and text node goes through `decode` exactly once
// while the element tree is built.

const ENTITIES: &[(&str, char)] = &[
    ("&quot;", '"'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&apos;", '\''),
    ("&#x2F;", '/'),
    ("&#x5C;", '\\'),
];

/// Decode the fixed entity set in a single left-to-right pass.
///
/// Single-pass matters: `&amp;lt;` decodes to `&lt;`, not `<`.
pub fn decode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Encode a value with the same entity set (`&` first, so later
/// replacements cannot be re-escaped).
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ENTITIES.iter().find(|&&(_, c)| c == ch) {
            Some((entity, _)) => out.push_str(entity),
            None => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_all_entities() {
        assert_eq!(
            decode("&quot;&lt;&gt;&amp;&apos;&#x2F;&#x5C;"),
            "\"<>&'/\\"
        );
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let original = "a \"quoted\" <tag> & 'piece' with / and \\";
        assert_eq!(decode(&encode(original)), original);
    }

    #[test]
    fn decode_is_single_pass() {
        assert_eq!(decode("&amp;lt;"), "&lt;");
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(decode("&nbsp; & co"), "&nbsp; & co");
    }
}
