// A single `field<relation>value` predicate within a filter string.
//
// Terms are parsed permissively: the grammar tolerates unknown fields and
// malformed relations so that filter strings written for newer servers
// still round-trip through older clients.

use std::fmt;

/// Comparison relation between a filter field and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relation {
    /// `=` — exact match. The default when no relation is written.
    #[default]
    Equals,
    /// `~` — substring / approximate match.
    Approx,
    /// `<` — less than.
    Less,
    /// `>` — greater than.
    Greater,
    /// `<=` — less than or equal.
    LessOrEqual,
    /// `>=` — greater than or equal.
    GreaterOrEqual,
}

impl Relation {
    /// The wire spelling of this relation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Approx => "~",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicate of a [`Filter`](super::Filter).
///
/// A term with no field (`field == None`) is a bare search word — the server
/// matches it against every searchable column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    pub field: Option<String>,
    pub relation: Relation,
    pub value: String,
}

impl FilterTerm {
    /// A `field=value` term.
    pub fn new(field: impl Into<String>, relation: Relation, value: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            relation,
            value: value.into(),
        }
    }

    /// A bare search-word term without a field.
    pub fn word(value: impl Into<String>) -> Self {
        Self {
            field: None,
            relation: Relation::Equals,
            value: value.into(),
        }
    }

    /// Parse a single token (quoted spans count as one token).
    ///
    /// Splits on the first relation operator found before the value's
    /// opening quote. Two-character relations (`<=`, `>=`) are matched
    /// before their one-character prefixes. A token that opens with a
    /// quote is a quoted search phrase — relation characters inside it are
    /// literal. A token with the operator in first position, or with no
    /// operator at all, is kept as a bare search word rather than rejected.
    pub fn parse(token: &str) -> Self {
        if token.starts_with('"') {
            return Self::word(unquote(token));
        }
        let head = &token[..token.find('"').unwrap_or(token.len())];

        let two_char = [("<=", Relation::LessOrEqual), (">=", Relation::GreaterOrEqual)];
        for (op, relation) in two_char {
            if let Some(pos) = head.find(op) {
                if pos > 0 {
                    return Self {
                        field: Some(token[..pos].to_owned()),
                        relation,
                        value: unquote(&token[pos + 2..]).to_owned(),
                    };
                }
            }
        }

        let one_char = [
            ('=', Relation::Equals),
            ('~', Relation::Approx),
            ('<', Relation::Less),
            ('>', Relation::Greater),
        ];
        let first = one_char
            .iter()
            .filter_map(|&(op, relation)| head.find(op).map(|pos| (pos, relation)))
            .min_by_key(|&(pos, _)| pos);

        match first {
            Some((pos, relation)) if pos > 0 => Self {
                field: Some(token[..pos].to_owned()),
                relation,
                value: unquote(&token[pos + 1..]).to_owned(),
            },
            // Leading operator or no operator: permissive fallback to a
            // bare word with `=`.
            _ => Self::word(unquote(token)),
        }
    }

    /// `true` if this term's field is the given keyword.
    pub fn has_field(&self, field: &str) -> bool {
        self.field.as_deref() == Some(field)
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = quote_if_needed(&self.value);
        match &self.field {
            Some(field) => write!(f, "{field}{}{value}", self.relation),
            None => f.write_str(&value),
        }
    }
}

/// Strip one layer of surrounding double quotes.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Quote a value that contains whitespace or relation characters so it
/// survives tokenization and reparses as the same term.
fn quote_if_needed(value: &str) -> String {
    if value.contains(char::is_whitespace) || value.contains(['=', '~', '<', '>']) {
        format!("\"{value}\"")
    } else {
        value.to_owned()
    }
}
