// Filter query language
//
// GMP identifies result pages, sort order, and search terms through a small
// textual query language, e.g.:
//
//   apply_overrides=0 levels=hml rows=2 min_qod=70 first=1 sort-reverse=severity
//
// `Filter` is the parsed form. It is a value object: every mutating
// operation returns a new `Filter`, so instances can be shared freely
// across concurrent requests.

mod term;

pub use term::{FilterTerm, Relation};

use crate::xml::Element;

/// Keywords with dedicated paging/sorting semantics, in canonical
/// serialization order. Everything else is a generic term.
const RESERVED_KEYWORDS: &[&str] = &[
    "apply_overrides",
    "delta_states",
    "first",
    "levels",
    "min_qod",
    "notes",
    "overrides",
    "result_hosts_only",
    "rows",
    "sort",
    "sort-reverse",
    "timezone",
];

/// Sentinel for `rows` meaning "no row limit".
pub const ALL_ROWS: i64 = -1;

/// Sort direction derived from which of `sort`/`sort-reverse` is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A parsed GMP filter string.
///
/// Reserved keywords (paging, sorting, severity thresholds) are kept apart
/// from generic `field<relation>value` terms; serialization emits the
/// keywords first in a fixed order so that semantically equal filters
/// produce the same string.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// Server-side id when this filter is a stored filter. Commands prefer
    /// sending `filter_id` over re-sending a potentially large filter string.
    id: Option<String>,
    /// Reserved keyword values, unique per keyword.
    reserved: Vec<(String, String)>,
    /// Generic terms in insertion order. Duplicate fields are legal (two
    /// terms on the same field express a range).
    terms: Vec<FilterTerm>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a filter string.
    ///
    /// Tokens are whitespace-separated; a double-quoted value keeps its
    /// embedded whitespace. Unknown tokens become generic terms — the
    /// grammar is permissive so that keywords added by newer servers are
    /// preserved rather than rejected.
    pub fn from_string(filter: &str) -> Self {
        let mut parsed = Self::new();
        for token in tokenize(filter) {
            let term = FilterTerm::parse(&token);
            let is_keyword = term.relation == Relation::Equals
                && term.field.as_deref().is_some_and(is_reserved);
            if is_keyword {
                let FilterTerm { field, value, .. } = term;
                if let Some(field) = field {
                    parsed.set_reserved(field, value);
                }
            } else {
                parsed.terms.push(term);
            }
        }
        parsed
    }

    /// Parse the `<filters id="…"><term>…</term></filters>` element that
    /// accompanies list responses, carrying the stored-filter id when the
    /// server has one.
    pub fn from_element(element: &Element) -> Self {
        let mut filter = element
            .child_text("term")
            .map(Self::from_string)
            .unwrap_or_default();
        // gsad emits id="" when the filter is not a stored one.
        filter.id = element
            .attr("id")
            .filter(|id| !id.is_empty())
            .map(str::to_owned);
        filter
    }

    /// The stored-filter id, if this filter exists server-side.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// The value of a reserved keyword.
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.reserved
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v.as_str())
    }

    /// A reserved keyword parsed as an integer.
    pub fn get_int(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(|v| v.parse().ok())
    }

    /// `true` if an equal term (same field, relation, and value) is present.
    pub fn has_term(&self, term: &FilterTerm) -> bool {
        if let Some(field) = term.field.as_deref() {
            if is_reserved(field) && term.relation == Relation::Equals {
                return self.get(field) == Some(term.value.as_str());
            }
        }
        self.terms.contains(term)
    }

    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }

    // ── Mutation (returns new instances) ─────────────────────────────

    /// Upsert a keyword or term.
    ///
    /// Reserved keywords are unique; generic terms are replaced only when a
    /// term with the same field *and* relation exists, so two-sided ranges
    /// (`qod>=10 qod<=50`) stay intact.
    pub fn set(&self, field: &str, value: impl Into<String>, relation: Relation) -> Self {
        let mut next = self.clone();
        let value = value.into();
        if is_reserved(field) && relation == Relation::Equals {
            next.set_reserved(field.to_owned(), value);
        } else {
            match next
                .terms
                .iter_mut()
                .find(|t| t.has_field(field) && t.relation == relation)
            {
                Some(existing) => existing.value = value,
                None => next.terms.push(FilterTerm::new(field, relation, value)),
            }
        }
        next
    }

    /// Append a term without replacing existing ones with the same field.
    pub fn add_term(&self, term: FilterTerm) -> Self {
        let mut next = self.clone();
        next.terms.push(term);
        next
    }

    /// Remove a reserved keyword or every term on the given field.
    pub fn delete(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.reserved.retain(|(k, _)| k != field);
        next.terms.retain(|t| !t.has_field(field));
        next
    }

    /// Merge another filter's keywords and terms, skipping anything already
    /// present. Idempotent: `f.and(&f) == f`.
    pub fn and(&self, other: &Self) -> Self {
        let mut next = self.clone();
        for (keyword, value) in &other.reserved {
            if next.get(keyword).is_none() {
                next.set_reserved(keyword.clone(), value.clone());
            }
        }
        for term in &other.terms {
            if !next.has_term(term) {
                next.terms.push(term.clone());
            }
        }
        next
    }

    /// Reset paging to the first page, preserving `rows`.
    pub fn first(&self) -> Self {
        self.set("first", "1", Relation::Equals)
    }

    /// Remove the row limit: `rows` becomes the "no limit" sentinel and
    /// `first` is dropped entirely.
    pub fn all(&self) -> Self {
        self.set("rows", ALL_ROWS.to_string(), Relation::Equals)
            .delete("first")
    }

    // ── Sorting ──────────────────────────────────────────────────────

    /// The field the filter sorts by, whichever direction keyword holds it.
    pub fn get_sort_by(&self) -> Option<&str> {
        self.get("sort").or_else(|| self.get("sort-reverse"))
    }

    pub fn get_sort_order(&self) -> SortOrder {
        if self.get("sort-reverse").is_some() {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    /// Request sorting by `field`, flipping direction when the filter is
    /// already sorted by that field. An unsorted filter starts ascending.
    /// `sort` and `sort-reverse` never coexist.
    pub fn sort_change(&self, field: &str) -> Self {
        if self.get("sort").is_some_and(|f| f == field) {
            self.set("sort-reverse", field, Relation::Equals)
        } else {
            self.set("sort", field, Relation::Equals)
        }
    }

    // ── Serialization ────────────────────────────────────────────────

    /// Canonical filter string: reserved keywords first in fixed order,
    /// then generic terms in insertion order.
    pub fn to_filter_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for keyword in RESERVED_KEYWORDS {
            if let Some(value) = self.get(keyword) {
                parts.push(FilterTerm::new(*keyword, Relation::Equals, value).to_string());
            }
        }
        parts.extend(self.terms.iter().map(ToString::to_string));
        parts.join(" ")
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_reserved(&mut self, keyword: String, value: String) {
        // sort and sort-reverse are mutually exclusive.
        if keyword == "sort" {
            self.reserved.retain(|(k, _)| k != "sort-reverse");
        } else if keyword == "sort-reverse" {
            self.reserved.retain(|(k, _)| k != "sort");
        }
        match self.reserved.iter_mut().find(|(k, _)| *k == keyword) {
            Some((_, existing)) => *existing = value,
            None => self.reserved.push((keyword, value)),
        }
    }
}

/// Equality is semantic: same reserved keyword values and the same multiset
/// of generic terms, insertion order ignored. The stored-filter id does not
/// participate — it is routing metadata, not a predicate.
impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        if self.reserved.len() != other.reserved.len() || self.terms.len() != other.terms.len() {
            return false;
        }
        let keywords_match = self
            .reserved
            .iter()
            .all(|(k, v)| other.get(k) == Some(v.as_str()));
        keywords_match && multiset_eq(&self.terms, &other.terms)
    }
}

impl Eq for Filter {}

fn multiset_eq(a: &[FilterTerm], b: &[FilterTerm]) -> bool {
    let mut unmatched: Vec<&FilterTerm> = b.iter().collect();
    for term in a {
        match unmatched.iter().position(|t| *t == term) {
            Some(pos) => {
                unmatched.swap_remove(pos);
            }
            None => return false,
        }
    }
    unmatched.is_empty()
}

fn is_reserved(field: &str) -> bool {
    RESERVED_KEYWORDS.contains(&field)
}

/// Split a filter string on whitespace, honoring double-quoted spans.
fn tokenize(filter: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in filter.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_mixed_filter_string() {
        let f = Filter::from_string(
            "apply_overrides=0 levels=hml rows=2 min_qod=70 first=1 sort-reverse=severity",
        );
        assert_eq!(f.get("apply_overrides"), Some("0"));
        assert_eq!(f.get("levels"), Some("hml"));
        assert_eq!(f.get_int("rows"), Some(2));
        assert_eq!(f.get_int("min_qod"), Some(70));
        assert_eq!(f.get_int("first"), Some(1));
        assert_eq!(f.get_sort_by(), Some("severity"));
        assert_eq!(f.get_sort_order(), SortOrder::Descending);
    }

    #[test]
    fn round_trip_is_identity() {
        let strings = [
            "apply_overrides=0 levels=hml rows=2 min_qod=70 first=1 sort-reverse=severity",
            "first=1 rows=10 severity>6.9",
            "name~web qod>=30 qod<=70",
            "rows=-1 \"quoted term\"",
            "\"a~b c\"",
            "name=\"a<b\" \"x>=y\"",
        ];
        for s in strings {
            let f = Filter::from_string(s);
            assert_eq!(Filter::from_string(&f.to_filter_string()), f, "for {s:?}");
        }
    }

    #[test]
    fn serialization_orders_reserved_keywords_first() {
        let f = Filter::from_string("severity>6.9 rows=10 first=1");
        assert_eq!(f.to_filter_string(), "first=1 rows=10 severity>6.9");
    }

    #[test]
    fn unknown_keywords_are_preserved_as_terms() {
        let f = Filter::from_string("future_keyword=x");
        assert_eq!(f.terms().len(), 1);
        assert_eq!(f.to_filter_string(), "future_keyword=x");
    }

    #[test]
    fn set_upserts_reserved_keyword() {
        let f = Filter::from_string("rows=10").set("rows", "25", Relation::Equals);
        assert_eq!(f.get_int("rows"), Some(25));
        assert_eq!(f.to_filter_string(), "rows=25");
    }

    #[test]
    fn set_keeps_two_sided_ranges() {
        let f = Filter::new()
            .set("qod", "10", Relation::GreaterOrEqual)
            .set("qod", "50", Relation::LessOrEqual);
        assert_eq!(f.terms().len(), 2);
        let narrowed = f.set("qod", "20", Relation::GreaterOrEqual);
        assert_eq!(narrowed.terms().len(), 2);
        assert_eq!(narrowed.to_filter_string(), "qod>=20 qod<=50");
    }

    #[test]
    fn and_skips_existing_terms() {
        let f = Filter::from_string("first=1 rows=10 severity>6.9");
        assert_eq!(f.and(&f), f);

        let merged = f.and(&Filter::from_string("rows=99 name~web"));
        assert_eq!(merged.get_int("rows"), Some(10));
        assert!(merged.has_term(&FilterTerm::new("name", Relation::Approx, "web")));
    }

    #[test]
    fn first_resets_paging_and_keeps_rows() {
        let f = Filter::from_string("first=11 rows=5").first();
        assert_eq!(f.get_int("first"), Some(1));
        assert_eq!(f.get_int("rows"), Some(5));
    }

    #[test]
    fn all_removes_first_and_unlimits_rows() {
        let f = Filter::from_string("first=11 rows=5").all();
        assert_eq!(f.get("first"), None);
        assert_eq!(f.get_int("rows"), Some(ALL_ROWS));
    }

    #[test]
    fn sort_change_toggles_direction() {
        let f = Filter::new().sort_change("severity");
        assert_eq!(f.get("sort"), Some("severity"));
        assert_eq!(f.get("sort-reverse"), None);

        let reversed = f.sort_change("severity");
        assert_eq!(reversed.get("sort"), None);
        assert_eq!(reversed.get("sort-reverse"), Some("severity"));

        let back = reversed.sort_change("severity");
        assert_eq!(back.get("sort"), Some("severity"));
        assert_eq!(back.get("sort-reverse"), None);
    }

    #[test]
    fn sort_change_on_other_field_starts_ascending() {
        let f = Filter::from_string("sort-reverse=severity").sort_change("name");
        assert_eq!(f.get("sort"), Some("name"));
        assert_eq!(f.get("sort-reverse"), None);
    }

    #[test]
    fn equality_ignores_term_order() {
        let a = Filter::from_string("first=1 name~web severity>6.9");
        let b = Filter::from_string("severity>6.9 name~web first=1");
        assert_eq!(a, b);
    }

    #[test]
    fn equality_counts_duplicate_terms() {
        let once = Filter::from_string("name~web");
        let twice = once.add_term(FilterTerm::new("name", Relation::Approx, "web"));
        assert_ne!(once, twice);
    }
}
