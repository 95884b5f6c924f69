// Collection counts
//
// Pagination bookkeeping for list responses: where the current page
// starts, how big pages are, how many entries matched the filter, and how
// many exist in total. Navigation recomputes `first` and always clamps it
// to `[1, filtered]`.

use crate::filter::Filter;

/// Pagination/result-count metadata accompanying a list response.
///
/// `first` is 1-based. `rows` may be negative, meaning "no row limit".
/// Invariants: `length <= rows` (unless `rows < 0`) and `filtered <= all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionCounts {
    pub first: i64,
    pub rows: i64,
    pub filtered: i64,
    pub all: i64,
    pub length: i64,
}

impl CollectionCounts {
    /// Build counts from filter state and server-reported totals.
    ///
    /// The filter's `first`/`rows` win over the server-reported values;
    /// `length` is the number of entries actually returned, clamped to the
    /// page size.
    pub fn new(filter: &Filter, server_first: i64, server_rows: i64, filtered: i64, all: i64, length: i64) -> Self {
        let first = filter.get_int("first").unwrap_or(server_first).max(1);
        let rows = filter.get_int("rows").unwrap_or(server_rows);
        Self {
            first,
            rows,
            filtered,
            all,
            length: if rows < 0 { length } else { length.min(rows) },
        }
    }

    /// Number of entries a full page holds; `filtered` when unlimited.
    fn page_size(&self) -> i64 {
        if self.rows < 0 { self.filtered } else { self.rows }
    }

    fn clamp_first(&self, first: i64) -> i64 {
        first.clamp(1, self.filtered.max(1))
    }

    fn with_first(&self, first: i64) -> Self {
        let first = self.clamp_first(first);
        let remaining = (self.filtered - first + 1).max(0);
        Self {
            first,
            length: remaining.min(self.page_size()),
            ..*self
        }
    }

    // ── Navigation ──────────────────────────────────────────────────

    pub fn next(&self) -> Self {
        self.with_first(self.first + self.page_size().max(1))
    }

    pub fn previous(&self) -> Self {
        self.with_first(self.first - self.page_size().max(1))
    }

    pub fn first_page(&self) -> Self {
        self.with_first(1)
    }

    /// Jump to the last page: the final window of `rows` entries aligned
    /// to page boundaries.
    pub fn last_page(&self) -> Self {
        let rows = self.page_size().max(1);
        let last = if self.filtered > 0 {
            ((self.filtered - 1) / rows) * rows + 1
        } else {
            1
        };
        self.with_first(last)
    }

    pub fn has_next(&self) -> bool {
        self.rows >= 0 && self.first + self.rows <= self.filtered
    }

    pub fn has_previous(&self) -> bool {
        self.first > 1
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}
