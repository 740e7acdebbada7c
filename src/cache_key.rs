//! Cache key generation utilities
//!
//! This module provides consistent cache key generation
//! for the filtered-invoice query results.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Namespace grouping every cached filtered-invoice query result.
/// All keys built here are registered under this namespace's
/// invalidation index and are purged together on any invoice mutation.
pub const FILTERED_INVOICES_NS: &str = "filtered_invoices";

/// Characters that would make the `:`-delimited key scheme ambiguous if a
/// search term contained them. `%` itself must be escaped so the encoding
/// stays injective.
const TERM_ESCAPE: &AsciiSet = &CONTROLS.add(b':').add(b'%');

/// Generate cache key for a filtered invoice page.
///
/// Deterministic with respect to its inputs; two distinct
/// `(term, page, per_page)` tuples never map to the same key.
pub fn filtered_invoices(term: &str, page: u32, per_page: u32) -> String {
    format!(
        "{}:query={}:page={}:perPage={}",
        FILTERED_INVOICES_NS,
        utf8_percent_encode(term, TERM_ESCAPE),
        page,
        per_page
    )
}

/// Generate cache key for the filtered invoice total count.
pub fn invoice_count(term: &str) -> String {
    format!(
        "{}:count:query={}",
        FILTERED_INVOICES_NS,
        utf8_percent_encode(term, TERM_ESCAPE)
    )
}

/// Key of the set that indexes every live key in a namespace.
pub fn namespace_index(namespace: &str) -> String {
    format!("{}:keys", namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_term_matches_reference_format() {
        assert_eq!(
            filtered_invoices("", 1, 6),
            "filtered_invoices:query=:page=1:perPage=6"
        );
    }

    #[test]
    fn key_is_deterministic() {
        assert_eq!(
            filtered_invoices("alice", 2, 10),
            filtered_invoices("alice", 2, 10)
        );
    }

    #[test]
    fn each_argument_changes_the_key() {
        let base = filtered_invoices("alice", 1, 6);
        assert_ne!(base, filtered_invoices("", 1, 6));
        assert_ne!(base, filtered_invoices("bob", 1, 6));
        assert_ne!(base, filtered_invoices("alice", 2, 6));
        assert_ne!(base, filtered_invoices("alice", 1, 7));
    }

    #[test]
    fn delimiter_characters_in_term_cannot_collide() {
        // Without escaping, these two would both render
        // "filtered_invoices:query=a:page=1:page=1:perPage=6".
        let tricky = filtered_invoices("a:page=1", 1, 6);
        let plain = filtered_invoices("a", 1, 6);
        assert_ne!(tricky, plain);
        assert_ne!(filtered_invoices("a%3A", 1, 6), filtered_invoices("a:", 1, 6));
    }

    #[test]
    fn count_key_differs_from_page_keys() {
        assert_eq!(invoice_count("alice"), "filtered_invoices:count:query=alice");
        assert_ne!(invoice_count(""), filtered_invoices("", 1, 6));
    }

    #[test]
    fn index_key_format() {
        assert_eq!(namespace_index(FILTERED_INVOICES_NS), "filtered_invoices:keys");
    }
}
