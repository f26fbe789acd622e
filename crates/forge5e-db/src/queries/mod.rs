//! Query functions, one module per table.

pub mod characters;
pub mod progressions;

use crate::models::ListQuery;

/// `WHERE` clause shared by the list and count queries. `$1` is the
/// `ILIKE` pattern or NULL.
const NAME_FILTER: &str = "WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\\')";

/// `ILIKE` pattern for a name search, with wildcards in the input escaped.
fn search_pattern(query: &ListQuery) -> Option<String> {
    query.search.as_deref().map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_escapes_wildcards() {
        let query = ListQuery::new(1, 20, Some("50%_off".into()), None);
        assert_eq!(search_pattern(&query).as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn no_search_no_pattern() {
        let query = ListQuery::new(1, 20, Some("   ".into()), None);
        assert_eq!(search_pattern(&query), None);
    }
}
