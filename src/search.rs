use crate::catalog::{Catalog, CountryRecord};

/// Countries whose name contains `query`, case-insensitively, in catalog order.
/// An empty query matches everything.
pub fn filter<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a CountryRecord> {
    let needle = query.to_lowercase();
    catalog
        .countries()
        .iter()
        .filter(|country| country.name.to_lowercase().contains(&needle))
        .collect()
}

/// Editable search line
#[derive(Clone, Debug, Default)]
pub struct SearchInput {
    query: String,
}

impl SearchInput {
    pub fn query(&self) -> &str {
        &self.query
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn push(&mut self, ch: char) {
        self.query.push(ch);
    }

    /// Backspace
    pub fn pop(&mut self) {
        self.query.pop();
    }

    pub fn clear(&mut self) {
        self.query.clear();
    }

    #[cfg(test)]
    pub fn set(&mut self, query: &str) {
        self.query = query.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[&CountryRecord]) -> Vec<String> {
        records.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn test_empty_query_keeps_order() {
        let catalog = Catalog::europe();
        let all = filter(&catalog, "");
        assert_eq!(all.len(), catalog.len());
        for (filtered, record) in all.iter().zip(catalog.countries()) {
            assert_eq!(filtered.id, record.id);
        }
    }

    #[test]
    fn test_case_insensitive_substring() {
        let catalog = Catalog::europe();
        assert_eq!(names(&filter(&catalog, "GERM")), ["Germany"]);
        assert_eq!(names(&filter(&catalog, "way")), ["Norway"]);
        assert_eq!(names(&filter(&catalog, "an")), ["Germany", "France"]);
    }

    #[test]
    fn test_idempotent() {
        let catalog = Catalog::europe();
        for query in ["", "a", "in", "United", "xyz123", "N"] {
            let first = names(&filter(&catalog, query));
            let second = names(&filter(&catalog, query));
            assert_eq!(first, second, "query {query:?}");
        }
    }

    #[test]
    fn test_no_match_is_empty() {
        let catalog = Catalog::europe();
        assert!(filter(&catalog, "xyz123").is_empty());
    }

    #[test]
    fn test_input_editing() {
        let mut input = SearchInput::default();
        for ch in "Spx".chars() {
            input.push(ch);
        }
        input.pop();
        assert_eq!(input.query(), "Sp");
        input.clear();
        assert!(input.is_empty());
    }
}
