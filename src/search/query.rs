use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Manufacturer domains used to focus the first search pass.
pub const MANUFACTURER_SITES: [&str; 8] = [
    "medtronic.com",
    "biotronik.com",
    "bostonscientific.com",
    "abbott.com",
    "sorin.com",
    "microport.com",
    "biomet.com",
    "stryker.com",
];

const KEYWORD_CLAUSE: &str = "(MRI compatibility OR MR conditional OR MRT tauglich)";

#[derive(ValueEnum, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Restrict to the known manufacturer domains, widening only if nothing is found
    #[default]
    Manufacturers,
    /// Search the whole web
    Broad,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Quotes the identifier text and ANDs it with the keyword clause.
    /// Quote characters inside `identifier` are passed through as-is.
    pub fn build(identifier: &str, scope: SearchScope) -> Self {
        let mut query = format!("\"{}\" {KEYWORD_CLAUSE}", identifier.trim());
        if scope == SearchScope::Manufacturers {
            let sites = MANUFACTURER_SITES
                .iter()
                .map(|d| format!("site:{d}"))
                .collect::<Vec<_>>()
                .join(" OR ");
            query.push(' ');
            query.push_str(&sites);
        }
        Self(query)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_query_contains_every_manufacturer_site() {
        let q = SearchQuery::build("Medtronic Attesta DR ATDR01", SearchScope::Manufacturers);
        for site in MANUFACTURER_SITES {
            assert!(q.as_str().contains(&format!("site:{site}")), "missing {site}: {q}");
        }
        assert_eq!(q.as_str().matches(" OR site:").count(), MANUFACTURER_SITES.len() - 1);
    }

    #[test]
    fn query_quotes_identifier_and_adds_keywords() {
        let q = SearchQuery::build("Biotronik Edora 8 DR-T", SearchScope::Manufacturers);
        assert!(q.as_str().starts_with("\"Biotronik Edora 8 DR-T\" "));
        assert!(q.as_str().contains(KEYWORD_CLAUSE));
    }

    #[test]
    fn broad_query_has_no_site_filters() {
        let q = SearchQuery::build("Abbott Assurity MRI", SearchScope::Broad);
        assert_eq!(
            q.as_str(),
            "\"Abbott Assurity MRI\" (MRI compatibility OR MR conditional OR MRT tauglich)"
        );
        assert!(!q.as_str().contains("site:"));
    }

    #[test]
    fn identifier_is_trimmed_but_not_escaped() {
        let q = SearchQuery::build("  Stryker \"Tritanium\"  ", SearchScope::Broad);
        assert!(q.as_str().starts_with("\"Stryker \"Tritanium\"\" "));
    }

    #[test]
    fn scope_parses_from_cli_value() {
        assert_eq!(
            SearchScope::from_str("broad", true).unwrap(),
            SearchScope::Broad
        );
        assert_eq!(
            SearchScope::from_str("manufacturers", true).unwrap(),
            SearchScope::Manufacturers
        );
    }
}
