//! Search, filter and pagination state carried in the page URL.
//!
//! Keys: `q`, `category`, `supplier`, `searchType`, `page`, `new`. Parsing is
//! lenient so a hand-edited or stale link still lands on a usable page.

use std::fmt;

use url::form_urlencoded;

use crate::catalog::ProductQuery;

/// Which list the search screen shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SearchType {
    #[default]
    Products,
    Suppliers,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Products => "products",
            SearchType::Suppliers => "suppliers",
        }
    }

    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("suppliers") {
            SearchType::Suppliers
        } else {
            SearchType::Products
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub q: String,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub search_type: SearchType,
    /// 1-based
    pub page: usize,
    pub new_arrivals: bool,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            q: String::new(),
            category: None,
            supplier: None,
            search_type: SearchType::Products,
            page: 1,
            new_arrivals: false,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl SearchState {
    /// Parse a query string, with or without the leading `?`.
    ///
    /// Unknown keys are ignored, a missing or unparsable `page` means page 1,
    /// and the last occurrence of a repeated key wins.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = SearchState::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "q" => state.q = value.trim().to_string(),
                "category" => state.category = non_blank(&value),
                "supplier" => state.supplier = non_blank(&value),
                "searchType" => state.search_type = SearchType::parse(value.trim()),
                "page" => {
                    state.page = value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|p| *p >= 1)
                        .unwrap_or(1)
                }
                "new" => state.new_arrivals = value.trim() == "true",
                _ => {}
            }
        }
        state
    }

    /// Parse the query part of a full URL
    pub fn from_url(url: &url::Url) -> Self {
        Self::parse(url.query().unwrap_or_default())
    }

    /// Encode back to a query string without the leading `?`.
    ///
    /// Defaults are left out: no `page` for page 1, no `searchType` for
    /// products, no `new` unless set.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.q.is_empty() {
            serializer.append_pair("q", &self.q);
        }
        if let Some(category) = &self.category {
            serializer.append_pair("category", category);
        }
        if let Some(supplier) = &self.supplier {
            serializer.append_pair("supplier", supplier);
        }
        if self.search_type != SearchType::Products {
            serializer.append_pair("searchType", self.search_type.as_str());
        }
        if self.page > 1 {
            serializer.append_pair("page", &self.page.to_string());
        }
        if self.new_arrivals {
            serializer.append_pair("new", "true");
        }
        serializer.finish()
    }

    /// A new search text starts over at page 1
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = q.into().trim().to_string();
        self.page = 1;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.and_then(|c| non_blank(&c));
        self.page = 1;
        self
    }

    /// Switching tabs starts over at page 1
    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        if self.search_type != search_type {
            self.search_type = search_type;
            self.page = 1;
        }
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn product_query(&self) -> ProductQuery {
        ProductQuery {
            text: self.q.clone(),
            supplier_id: self.supplier.clone(),
            new_arrivals: self.new_arrivals,
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self.to_query_string();
        if query.is_empty() {
            Ok(())
        } else {
            write!(f, "?{query}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_key() {
        let state = SearchState::parse(
            "?q=olive%20oil&category=Food&supplier=s1&searchType=suppliers&page=3&new=true",
        );
        assert_eq!(
            state,
            SearchState {
                q: "olive oil".into(),
                category: Some("Food".into()),
                supplier: Some("s1".into()),
                search_type: SearchType::Suppliers,
                page: 3,
                new_arrivals: true,
            }
        );
    }

    #[test]
    fn lenient_defaults() {
        let state = SearchState::parse("page=abc&searchType=widgets&new=1&utm_source=x&category=");
        assert_eq!(state, SearchState::default());
        assert_eq!(SearchState::parse("page=0").page, 1);
        assert_eq!(SearchState::parse("page=-4").page, 1);
        assert_eq!(SearchState::parse(""), SearchState::default());
    }

    #[test]
    fn round_trips_and_omits_defaults() {
        let state = SearchState::default()
            .with_query("שמן זית")
            .with_category(Some("Food".into()))
            .with_page(2);
        let encoded = state.to_query_string();
        assert!(!encoded.contains("searchType"));
        assert_eq!(SearchState::parse(&encoded), state);

        assert_eq!(SearchState::default().to_query_string(), "");
        assert_eq!(SearchState::default().with_page(1).to_string(), "");
        assert_eq!(SearchState::default().with_page(2).to_string(), "?page=2");
    }

    #[test]
    fn changing_the_search_resets_the_page() {
        let state = SearchState::parse("q=dates&page=4");
        assert_eq!(state.clone().with_query("figs").page, 1);
        assert_eq!(state.clone().with_search_type(SearchType::Suppliers).page, 1);
        assert_eq!(state.with_search_type(SearchType::Products).page, 4);
    }

    #[test]
    fn reads_a_full_url() {
        let url = url::Url::parse("https://shuk.example/search?q=tea&new=true").unwrap();
        let state = SearchState::from_url(&url);
        assert_eq!(state.q, "tea");
        assert!(state.product_query().new_arrivals);
    }
}
