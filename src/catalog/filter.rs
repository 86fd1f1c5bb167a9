use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::SortBy;
use crate::models::{Product, User};

/// The filter sidebar state, persisted between visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub price_range: (f64, f64),
    pub min_order_range: (u32, u32),
    pub min_rating: f64,
    pub sort_by: SortBy,
}

pub const MAX_PRICE: f64 = 1_000_000.0;
pub const MAX_MIN_ORDER: u32 = 100_000;

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            price_range: (0.0, MAX_PRICE),
            min_order_range: (1, MAX_MIN_ORDER),
            min_rating: 0.0,
            sort_by: SortBy::Newest,
        }
    }
}

impl FilterOptions {
    /// Whether anything differs from the defaults, for the "clear filters" button
    pub fn is_active(&self) -> bool {
        let defaults = Self::default();
        !self.categories.is_empty()
            || self.price_range != defaults.price_range
            || self.min_order_range != defaults.min_order_range
            || self.min_rating > 0.0
    }

    fn has_category(&self, category: Option<&str>) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        category.is_some_and(|c| {
            self.categories
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(c))
        })
    }
}

/// What the URL contributes to a product search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub text: String,
    pub supplier_id: Option<String>,
    pub new_arrivals: bool,
}

/// Lower-cased trimmed search text, `None` when blank
pub(crate) fn normalize(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_lowercase())
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn product_matches_text(product: &Product, needle: &str) -> bool {
    contains(Some(product.title.as_str()), needle)
        || contains(product.description.as_deref(), needle)
        || contains(product.category.as_deref(), needle)
        || contains(Some(product.supplier_name()), needle)
}

/// The single predicate every product goes through
pub fn product_matches(
    product: &Product,
    query: &ProductQuery,
    options: &FilterOptions,
    new_since: Option<DateTime<Utc>>,
) -> bool {
    if let Some(needle) = normalize(&query.text) {
        if !product_matches_text(product, &needle) {
            return false;
        }
    }
    if !options.has_category(product.category.as_deref()) {
        return false;
    }

    let (min_price, max_price) = options.price_range;
    let price = product.effective_price();
    if price < min_price || price > max_price {
        return false;
    }

    let (min_order_low, min_order_high) = options.min_order_range;
    let min_order = product.effective_min_order();
    if min_order < min_order_low || min_order > min_order_high {
        return false;
    }

    if product.effective_rating() < options.min_rating {
        return false;
    }
    if let Some(supplier_id) = query.supplier_id.as_deref().filter(|s| !s.is_empty()) {
        if product.supplier_id != supplier_id {
            return false;
        }
    }
    if let Some(since) = new_since {
        if !product.created_at.is_some_and(|created| created >= since) {
            return false;
        }
    }
    true
}

/// Cut-off for the "new arrivals" view
pub fn new_arrivals_since(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Keep the products passing [`product_matches`]
pub fn filter_products(
    products: &[Product],
    query: &ProductQuery,
    options: &FilterOptions,
    new_since: Option<DateTime<Utc>>,
) -> Vec<Product> {
    products
        .iter()
        .filter(|p| product_matches(p, query, options, new_since))
        .cloned()
        .collect()
}

/// Supplier search: text, categories and rating floor
pub fn supplier_matches(user: &User, text: &str, options: &FilterOptions) -> bool {
    if !user.is_supplier {
        return false;
    }
    if let Some(needle) = normalize(text) {
        let hit = contains(user.business_name.as_deref(), &needle)
            || contains(user.full_name.as_deref(), &needle)
            || contains(user.description.as_deref(), &needle)
            || contains(user.city.as_deref(), &needle);
        if !hit {
            return false;
        }
    }
    if !options.categories.is_empty()
        && !user
            .categories
            .iter()
            .any(|c| options.has_category(Some(c.as_str())))
    {
        return false;
    }
    user.effective_rating() >= options.min_rating
}

pub fn filter_suppliers(users: &[User], text: &str, options: &FilterOptions) -> Vec<User> {
    users
        .iter()
        .filter(|u| supplier_matches(u, text, options))
        .cloned()
        .collect()
}

/// Lowest and highest price among priced products, for the price slider
pub fn price_bounds(products: &[Product]) -> Option<(f64, f64)> {
    products
        .iter()
        .filter(|p| !p.contact_for_price)
        .filter_map(|p| p.price)
        .fold(None, |bounds, price| match bounds {
            None => Some((price, price)),
            Some((lo, hi)) => Some((f64::min(lo, price), f64::max(hi, price))),
        })
}
