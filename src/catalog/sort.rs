use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{Product, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortBy {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "price-low")]
    PriceLow,
    #[serde(rename = "price-high")]
    PriceHigh,
    #[serde(rename = "popular")]
    Popular,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::Newest,
        SortBy::PriceLow,
        SortBy::PriceHigh,
        SortBy::Popular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::PriceLow => "price-low",
            SortBy::PriceHigh => "price-high",
            SortBy::Popular => "popular",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortBy::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| Error::general(format!("unknown sort key: {s}")))
    }
}

/// Newest first; undated rows go last
fn newest<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare_products(sort_by: SortBy, a: &Product, b: &Product) -> Ordering {
    match sort_by {
        SortBy::Newest => newest(&a.created_at, &b.created_at),
        SortBy::PriceLow => a.effective_price().total_cmp(&b.effective_price()),
        SortBy::PriceHigh => b.effective_price().total_cmp(&a.effective_price()),
        SortBy::Popular => b
            .effective_views()
            .cmp(&a.effective_views())
            .then_with(|| b.effective_rating().total_cmp(&a.effective_rating())),
    }
}

/// Stable sort in place
pub fn sort_products(products: &mut [Product], sort_by: SortBy) {
    products.sort_by(|a, b| compare_products(sort_by, a, b));
}

/// Suppliers have no price; the price keys fall back to newest
pub fn sort_suppliers(suppliers: &mut [User], sort_by: SortBy) {
    match sort_by {
        SortBy::Popular => {
            suppliers.sort_by(|a, b| b.effective_rating().total_cmp(&a.effective_rating()))
        }
        _ => suppliers.sort_by(|a, b| newest(&a.created_at, &b.created_at)),
    }
}
