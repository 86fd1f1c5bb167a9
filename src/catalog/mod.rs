//! In-memory catalog pipeline: filter, then sort, then paginate.
//!
//! Every product view (the browse page, a supplier's storefront, search and
//! new arrivals) goes through [`Catalog::products`], so the same filter
//! sidebar state always gives the same answer.

mod filter;
mod page;
mod sort;

pub use filter::*;
pub use page::*;
pub use sort::*;

use chrono::{DateTime, Utc};

use crate::config::{ClientOptions, DEFAULT_PAGE_SIZE};
use crate::models::{Product, User};
use crate::search_params::SearchState;

/// Filter, sort and paginate in one pass
pub fn apply(
    products: &[Product],
    query: &ProductQuery,
    options: &FilterOptions,
    new_since: Option<DateTime<Utc>>,
    page: usize,
    page_size: usize,
) -> Page<Product> {
    let mut matched = filter_products(products, query, options, new_since);
    sort_products(&mut matched, options.sort_by);
    tracing::debug!(
        total = products.len(),
        matched = matched.len(),
        page,
        sort = %options.sort_by,
        "catalog query"
    );
    paginate(&matched, page, page_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    pub page_size: usize,
    pub new_arrivals_days: i64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            new_arrivals_days: 30,
        }
    }
}

impl From<&ClientOptions> for Catalog {
    fn from(options: &ClientOptions) -> Self {
        Self {
            page_size: options.page_size,
            new_arrivals_days: options.new_arrivals_days,
        }
    }
}

impl Catalog {
    /// Filter, sort and cut out one page of products
    pub fn products(
        &self,
        products: &[Product],
        query: &ProductQuery,
        options: &FilterOptions,
        page: usize,
        now: DateTime<Utc>,
    ) -> Page<Product> {
        let new_since = query
            .new_arrivals
            .then(|| new_arrivals_since(now, self.new_arrivals_days));
        apply(products, query, options, new_since, page, self.page_size)
    }

    pub fn suppliers(
        &self,
        users: &[User],
        text: &str,
        options: &FilterOptions,
        page: usize,
    ) -> Page<User> {
        let mut matched = filter_suppliers(users, text, options);
        sort_suppliers(&mut matched, options.sort_by);
        paginate(&matched, page, self.page_size)
    }

    /// Products for the state encoded in the page URL
    pub fn products_for(
        &self,
        products: &[Product],
        state: &SearchState,
        options: &FilterOptions,
        now: DateTime<Utc>,
    ) -> Page<Product> {
        let mut options = options.clone();
        if let Some(category) = state.category.as_deref().filter(|c| !c.is_empty()) {
            if !options.categories.iter().any(|c| c.eq_ignore_ascii_case(category)) {
                options.categories.push(category.to_string());
            }
        }
        self.products(products, &state.product_query(), &options, state.page, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn product(id: usize, price: Option<f64>) -> Product {
        serde_json::from_value(json!({
            "id": format!("p{id}"),
            "supplier_id": if id % 2 == 0 { "s-even" } else { "s-odd" },
            "title": format!("Item {id}"),
            "price": price,
            "category": if id % 3 == 0 { "Food" } else { "Textiles" },
            "created_at": (now() - Duration::days(id as i64)).to_rfc3339(),
        }))
        .unwrap()
    }

    fn many(n: usize) -> Vec<Product> {
        (1..=n).map(|i| product(i, Some(i as f64))).collect()
    }

    #[test]
    fn second_page_holds_items_31_to_60() {
        let catalog = Catalog::default();
        let products = many(75);
        let options = FilterOptions {
            sort_by: SortBy::PriceLow,
            ..Default::default()
        };

        let page = catalog.products(&products, &ProductQuery::default(), &options, 2, now());
        assert_eq!(page.items.len(), 30);
        assert_eq!(page.items.first().unwrap().id, "p31");
        assert_eq!(page.items.last().unwrap().id, "p60");
        assert_eq!(page.total_items, 75);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next() && page.has_previous());
    }

    #[test]
    fn price_range_is_inclusive() {
        let options = FilterOptions {
            price_range: (10.0, 20.0),
            ..Default::default()
        };
        let page =
            Catalog::default().products(&many(40), &ProductQuery::default(), &options, 1, now());
        assert_eq!(page.total_items, 11);
        assert!(page.items.iter().all(|p| (10.0..=20.0).contains(&p.effective_price())));
    }

    #[test]
    fn price_low_is_non_decreasing_with_missing_prices_first() {
        let mut products = vec![
            product(1, Some(50.0)),
            product(2, None),
            product(3, Some(5.0)),
            product(4, Some(50.0)),
        ];
        sort_products(&mut products, SortBy::PriceLow);
        let prices: Vec<f64> = products.iter().map(Product::effective_price).collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(products[0].id, "p2");
        // stable: p1 stays before p4
        assert_eq!(products[2].id, "p1");
        assert_eq!(products[3].id, "p4");
    }

    #[test]
    fn newest_puts_undated_last() {
        let mut undated = product(9, Some(1.0));
        undated.created_at = None;
        let mut products = vec![undated, product(5, None), product(1, None)];
        sort_products(&mut products, SortBy::Newest);
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p5", "p9"]);
    }

    #[test]
    fn popular_breaks_view_ties_by_rating() {
        let mut a = product(1, None);
        a.views = Some(10);
        a.rating = Some(3.0);
        let mut b = product(2, None);
        b.views = Some(10);
        b.rating = Some(4.5);
        let mut c = product(3, None);
        c.views = Some(99);

        let mut products = vec![a, b, c];
        sort_products(&mut products, SortBy::Popular);
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p3", "p2", "p1"]);
    }

    #[test]
    fn out_of_range_pages() {
        let catalog = Catalog::default();
        let products = many(10);
        let options = FilterOptions::default();

        let first = catalog.products(&products, &ProductQuery::default(), &options, 0, now());
        assert_eq!(first.page, 1);
        assert_eq!(first.items.len(), 10);

        let past = catalog.products(&products, &ProductQuery::default(), &options, 4, now());
        assert!(past.is_empty());
        assert_eq!(past.total_pages, 1);

        let none = catalog.products(&[], &ProductQuery::default(), &options, 1, now());
        assert_eq!(none.total_pages, 1);
        assert!(!none.has_next());
    }

    #[test]
    fn text_supplier_and_new_arrivals() {
        let products = many(60);
        let options = FilterOptions::default();
        let catalog = Catalog::default();

        let query = ProductQuery {
            text: "  item 4".into(),
            ..Default::default()
        };
        let ids: Vec<String> = catalog
            .products(&products, &query, &options, 1, now())
            .items
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(
            ids,
            ["p4", "p40", "p41", "p42", "p43", "p44", "p45", "p46", "p47", "p48", "p49"]
        );

        let query = ProductQuery {
            supplier_id: Some("s-even".into()),
            new_arrivals: true,
            ..Default::default()
        };
        let page = catalog.products(&products, &query, &options, 1, now());
        assert_eq!(page.total_items, 15);
        assert!(page.items.iter().all(|p| p.supplier_id == "s-even"));
    }

    #[test]
    fn categories_and_min_order() {
        let mut products = many(9);
        products[0].min_order = Some(500);
        let options = FilterOptions {
            categories: vec!["food".into()],
            min_order_range: (1, 100),
            ..Default::default()
        };
        let page =
            Catalog::default().products(&products, &ProductQuery::default(), &options, 1, now());
        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p3", "p6", "p9"]);
        assert!(options.is_active());
        assert!(!FilterOptions::default().is_active());
    }

    #[test]
    fn supplier_search_skips_buyers() {
        let users: Vec<User> = serde_json::from_value(json!([
            {"id": "u1", "business_name": "Levi Textiles", "is_supplier": true, "rating": 4.0, "categories": ["Textiles"]},
            {"id": "u2", "business_name": "Levi Buying", "is_supplier": false, "is_buyer": true},
            {"id": "u3", "business_name": "Cohen Foods", "is_supplier": true, "rating": 4.8, "categories": ["Food"]}
        ]))
        .unwrap();

        let page = Catalog::default().suppliers(&users, "levi", &FilterOptions::default(), 1);
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].id, "u1");

        let options = FilterOptions {
            sort_by: SortBy::Popular,
            ..Default::default()
        };
        let page = Catalog::default().suppliers(&users, "", &options, 1);
        let ids: Vec<&str> = page.items.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["u3", "u1"]);
    }

    #[test]
    fn sort_keys_round_trip_through_strings() {
        assert_eq!("price-high".parse::<SortBy>().unwrap(), SortBy::PriceHigh);
        assert!("cheapest".parse::<SortBy>().is_err());
        assert_eq!(serde_json::to_value(SortBy::PriceLow).unwrap(), json!("price-low"));
    }

    #[test]
    fn pager_window() {
        assert_eq!(page_window(1, 1, 2), vec![Some(1)]);
        assert_eq!(
            page_window(6, 10, 1),
            vec![Some(1), None, Some(5), Some(6), Some(7), None, Some(10)]
        );
        assert_eq!(page_window(2, 4, 1), vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn price_bounds_ignore_quote_only_products() {
        let mut products = many(5);
        products[4].contact_for_price = true;
        assert_eq!(price_bounds(&products), Some((1.0, 4.0)));
        assert_eq!(price_bounds(&[]), None);
    }
}
