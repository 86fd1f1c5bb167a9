use crate::error::Error;
use crate::models::{sort_for_strip, Category};
use crate::Marketplace;

pub const CATEGORIES_TABLE: &str = "categories";

/// Repository for the `categories` table
pub struct Categories<'a> {
    market: &'a Marketplace,
}

impl<'a> Categories<'a> {
    pub(crate) fn new(market: &'a Marketplace) -> Self {
        Self { market }
    }

    /// All categories in strip order
    pub async fn list(&self) -> Result<Vec<Category>, Error> {
        let mut categories: Vec<Category> = self
            .market
            .from(CATEGORIES_TABLE)
            .await?
            .select("*")
            .order("sort_order", true)
            .order("name", true)
            .execute()
            .await?;
        sort_for_strip(&mut categories);
        Ok(categories)
    }

    /// Top-level categories only
    pub async fn roots(&self) -> Result<Vec<Category>, Error> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|c| c.parent_id.is_none())
            .collect())
    }
}
