use tracing::info;

use super::first_row;
use crate::error::Error;
use crate::models::{summarize, NewReview, RatingSummary, Review, Validate};
use crate::Marketplace;

pub const REVIEWS_TABLE: &str = "reviews";

/// Repository for the `reviews` table
pub struct Reviews<'a> {
    market: &'a Marketplace,
}

impl<'a> Reviews<'a> {
    pub(crate) fn new(market: &'a Marketplace) -> Self {
        Self { market }
    }

    async fn list_by(&self, column: &str, id: &str) -> Result<Vec<Review>, Error> {
        self.market
            .from(REVIEWS_TABLE)
            .await?
            .select("*")
            .eq(column, id)
            .order("created_at", false)
            .execute()
            .await
    }

    pub async fn for_product(&self, product_id: &str) -> Result<Vec<Review>, Error> {
        self.list_by("product_id", product_id).await
    }

    pub async fn for_supplier(&self, supplier_id: &str) -> Result<Vec<Review>, Error> {
        self.list_by("supplier_id", supplier_id).await
    }

    pub async fn product_summary(&self, product_id: &str) -> Result<RatingSummary, Error> {
        Ok(summarize(&self.for_product(product_id).await?))
    }

    pub async fn supplier_summary(&self, supplier_id: &str) -> Result<RatingSummary, Error> {
        Ok(summarize(&self.for_supplier(supplier_id).await?))
    }

    pub async fn create(&self, review: &NewReview) -> Result<Review, Error> {
        review.validate()?;
        let rows = self
            .market
            .from(REVIEWS_TABLE)
            .await?
            .insert(review)
            .execute()
            .await?;
        let created: Review = first_row(rows, "review insert")?;
        info!(review = %created.id, rating = created.rating, "review posted");
        Ok(created)
    }
}
