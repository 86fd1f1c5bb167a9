use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{collect, Validate};
use crate::error::{Error, FieldError};

/// A row of the `reviews` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub product_id: Option<String>,
    pub supplier_id: Option<String>,
    pub reviewer_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    pub reviewer_id: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Validate for NewReview {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();
        if !(1..=5).contains(&self.rating) {
            errors.push(FieldError::new("rating", "must be between 1 and 5"));
        }
        if self.product_id.is_none() && self.supplier_id.is_none() {
            errors.push(FieldError::new("product_id", "a product or supplier is required"));
        }
        if self.reviewer_id.trim().is_empty() {
            errors.push(FieldError::new("reviewer_id", "is required"));
        }
        collect(errors)
    }
}

/// Average and count, as shown next to the stars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
}

/// Average rating rounded to one decimal, zero for no reviews
pub fn summarize(reviews: &[Review]) -> RatingSummary {
    if reviews.is_empty() {
        return RatingSummary { average: 0.0, count: 0 };
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let average = f64::from(sum) / reviews.len() as f64;
    RatingSummary {
        average: (average * 10.0).round() / 10.0,
        count: reviews.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: format!("r{rating}"),
            product_id: Some("p1".into()),
            supplier_id: None,
            reviewer_id: "b1".into(),
            rating,
            comment: None,
            created_at: None,
        }
    }

    #[test]
    fn averages_to_one_decimal() {
        let summary = summarize(&[review(5), review(4), review(4)]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, 4.3);
        assert_eq!(summarize(&[]).average, 0.0);
    }

    #[test]
    fn rating_bounds() {
        let form = NewReview {
            product_id: Some("p1".into()),
            reviewer_id: "b1".into(),
            rating: 6,
            ..Default::default()
        };
        assert!(form.validate().is_err());
        assert!(NewReview { rating: 5, ..form }.validate().is_ok());
    }
}
