use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{collect, Validate};
use crate::error::{Error, FieldError};

pub const DEFAULT_CURRENCY: &str = "ILS";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_true() -> bool {
    true
}

/// The supplier columns embedded into product listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub id: String,
    pub business_name: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl SupplierSummary {
    /// The name shown on product cards
    pub fn display_name(&self) -> &str {
        self.business_name
            .as_deref()
            .or(self.full_name.as_deref())
            .unwrap_or_default()
    }
}

/// A row of the `products` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub supplier_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub contact_for_price: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub min_order: Option<u32>,
    pub unit: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub views: Option<u64>,
    pub stock: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<SupplierSummary>,
}

impl Product {
    /// Price used for filtering and sorting; missing counts as zero
    pub fn effective_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    /// Minimum order used for filtering; missing counts as one unit
    pub fn effective_min_order(&self) -> u32 {
        self.min_order.unwrap_or(1)
    }

    pub fn effective_rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    pub fn effective_views(&self) -> u64 {
        self.views.unwrap_or(0)
    }

    /// The picture shown on cards
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// `₪12.50` style label, or the contact hint
    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) if !self.contact_for_price => {
                let symbol = if self.currency == DEFAULT_CURRENCY { "₪" } else { "" };
                if symbol.is_empty() {
                    format!("{:.2} {}", price, self.currency)
                } else {
                    format!("{}{:.2}", symbol, price)
                }
            }
            _ => "Contact for price".to_string(),
        }
    }

    pub fn supplier_name(&self) -> &str {
        self.supplier
            .as_ref()
            .map(SupplierSummary::display_name)
            .unwrap_or_default()
    }
}

/// The add-product form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub supplier_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub contact_for_price: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

/// The edit-product form; only filled fields are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_for_price: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn check_pricing(
    errors: &mut Vec<FieldError>,
    price: Option<f64>,
    contact_for_price: bool,
    require_price: bool,
) {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => {
            errors.push(FieldError::new("price", "must not be negative"));
        }
        Some(p) if p == 0.0 && !contact_for_price && require_price => {
            errors.push(FieldError::new("price", "is required unless contact for price is set"));
        }
        None if !contact_for_price && require_price => {
            errors.push(FieldError::new("price", "is required unless contact for price is set"));
        }
        _ => {}
    }
}

fn check_min_order(errors: &mut Vec<FieldError>, min_order: Option<u32>) {
    if min_order == Some(0) {
        errors.push(FieldError::new("min_order", "must be at least 1"));
    }
}

impl Validate for NewProduct {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();
        if self.supplier_id.trim().is_empty() {
            errors.push(FieldError::new("supplier_id", "is required"));
        }
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "is required"));
        }
        check_pricing(&mut errors, self.price, self.contact_for_price, true);
        check_min_order(&mut errors, self.min_order);
        collect(errors)
    }
}

impl Validate for ProductUpdate {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            errors.push(FieldError::new("title", "must not be blank"));
        }
        // Touching the price or switching contact-for-price off re-checks the pricing rule.
        let require_price = self.price.is_some() || self.contact_for_price == Some(false);
        check_pricing(
            &mut errors,
            self.price,
            self.contact_for_price.unwrap_or(false),
            require_price,
        );
        check_min_order(&mut errors, self.min_order);
        collect(errors)
    }
}

impl From<&Product> for ProductUpdate {
    /// Prefill the edit form from an existing product
    fn from(product: &Product) -> Self {
        Self {
            title: Some(product.title.clone()),
            description: product.description.clone(),
            price: product.price,
            contact_for_price: Some(product.contact_for_price),
            min_order: product.min_order,
            unit: product.unit.clone(),
            category: product.category.clone(),
            images: Some(product.images.clone()),
            stock: product.stock,
            is_active: Some(product.is_active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewProduct {
        NewProduct {
            supplier_id: "s1".into(),
            title: "Olive oil 5L".into(),
            price: Some(89.9),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_priced_or_contact_products() {
        assert!(form().validate().is_ok());

        let contact = NewProduct {
            price: None,
            contact_for_price: true,
            ..form()
        };
        assert!(contact.validate().is_ok());
    }

    #[test]
    fn reports_every_failing_field() {
        let bad = NewProduct {
            supplier_id: String::new(),
            title: "  ".into(),
            price: None,
            min_order: Some(0),
            ..Default::default()
        };
        let err = bad.validate().unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["supplier_id", "title", "price", "min_order"]);
    }

    #[test]
    fn negative_price_is_rejected_even_with_contact() {
        let bad = NewProduct {
            price: Some(-1.0),
            contact_for_price: true,
            ..form()
        };
        assert_eq!(bad.validate().unwrap_err().field_errors()[0].field, "price");
    }

    #[test]
    fn partial_update_only_checks_given_fields() {
        assert!(ProductUpdate::default().validate().is_ok());
        let off = ProductUpdate {
            contact_for_price: Some(false),
            ..Default::default()
        };
        assert!(off.validate().is_err());
    }

    #[test]
    fn update_cannot_zero_the_price_of_a_priced_product() {
        let zeroed = ProductUpdate {
            price: Some(0.0),
            ..Default::default()
        };
        assert_eq!(zeroed.validate().unwrap_err().field_errors()[0].field, "price");

        let quote_only = ProductUpdate {
            price: Some(0.0),
            contact_for_price: Some(true),
            ..Default::default()
        };
        assert!(quote_only.validate().is_ok());

        let repriced = ProductUpdate {
            price: Some(42.0),
            ..Default::default()
        };
        assert!(repriced.validate().is_ok());
    }

    #[test]
    fn lenient_row_decoding() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "supplier_id": "s1",
            "title": "Dates 1kg",
            "created_at": "2026-09-01T08:30:00.123456+00:00"
        }))
        .unwrap();
        assert_eq!(product.currency, "ILS");
        assert!(product.is_active);
        assert_eq!(product.effective_price(), 0.0);
        assert_eq!(product.effective_min_order(), 1);
        assert_eq!(product.price_label(), "Contact for price");
    }

    #[test]
    fn price_labels() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p1", "supplier_id": "s1", "title": "Tahini", "price": 12.5
        }))
        .unwrap();
        assert_eq!(product.price_label(), "₪12.50");
    }
}
