use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{collect, Validate};
use crate::error::{Error, FieldError};
use crate::links::digits_only;

/// A row of the `users` table; suppliers and buyers share it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub is_supplier: bool,
    #[serde(default)]
    pub is_buyer: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_verified: bool,
    pub rating: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Business name for suppliers, personal name otherwise
    pub fn display_name(&self) -> &str {
        self.business_name
            .as_deref()
            .filter(|_| self.is_supplier)
            .or(self.full_name.as_deref())
            .or(self.business_name.as_deref())
            .or(self.email.as_deref())
            .unwrap_or_default()
    }

    /// The number chat links go to: the WhatsApp one when set
    pub fn contact_phone(&self) -> Option<&str> {
        self.whatsapp
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .or(self.phone.as_deref())
    }

    pub fn effective_rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}

/// The profile form; only filled fields are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_supplier: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_buyer: Option<bool>,
}

/// Flags only an admin may change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminUserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_supplier: Option<bool>,
}

fn check_phone(errors: &mut Vec<FieldError>, field: &'static str, phone: Option<&str>) {
    let Some(phone) = phone.filter(|p| !p.trim().is_empty()) else {
        return;
    };
    let digits = digits_only(phone).len();
    if !(9..=12).contains(&digits) {
        errors.push(FieldError::new(field, "must have 9 to 12 digits"));
    }
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();
        check_phone(&mut errors, "phone", self.phone.as_deref());
        check_phone(&mut errors, "whatsapp", self.whatsapp.as_deref());
        if self.is_supplier == Some(true)
            && matches!(&self.business_name, Some(n) if n.trim().is_empty())
        {
            errors.push(FieldError::new("business_name", "is required for suppliers"));
        }
        collect(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        let supplier = User {
            id: "s1".into(),
            full_name: Some("Dana Levi".into()),
            business_name: Some("Levi Imports".into()),
            is_supplier: true,
            ..Default::default()
        };
        assert_eq!(supplier.display_name(), "Levi Imports");

        let buyer = User {
            is_supplier: false,
            ..supplier.clone()
        };
        assert_eq!(buyer.display_name(), "Dana Levi");
    }

    #[test]
    fn whatsapp_number_wins() {
        let user = User {
            id: "u".into(),
            phone: Some("03-1234567".into()),
            whatsapp: Some("050-1234567".into()),
            ..Default::default()
        };
        assert_eq!(user.contact_phone(), Some("050-1234567"));
    }

    #[test]
    fn phone_lengths() {
        let ok = ProfileUpdate {
            phone: Some("050-123-4567".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let short = ProfileUpdate {
            phone: Some("12345".into()),
            whatsapp: Some("+972 50 123 4567 89".into()),
            ..Default::default()
        };
        assert_eq!(short.validate().unwrap_err().field_errors().len(), 2);
    }
}
