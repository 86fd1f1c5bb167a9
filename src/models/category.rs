use serde::{Deserialize, Serialize};

/// A row of the `categories` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: Option<i32>,
    pub parent_id: Option<String>,
}

impl Category {
    /// Whether a URL `category` value refers to this category
    pub fn matches(&self, value: &str) -> bool {
        self.name.eq_ignore_ascii_case(value)
            || self.id == value
            || self.slug.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(value))
    }
}

/// Order for the category strip: `sort_order` first, unordered last, then name
pub fn sort_for_strip(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        let a_key = a.sort_order.unwrap_or(i32::MAX);
        let b_key = b.sort_order.unwrap_or(i32::MAX);
        a_key.cmp(&b_key).then_with(|| a.name.cmp(&b.name))
    });
}

/// The category the strip highlights for a URL `category` value
pub fn active_category<'a>(
    categories: &'a [Category],
    value: Option<&str>,
) -> Option<&'a Category> {
    let value = value.filter(|v| !v.is_empty())?;
    categories.iter().find(|c| c.matches(value))
}
