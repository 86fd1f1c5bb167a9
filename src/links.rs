//! Outbound deep links: WhatsApp chats and mail drafts

use crate::models::{Product, User};

const ISRAEL_PREFIX: &str = "972";

/// Keep only the ASCII digits of a phone number
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Normalize a phone number to the international form `wa.me` wants.
///
/// Local Israeli numbers get the `972` country code: `050-123-4567` →
/// `972501234567`. Numbers already written internationally (`+…` or `00…`)
/// keep their own country code. Returns `None` when nothing is left.
pub fn whatsapp_number(phone: &str) -> Option<String> {
    let digits = digits_only(phone);
    if let Some(international) = digits.strip_prefix("00") {
        return (!international.is_empty()).then(|| international.to_string());
    }
    if digits.is_empty() {
        return None;
    }
    if phone.trim_start().starts_with('+') || digits.starts_with(ISRAEL_PREFIX) {
        return Some(digits);
    }
    match digits.strip_prefix('0') {
        Some("") => None,
        Some(local) => Some(format!("{ISRAEL_PREFIX}{local}")),
        None => Some(format!("{ISRAEL_PREFIX}{digits}")),
    }
}

/// `https://wa.me/{number}?text={message}`
pub fn whatsapp_link(phone: &str, text: Option<&str>) -> Option<String> {
    let number = whatsapp_number(phone)?;
    let link = match text.filter(|t| !t.is_empty()) {
        Some(text) => format!("https://wa.me/{}?text={}", number, urlencoding::encode(text)),
        None => format!("https://wa.me/{}", number),
    };
    Some(link)
}

/// `mailto:` link with optional subject and body
pub fn mailto_link(address: &str, subject: Option<&str>, body: Option<&str>) -> String {
    let mut params = Vec::new();
    if let Some(subject) = subject.filter(|s| !s.is_empty()) {
        params.push(format!("subject={}", urlencoding::encode(subject)));
    }
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        params.push(format!("body={}", urlencoding::encode(body)));
    }

    let address = address.trim();
    if params.is_empty() {
        format!("mailto:{address}")
    } else {
        format!("mailto:{}?{}", address, params.join("&"))
    }
}

/// The prefilled inquiry a buyer sends about a product
pub fn product_inquiry_text(product: &Product, product_url: Option<&str>) -> String {
    let mut text = format!("Hello, I am interested in \"{}\"", product.title);
    if product.contact_for_price || product.price.is_none() {
        text.push_str(". Could you send me a price quote?");
    } else {
        text.push_str(&format!(" ({})", product.price_label()));
        if let Some(min_order) = product.min_order {
            text.push_str(&format!(", minimum order {min_order}"));
        }
        text.push('.');
    }
    if let Some(url) = product_url {
        text.push_str(&format!("\n{url}"));
    }
    text
}

/// WhatsApp link to a supplier about a product
pub fn supplier_whatsapp_link(
    supplier: &User,
    product: Option<&Product>,
    product_url: Option<&str>,
) -> Option<String> {
    let phone = supplier.contact_phone()?;
    let text = product.map(|p| product_inquiry_text(p, product_url));
    whatsapp_link(phone, text.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_becomes_972() {
        assert_eq!(whatsapp_number("050-123-4567").as_deref(), Some("972501234567"));
        assert_eq!(whatsapp_number("0501234567").as_deref(), Some("972501234567"));
    }

    #[test]
    fn international_forms_are_kept() {
        assert_eq!(whatsapp_number("+972 50 123 4567").as_deref(), Some("972501234567"));
        assert_eq!(whatsapp_number("00972501234567").as_deref(), Some("972501234567"));
        assert_eq!(whatsapp_number("501234567").as_deref(), Some("972501234567"));
    }

    #[test]
    fn foreign_numbers_keep_their_country_code() {
        assert_eq!(whatsapp_number("0044 20 7946 0000").as_deref(), Some("442079460000"));
        assert_eq!(whatsapp_number("+44 20 7946 0000").as_deref(), Some("442079460000"));
        assert_eq!(whatsapp_number("00"), None);
    }

    #[test]
    fn empty_numbers_give_no_link() {
        assert_eq!(whatsapp_number(""), None);
        assert_eq!(whatsapp_number("--"), None);
        assert_eq!(whatsapp_number("0"), None);
        assert_eq!(whatsapp_link("n/a", Some("hi")), None);
    }

    #[test]
    fn whatsapp_text_is_encoded() {
        assert_eq!(
            whatsapp_link("050-1234567", Some("שלום, price?")).unwrap(),
            "https://wa.me/972501234567?text=%D7%A9%D7%9C%D7%95%D7%9D%2C%20price%3F"
        );
        assert_eq!(whatsapp_link("0501234567", None).unwrap(), "https://wa.me/972501234567");
    }

    #[test]
    fn mailto_with_subject_and_body() {
        assert_eq!(
            mailto_link("sales@levi.co.il", Some("Order inquiry"), Some("Hi & thanks")),
            "mailto:sales@levi.co.il?subject=Order%20inquiry&body=Hi%20%26%20thanks"
        );
        assert_eq!(mailto_link(" a@b.c ", None, Some("")), "mailto:a@b.c");
    }

    #[test]
    fn inquiry_text_mentions_price_or_asks_for_quote() {
        let mut product: Product = serde_json::from_value(serde_json::json!({
            "id": "p1", "supplier_id": "s1", "title": "Dates 1kg", "price": 20.0, "min_order": 50
        }))
        .unwrap();
        assert_eq!(
            product_inquiry_text(&product, Some("https://shop.example/product/p1")),
            "Hello, I am interested in \"Dates 1kg\" (₪20.00), minimum order 50.\nhttps://shop.example/product/p1"
        );

        product.contact_for_price = true;
        assert!(product_inquiry_text(&product, None).ends_with("price quote?"));
    }
}
