//! Lenient field deserializers for request bodies.
//!
//! Existing clients send ids and quantities either as JSON numbers or as
//! numeric strings (`"12"`). Prices are major units (`12.5`, `"12.50"`) and
//! go through `Money`'s own deserializer.

use depot_core::Money;
use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn into_i64<E: de::Error>(self) -> Result<i64, E> {
        match self {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a whole number, got {:?}", s))),
        }
    }
}

/// `12` or `"12"`.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrText::deserialize(deserializer)?.into_i64()
}

/// Like [`lenient_i64`], with `null` and `""` read as absent.
pub fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => value.into_i64().map(Some),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceOrText {
    Price(Money),
    Text(String),
}

/// An optional price, with `null` and `""` read as absent.
pub fn lenient_opt_money<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PriceOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PriceOrText::Price(price)) => Ok(Some(price)),
        Some(PriceOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(PriceOrText::Text(s)) => Money::parse_major(&s).map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(deserialize_with = "lenient_i64")]
        id: i64,
        #[serde(default, deserialize_with = "lenient_opt_i64")]
        other: Option<i64>,
        #[serde(default, deserialize_with = "lenient_opt_money")]
        price: Option<Money>,
    }

    #[derive(Debug, Deserialize)]
    struct Line {
        product_price: Money,
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let body: Body = serde_json::from_str(r#"{"id": 3, "other": "4", "price": "12.50"}"#).unwrap();
        assert_eq!(body.id, 3);
        assert_eq!(body.other, Some(4));
        assert_eq!(body.price, Some(Money::from_cents(1250)));

        let body: Body = serde_json::from_str(r#"{"id": " 9 "}"#).unwrap();
        assert_eq!(body.id, 9);
        assert_eq!(body.other, None);
        assert_eq!(body.price, None);
    }

    #[test]
    fn test_blank_and_null_are_absent() {
        let body: Body = serde_json::from_str(r#"{"id": 1, "other": "", "price": null}"#).unwrap();
        assert_eq!(body.other, None);
        assert_eq!(body.price, None);
    }

    #[test]
    fn test_prices_in_major_units() {
        for json in [
            r#"{"product_price": 12.50}"#,
            r#"{"product_price": "12.50"}"#,
            r#"{"product_price": 12.5}"#,
        ] {
            let line: Line = serde_json::from_str(json).unwrap();
            assert_eq!(line.product_price, Money::from_cents(1250), "{json}");
        }

        let line: Line = serde_json::from_str(r#"{"product_price": 12}"#).unwrap();
        assert_eq!(line.product_price, Money::from_cents(1200));

        let body: Body = serde_json::from_str(r#"{"id": 1, "price": 38.9}"#).unwrap();
        assert_eq!(body.price, Some(Money::from_cents(3890)));
    }

    #[test]
    fn test_sub_cent_prices_rejected() {
        assert!(serde_json::from_str::<Line>(r#"{"product_price": 1.005}"#).is_err());
        assert!(serde_json::from_str::<Body>(r#"{"id": 1, "price": "12,50"}"#).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(serde_json::from_str::<Body>(r#"{"id": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Body>(r#"{"id": 1.5}"#).is_err());
        assert!(serde_json::from_str::<Body>(r#"{"id": true}"#).is_err());
    }
}
