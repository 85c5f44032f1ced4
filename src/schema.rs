//! Declarative per-collection write validation.
//!
//! Each collection carries a table of field rules checked against the
//! serialized document before anything is persisted. A failed rule
//! rejects the write with the offending field path and the violated
//! constraint.

use regex::Regex;
use serde_json::Value;

use crate::error::{BazaarError, Result};
use crate::geo::GeoPoint;

#[derive(Debug, Clone)]
pub enum Constraint {
    /// String with a minimum number of characters.
    MinLength(usize),
    /// String matching a regular expression.
    Pattern(&'static str),
    /// Unsigned integer.
    NonNegativeInt,
    /// Number (integer or float) that is zero or greater.
    NonNegativeNumber,
    /// Integer within an inclusive range.
    IntRange(i64, i64),
    /// String drawn from a fixed set.
    OneOf(&'static [&'static str]),
    /// GeoJSON point with [longitude, latitude] coordinates.
    GeoPoint,
    /// Any string.
    Text,
    /// Nested object validated against its own rules.
    Object(Vec<FieldRule>),
    /// Array of objects, each validated against the nested rules.
    Each(Vec<FieldRule>),
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub constraint: Constraint,
}

impl FieldRule {
    pub fn required(field: &'static str, constraint: Constraint) -> Self {
        Self {
            field,
            required: true,
            constraint,
        }
    }

    /// Optional fields may be absent or null; present values are still checked.
    pub fn optional(field: &'static str, constraint: Constraint) -> Self {
        Self {
            field,
            required: false,
            constraint,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub rules: Vec<FieldRule>,
}

impl CollectionSchema {
    pub fn new(name: &'static str, rules: Vec<FieldRule>) -> Self {
        Self { name, rules }
    }

    /// Validate a serialized document against this collection's rules.
    pub fn validate(&self, doc: &Value) -> Result<()> {
        if !doc.is_object() {
            return Err(BazaarError::validation(self.name, "must be an object"));
        }
        validate_object(&self.rules, doc, "")
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn validate_object(rules: &[FieldRule], doc: &Value, prefix: &str) -> Result<()> {
    let obj = doc
        .as_object()
        .ok_or_else(|| BazaarError::validation(prefix, "must be an object"))?;

    for rule in rules {
        let path = join_path(prefix, rule.field);
        match obj.get(rule.field) {
            None | Some(Value::Null) => {
                if rule.required {
                    return Err(BazaarError::validation(path, "is required"));
                }
            }
            Some(value) => check_constraint(&rule.constraint, value, &path)?,
        }
    }
    Ok(())
}

fn check_constraint(constraint: &Constraint, value: &Value, path: &str) -> Result<()> {
    match constraint {
        Constraint::MinLength(min) => {
            let s = value
                .as_str()
                .ok_or_else(|| BazaarError::validation(path, "must be a string"))?;
            if s.chars().count() < *min {
                return Err(BazaarError::validation(
                    path,
                    format!("must be a string with at least {min} characters"),
                ));
            }
        }
        Constraint::Pattern(pattern) => {
            let s = value
                .as_str()
                .ok_or_else(|| BazaarError::validation(path, "must be a string"))?;
            let re = Regex::new(pattern)
                .map_err(|e| BazaarError::validation(path, format!("invalid pattern: {e}")))?;
            if !re.is_match(s) {
                return Err(BazaarError::validation(
                    path,
                    format!("must match pattern {pattern}"),
                ));
            }
        }
        Constraint::NonNegativeInt => {
            if value.as_u64().is_none() {
                return Err(BazaarError::validation(
                    path,
                    "must be a non-negative integer",
                ));
            }
        }
        Constraint::NonNegativeNumber => {
            let n = value
                .as_f64()
                .ok_or_else(|| BazaarError::validation(path, "must be a number"))?;
            if n < 0.0 {
                return Err(BazaarError::validation(path, "must not be negative"));
            }
        }
        Constraint::IntRange(lo, hi) => {
            let n = value
                .as_i64()
                .ok_or_else(|| BazaarError::validation(path, "must be an integer"))?;
            if n < *lo || n > *hi {
                return Err(BazaarError::validation(
                    path,
                    format!("must be an integer between {lo} and {hi}"),
                ));
            }
        }
        Constraint::OneOf(allowed) => {
            let s = value
                .as_str()
                .ok_or_else(|| BazaarError::validation(path, "must be a string"))?;
            if !allowed.contains(&s) {
                return Err(BazaarError::validation(
                    path,
                    format!("must be one of {allowed:?}"),
                ));
            }
        }
        Constraint::GeoPoint => {
            let point: GeoPoint = serde_json::from_value(value.clone()).map_err(|_| {
                BazaarError::validation(
                    path,
                    "must be a GeoJSON point with [longitude, latitude] coordinates",
                )
            })?;
            if !point.is_valid() {
                return Err(BazaarError::validation(
                    path,
                    "must be a GeoJSON point with longitude in [-180, 180] and latitude in [-90, 90]",
                ));
            }
        }
        Constraint::Text => {
            if !value.is_string() {
                return Err(BazaarError::validation(path, "must be a string"));
            }
        }
        Constraint::Object(rules) => validate_object(rules, value, path)?,
        Constraint::Each(rules) => {
            let items = value
                .as_array()
                .ok_or_else(|| BazaarError::validation(path, "must be an array"))?;
            for item in items {
                validate_object(rules, item, path)?;
            }
        }
    }
    Ok(())
}

pub fn users_schema() -> CollectionSchema {
    CollectionSchema::new(
        "users",
        vec![
            FieldRule::required("id", Constraint::NonNegativeInt),
            FieldRule::required("name", Constraint::MinLength(3)),
            FieldRule::required("email", Constraint::Pattern(r"^.+@.+\..+$")),
            FieldRule::required("address", Constraint::MinLength(5)),
            FieldRule::required("password", Constraint::MinLength(8)),
            FieldRule::required("location", Constraint::GeoPoint),
            FieldRule::required("role", Constraint::OneOf(&["buyer", "seller"])),
            FieldRule::optional("loyalty_points", Constraint::NonNegativeInt),
        ],
    )
}

pub fn categories_schema() -> CollectionSchema {
    let product_rules = vec![
        FieldRule::required("id", Constraint::NonNegativeInt),
        FieldRule::required("name", Constraint::MinLength(1)),
        FieldRule::required("description", Constraint::MinLength(10)),
        FieldRule::required("price", Constraint::NonNegativeNumber),
        FieldRule::required("stock_quantity", Constraint::NonNegativeInt),
        FieldRule::optional("location", Constraint::GeoPoint),
        FieldRule::optional(
            "discount",
            Constraint::Object(vec![FieldRule::optional(
                "percentage",
                Constraint::NonNegativeNumber,
            )]),
        ),
    ];
    let subcategory_rules = vec![
        FieldRule::required("name", Constraint::MinLength(1)),
        FieldRule::required("products", Constraint::Each(product_rules)),
    ];
    CollectionSchema::new(
        "categories",
        vec![
            FieldRule::required("name", Constraint::MinLength(1)),
            FieldRule::required("subcategories", Constraint::Each(subcategory_rules)),
        ],
    )
}

pub fn reviews_schema() -> CollectionSchema {
    CollectionSchema::new(
        "reviews",
        vec![
            FieldRule::required("rating", Constraint::IntRange(0, 5)),
            FieldRule::optional("comment", Constraint::Text),
            FieldRule::required("user_id", Constraint::NonNegativeInt),
            FieldRule::required("product_id", Constraint::NonNegativeInt),
            FieldRule::optional("seller_reply", Constraint::Text),
        ],
    )
}

pub fn transactions_schema() -> CollectionSchema {
    CollectionSchema::new(
        "transactions",
        vec![
            FieldRule::required("id", Constraint::NonNegativeInt),
            FieldRule::required("user_id", Constraint::NonNegativeInt),
            FieldRule::required("product_id", Constraint::NonNegativeInt),
            FieldRule::required("seller_id", Constraint::NonNegativeInt),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_user() -> Value {
        json!({
            "id": 1,
            "name": "Marina",
            "email": "marina@example.com",
            "address": "44 Ocean Drive",
            "password": "correct-horse",
            "location": {"type": "Point", "coordinates": [-46.63, -23.55]},
            "role": "seller",
            "loyalty_points": 0
        })
    }

    fn field_of(err: BazaarError) -> String {
        match err {
            BazaarError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(users_schema().validate(&valid_user()).is_ok());
    }

    #[test]
    fn test_short_name_rejected() {
        let mut user = valid_user();
        user["name"] = json!("Al");
        let err = users_schema().validate(&user).unwrap_err();
        assert_eq!(field_of(err), "name");
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut user = valid_user();
        user["email"] = json!("not-an-email");
        let err = users_schema().validate(&user).unwrap_err();
        assert_eq!(field_of(err), "email");
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let mut user = valid_user();
        user.as_object_mut().unwrap().remove("address");
        let err = users_schema().validate(&user).unwrap_err();
        assert_eq!(field_of(err), "address");
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut user = valid_user();
        user["role"] = json!("admin");
        let err = users_schema().validate(&user).unwrap_err();
        assert_eq!(field_of(err), "role");
    }

    #[test]
    fn test_malformed_point_rejected() {
        let mut user = valid_user();
        user["location"] = json!({"type": "Point", "coordinates": [12.0]});
        let err = users_schema().validate(&user).unwrap_err();
        assert_eq!(field_of(err), "location");

        let mut user = valid_user();
        user["location"] = json!({"type": "Point", "coordinates": [200.0, 10.0]});
        let err = users_schema().validate(&user).unwrap_err();
        assert_eq!(field_of(err), "location");
    }

    #[test]
    fn test_nested_product_path_reported() {
        let category = json!({
            "name": "Garden",
            "subcategories": [{
                "name": "Tools",
                "products": [{
                    "id": 10,
                    "name": "Trowel",
                    "description": "too short",
                    "price": 9.5,
                    "stock_quantity": 3
                }]
            }]
        });
        let err = categories_schema().validate(&category).unwrap_err();
        assert_eq!(field_of(err), "subcategories.products.description");
    }

    #[test]
    fn test_negative_price_rejected() {
        let category = json!({
            "name": "Garden",
            "subcategories": [{
                "name": "Tools",
                "products": [{
                    "id": 10,
                    "name": "Trowel",
                    "description": "Hand trowel with ash handle",
                    "price": -1.0,
                    "stock_quantity": 3
                }]
            }]
        });
        let err = categories_schema().validate(&category).unwrap_err();
        assert_eq!(field_of(err), "subcategories.products.price");
    }

    #[test]
    fn test_rating_bounds() {
        let review = json!({"rating": 6, "user_id": 1, "product_id": 2});
        let err = reviews_schema().validate(&review).unwrap_err();
        assert_eq!(field_of(err), "rating");

        let review = json!({"rating": 0, "user_id": 1, "product_id": 2, "comment": null});
        assert!(reviews_schema().validate(&review).is_ok());
    }
}
