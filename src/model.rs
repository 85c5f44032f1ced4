use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub location: GeoPoint,
    pub role: Role,
    #[serde(default)]
    pub loyalty_points: u64,
}

/// Promotional pricing state carried by every product. A cleared record
/// keeps its window dates; only percentage, the active flag and the
/// computed price are reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub percentage: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub discounted_price: Option<f64>,
}

impl Default for Discount {
    fn default() -> Self {
        Self {
            percentage: 0.0,
            start_date: None,
            end_date: None,
            active: false,
            discounted_price: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock_quantity: u32,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub discount: Discount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    /// All products under this category, flattened across subcategories.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.subcategories.iter().flat_map(|sub| sub.products.iter())
    }

    /// Locate a product anywhere in this category, with its subcategory name.
    pub fn find_product(&self, product_id: u64) -> Option<(&str, &Product)> {
        self.subcategories.iter().find_map(|sub| {
            sub.products
                .iter()
                .find(|p| p.id == product_id)
                .map(|p| (sub.name.as_str(), p))
        })
    }

    /// Mutable lookup used by targeted single-product updates.
    pub fn find_product_mut(&mut self, product_id: u64) -> Option<&mut Product> {
        self.subcategories
            .iter_mut()
            .flat_map(|sub| sub.products.iter_mut())
            .find(|p| p.id == product_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub rating: u8,
    pub comment: Option<String>,
    pub user_id: u64,
    pub product_id: u64,
    #[serde(default)]
    pub seller_reply: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub user_id: u64,
    pub product_id: u64,
    pub seller_id: u64,
}
