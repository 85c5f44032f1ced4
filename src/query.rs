//! Report layer: the analytical queries over the stored marketplace.
//!
//! Joins against the catalog resolve through one flattening pass
//! (`product_map`); a transaction or review whose product (or user) no
//! longer resolves is dropped from the report rather than zero-filled.
//! Revenue is always `count x current catalog price`: transactions
//! carry no price snapshot, so repricing a product shifts historical
//! revenue.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::Bazaar;
use crate::error::{BazaarError, Result};
use crate::model::Product;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRating {
    pub product_id: u64,
    pub product_name: String,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub total_sales: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcategorySales {
    pub category: String,
    pub subcategory: String,
    pub total_sales: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub product_id: u64,
    pub product_name: String,
    pub total_sales: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSpend {
    pub user_id: u64,
    pub user_name: String,
    pub total_spent: f64,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSeller {
    pub product_id: u64,
    pub product_name: String,
    pub total_sales: u64,
}

/// A proximity hit, annotated with where the product sits in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyProduct {
    pub category: String,
    pub subcategory: String,
    pub product: Product,
}

struct CatalogEntry {
    category: String,
    subcategory: String,
    product: Product,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Bazaar {
    /// Flatten the stored catalog once: product id to its placement and
    /// current record.
    fn product_map(&self) -> Result<HashMap<u64, CatalogEntry>> {
        let mut map = HashMap::new();
        for category in self.categories()? {
            for sub in &category.subcategories {
                for product in &sub.products {
                    map.insert(
                        product.id,
                        CatalogEntry {
                            category: category.name.clone(),
                            subcategory: sub.name.clone(),
                            product: product.clone(),
                        },
                    );
                }
            }
        }
        Ok(map)
    }

    /// Every product under a category, flattened across its
    /// subcategories. One row per product, placement context discarded.
    pub fn products_in_category(&self, name: &str) -> Result<Vec<Product>> {
        let category = self
            .get_category(name)?
            .ok_or_else(|| BazaarError::NotFound(format!("category {name}")))?;
        Ok(category.products().cloned().collect())
    }

    /// Mean review rating per product, rounded to 2 decimal places and
    /// joined with the product's display name. Products without reviews
    /// do not appear.
    pub fn average_rating_per_product(&self) -> Result<Vec<ProductRating>> {
        let products = self.product_map()?;

        let mut totals: HashMap<u64, (u64, u64)> = HashMap::new();
        for review in self.reviews()? {
            let entry = totals.entry(review.product_id).or_insert((0, 0));
            entry.0 += u64::from(review.rating);
            entry.1 += 1;
        }

        let mut rows: Vec<ProductRating> = totals
            .into_iter()
            .filter_map(|(product_id, (sum, count))| {
                products.get(&product_id).map(|entry| ProductRating {
                    product_id,
                    product_name: entry.product.name.clone(),
                    average_rating: round2(sum as f64 / count as f64),
                })
            })
            .collect();
        rows.sort_unstable_by_key(|row| row.product_id);
        Ok(rows)
    }

    /// Transaction count and revenue per category.
    pub fn sales_by_category(&self) -> Result<Vec<CategorySales>> {
        let products = self.product_map()?;

        let mut groups: HashMap<String, (u64, f64)> = HashMap::new();
        for transaction in self.transactions()? {
            if let Some(entry) = products.get(&transaction.product_id) {
                let group = groups.entry(entry.category.clone()).or_insert((0, 0.0));
                group.0 += 1;
                group.1 += entry.product.price;
            }
        }

        let mut rows: Vec<CategorySales> = groups
            .into_iter()
            .map(|(category, (total_sales, revenue))| CategorySales {
                category,
                total_sales,
                revenue,
            })
            .collect();
        rows.sort_unstable_by(|a, b| a.category.cmp(&b.category));
        Ok(rows)
    }

    /// Transaction count and revenue per (category, subcategory) pair.
    pub fn sales_by_subcategory(&self) -> Result<Vec<SubcategorySales>> {
        let products = self.product_map()?;

        let mut groups: HashMap<(String, String), (u64, f64)> = HashMap::new();
        for transaction in self.transactions()? {
            if let Some(entry) = products.get(&transaction.product_id) {
                let group = groups
                    .entry((entry.category.clone(), entry.subcategory.clone()))
                    .or_insert((0, 0.0));
                group.0 += 1;
                group.1 += entry.product.price;
            }
        }

        let mut rows: Vec<SubcategorySales> = groups
            .into_iter()
            .map(
                |((category, subcategory), (total_sales, revenue))| SubcategorySales {
                    category,
                    subcategory,
                    total_sales,
                    revenue,
                },
            )
            .collect();
        rows.sort_unstable_by(|a, b| {
            (a.category.as_str(), a.subcategory.as_str())
                .cmp(&(b.category.as_str(), b.subcategory.as_str()))
        });
        Ok(rows)
    }

    /// Per-product sales report, descending by revenue.
    pub fn sales_per_product(&self) -> Result<Vec<ProductRevenue>> {
        let products = self.product_map()?;

        let mut counts: HashMap<u64, u64> = HashMap::new();
        for transaction in self.transactions()? {
            if products.contains_key(&transaction.product_id) {
                *counts.entry(transaction.product_id).or_insert(0) += 1;
            }
        }

        let mut rows: Vec<ProductRevenue> = counts
            .into_iter()
            .map(|(product_id, total_sales)| {
                let entry = &products[&product_id];
                ProductRevenue {
                    product_id,
                    product_name: entry.product.name.clone(),
                    total_sales,
                    revenue: total_sales as f64 * entry.product.price,
                }
            })
            .collect();
        rows.sort_unstable_by(|a, b| {
            b.revenue
                .total_cmp(&a.revenue)
                .then(a.product_id.cmp(&b.product_id))
        });
        Ok(rows)
    }

    /// Per-buyer spend report, descending by amount spent.
    pub fn spend_per_user(&self) -> Result<Vec<UserSpend>> {
        let products = self.product_map()?;
        let names: HashMap<u64, String> = self
            .users()?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();

        let mut groups: HashMap<u64, (f64, u64)> = HashMap::new();
        for transaction in self.transactions()? {
            if !names.contains_key(&transaction.user_id) {
                continue;
            }
            if let Some(entry) = products.get(&transaction.product_id) {
                let group = groups.entry(transaction.user_id).or_insert((0.0, 0));
                group.0 += entry.product.price;
                group.1 += 1;
            }
        }

        let mut rows: Vec<UserSpend> = groups
            .into_iter()
            .map(|(user_id, (total_spent, transaction_count))| UserSpend {
                user_id,
                user_name: names[&user_id].clone(),
                total_spent,
                transaction_count,
            })
            .collect();
        rows.sort_unstable_by(|a, b| {
            b.total_spent
                .total_cmp(&a.total_spent)
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(rows)
    }

    /// Products ranked by number of transactions, descending.
    pub fn best_selling_products(&self) -> Result<Vec<BestSeller>> {
        let products = self.product_map()?;

        let mut counts: HashMap<u64, u64> = HashMap::new();
        for transaction in self.transactions()? {
            if products.contains_key(&transaction.product_id) {
                *counts.entry(transaction.product_id).or_insert(0) += 1;
            }
        }

        let mut rows: Vec<BestSeller> = counts
            .into_iter()
            .map(|(product_id, total_sales)| BestSeller {
                product_id,
                product_name: products[&product_id].product.name.clone(),
                total_sales,
            })
            .collect();
        rows.sort_unstable_by(|a, b| {
            b.total_sales
                .cmp(&a.total_sales)
                .then(a.product_id.cmp(&b.product_id))
        });
        Ok(rows)
    }

    /// Spherical-cap search: every located product within `radius_m`
    /// metres of the user's stored location, annotated with its
    /// placement. A zero radius matches only products at exactly the
    /// user's coordinates.
    pub fn products_near_user(&self, user_id: u64, radius_m: f64) -> Result<Vec<NearbyProduct>> {
        let user = self
            .get_user(user_id)?
            .ok_or_else(|| BazaarError::NotFound(format!("user {user_id}")))?;
        let products = self.product_map()?;

        Ok(self
            .product_locations
            .within_radius(&user.location, radius_m)
            .into_iter()
            .filter_map(|product_id| {
                products.get(&product_id).map(|entry| NearbyProduct {
                    category: entry.category.clone(),
                    subcategory: entry.subcategory.clone(),
                    product: entry.product.clone(),
                })
            })
            .collect())
    }

    /// Mean great-circle distance in metres between buyer and seller
    /// across all transactions whose endpoints both resolve. `None`
    /// when no transaction does.
    pub fn average_buyer_seller_distance(&self) -> Result<Option<f64>> {
        let mut total = 0.0;
        let mut resolved = 0u64;
        for transaction in self.transactions()? {
            let buyer = self.user_locations.get(transaction.user_id);
            let seller = self.user_locations.get(transaction.seller_id);
            if let (Some(buyer), Some(seller)) = (buyer, seller) {
                total += buyer.distance_m(&seller);
                resolved += 1;
            }
        }
        Ok((resolved > 0).then(|| total / resolved as f64))
    }
}
