//! Mutation workflows: promotional discounts, loyalty points, and the
//! outcomes they report. Every workflow returns a `Result` the caller
//! is expected to branch on; nothing here panics or retries.

use chrono::{DateTime, Utc};

use crate::db::Bazaar;
use crate::error::{BazaarError, Result};
use crate::model::Product;

/// Minimum purchase amount that accrues loyalty points.
pub const MIN_POINTS_PURCHASE: f64 = 20.0;

/// Currency value of a single loyalty point when redeemed.
pub const POINT_VALUE: f64 = 5.0;

/// Outcome of a loyalty redemption quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoyaltyDiscount {
    /// Points cover part of the purchase.
    Percent(f64),
    /// Points cover the purchase entirely.
    Full,
}

impl Bazaar {
    /// Put a product on promotion. The discounted price is derived from
    /// the product's current catalog price; re-applying while a
    /// discount is active overwrites the prior terms. Only the matched
    /// product changes; siblings in the same subcategory are left
    /// untouched.
    pub fn set_discount(
        &self,
        product_id: u64,
        percentage: f64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Product> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(BazaarError::validation(
                "discount.percentage",
                "must be a percentage between 0 and 100",
            ));
        }

        self.update_product(product_id, |product| {
            product.discount.percentage = percentage;
            product.discount.start_date = Some(start_date);
            product.discount.end_date = Some(end_date);
            product.discount.active = true;
            product.discount.discounted_price = Some(product.price * (1.0 - percentage / 100.0));
            Ok(())
        })
    }

    /// Take a product off promotion. Only a product with an active
    /// discount qualifies; the window dates are left on the record, as
    /// the percentage, flag and computed price are what the storefront
    /// reads.
    pub fn clear_discount(&self, product_id: u64) -> Result<Product> {
        self.update_product(product_id, |product| {
            if !product.discount.active {
                return Err(BazaarError::PreconditionFailed(format!(
                    "product {} has no active discount",
                    product.id
                )));
            }
            product.discount.percentage = 0.0;
            product.discount.active = false;
            product.discount.discounted_price = None;
            Ok(())
        })
    }

    /// Accrue loyalty points for a purchase: one point per 20 currency
    /// units, rounded. Purchases under the minimum earn nothing and are
    /// reported as a failed precondition. Returns the points earned.
    pub fn earn_points(&self, purchase_amount: f64, user_id: u64) -> Result<u64> {
        if purchase_amount < MIN_POINTS_PURCHASE {
            return Err(BazaarError::PreconditionFailed(format!(
                "purchase of {purchase_amount} is below the {MIN_POINTS_PURCHASE} minimum for points"
            )));
        }

        let earned = (purchase_amount / MIN_POINTS_PURCHASE).round() as u64;
        self.update_user(user_id, |user| {
            user.loyalty_points += earned;
            Ok(())
        })?;
        Ok(earned)
    }

    /// Quote the discount a user's points are worth against a purchase:
    /// each point is worth 5 currency units, expressed as a percentage
    /// of the amount and capped at a full discount. Read-only: the
    /// balance is not deducted.
    pub fn discount_from_points(&self, purchase_amount: f64, user_id: u64) -> Result<LoyaltyDiscount> {
        if purchase_amount <= 0.0 {
            return Err(BazaarError::PreconditionFailed(
                "purchase amount must be positive".to_string(),
            ));
        }

        let user = self
            .get_user(user_id)?
            .ok_or_else(|| BazaarError::NotFound(format!("user {user_id}")))?;

        let percent = (user.loyalty_points as f64 * POINT_VALUE / purchase_amount) * 100.0;
        if percent >= 100.0 {
            Ok(LoyaltyDiscount::Full)
        } else {
            Ok(LoyaltyDiscount::Percent(percent))
        }
    }
}
