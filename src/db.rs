use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{BazaarError, Result};
use crate::index::{CatalogIndex, GeoIndex, UniqueIndex};
use crate::model::{Category, Product, Review, Transaction, User};
use crate::schema::{self, CollectionSchema};
use crate::storage::{BazaarConfig, DocumentStore};

/// An embedded marketplace store: validated collections for users,
/// categories (with their nested subcategory/product tree), reviews and
/// transactions, plus the indexes the report and workflow layers rely
/// on.
///
/// User ids, category names and transaction ids are structurally unique
/// (they form the document key, and inserts reject an occupied key).
/// Email uniqueness and the catalog-wide product id uniqueness span
/// documents and are enforced by dedicated indexes.
pub struct Bazaar {
    store: DocumentStore,
    users_schema: CollectionSchema,
    categories_schema: CollectionSchema,
    reviews_schema: CollectionSchema,
    transactions_schema: CollectionSchema,
    user_emails: UniqueIndex,
    product_ids: UniqueIndex,
    pub(crate) user_locations: GeoIndex,
    pub(crate) product_locations: GeoIndex,
    pub(crate) catalog: CatalogIndex,
}

impl Bazaar {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(BazaarConfig::with_path(path))
    }

    pub fn with_config(config: BazaarConfig) -> Result<Self> {
        let store = DocumentStore::open(&config)?;
        let db = Self {
            store,
            users_schema: schema::users_schema(),
            categories_schema: schema::categories_schema(),
            reviews_schema: schema::reviews_schema(),
            transactions_schema: schema::transactions_schema(),
            user_emails: UniqueIndex::new("users", "email"),
            product_ids: UniqueIndex::new("categories", "product.id"),
            user_locations: GeoIndex::new(),
            product_locations: GeoIndex::new(),
            catalog: CatalogIndex::new(),
        };
        db.rebuild_indexes()?;
        Ok(db)
    }

    /// Rebuild every in-memory index from a full scan, so a reopened
    /// store enforces the same constraints as the process that wrote it.
    fn rebuild_indexes(&self) -> Result<()> {
        for entry in self.store.scan_prefix("users:") {
            let (key, bytes) = entry?;
            let user: User = serde_json::from_slice(&bytes)?;
            self.user_emails.claim(&user.email, &key)?;
            self.user_locations.insert(user.id, user.location.clone());
        }

        for entry in self.store.scan_prefix("categories:") {
            let (key, bytes) = entry?;
            let category: Category = serde_json::from_slice(&bytes)?;
            for sub in &category.subcategories {
                for product in &sub.products {
                    self.product_ids.claim(&product.id.to_string(), &key)?;
                    self.catalog.insert(product.id, &category.name, &sub.name);
                    if let Some(location) = &product.location {
                        self.product_locations.insert(product.id, location.clone());
                    }
                }
            }
        }

        Ok(())
    }

    fn user_key(id: u64) -> String {
        format!("users:{id}")
    }

    fn category_key(name: &str) -> String {
        format!("categories:{name}")
    }

    fn transaction_key(id: u64) -> String {
        format!("transactions:{id}")
    }

    fn get_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_doc<T: Serialize>(&self, key: &str, doc: &T) -> Result<()> {
        self.store.put(key.to_string(), serde_json::to_vec(doc)?)
    }

    fn scan_collection<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        self.store
            .scan_prefix(prefix)
            .map(|entry| {
                let (_, bytes) = entry?;
                Ok(serde_json::from_slice(&bytes)?)
            })
            .collect()
    }

    // ---- users ----

    pub fn insert_user(&self, user: &User) -> Result<()> {
        let doc = serde_json::to_value(user)?;
        self.users_schema.validate(&doc)?;

        let key = Self::user_key(user.id);
        if self.store.get(&key)?.is_some() {
            return Err(BazaarError::UniqueConstraintViolation(
                "users.id".to_string(),
                user.id.to_string(),
            ));
        }
        self.user_emails.claim(&user.email, &key)?;

        self.put_doc(&key, user)?;
        self.user_locations.insert(user.id, user.location.clone());
        Ok(())
    }

    pub fn get_user(&self, id: u64) -> Result<Option<User>> {
        self.get_doc(&Self::user_key(id))
    }

    pub fn users(&self) -> Result<Vec<User>> {
        self.scan_collection("users:")
    }

    /// Apply a mutation to one stored user and persist the result.
    pub(crate) fn update_user<F>(&self, user_id: u64, mutate: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> Result<()>,
    {
        let key = Self::user_key(user_id);
        let mut user: User = self
            .get_doc(&key)?
            .ok_or_else(|| BazaarError::NotFound(format!("user {user_id}")))?;
        mutate(&mut user)?;
        self.put_doc(&key, &user)?;
        self.user_locations.insert(user.id, user.location.clone());
        Ok(user)
    }

    // ---- catalog ----

    pub fn insert_category(&self, category: &Category) -> Result<()> {
        let doc = serde_json::to_value(category)?;
        self.categories_schema.validate(&doc)?;

        let key = Self::category_key(&category.name);
        if self.store.get(&key)?.is_some() {
            return Err(BazaarError::UniqueConstraintViolation(
                "categories.name".to_string(),
                category.name.clone(),
            ));
        }

        // Product ids are unique across the whole catalog, including
        // within the incoming document itself. Check everything before
        // claiming anything so a rejected insert leaves no claims behind.
        let mut seen = std::collections::HashSet::new();
        for product in category.products() {
            if !seen.insert(product.id) || self.product_ids.is_taken(&product.id.to_string(), &key)
            {
                return Err(BazaarError::UniqueConstraintViolation(
                    "categories.product.id".to_string(),
                    product.id.to_string(),
                ));
            }
        }

        for sub in &category.subcategories {
            for product in &sub.products {
                self.product_ids.claim(&product.id.to_string(), &key)?;
                self.catalog.insert(product.id, &category.name, &sub.name);
                if let Some(location) = &product.location {
                    self.product_locations.insert(product.id, location.clone());
                }
            }
        }
        self.put_doc(&key, category)
    }

    pub fn get_category(&self, name: &str) -> Result<Option<Category>> {
        self.get_doc(&Self::category_key(name))
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        self.scan_collection("categories:")
    }

    /// Locate a product anywhere in the catalog, with its placement.
    pub fn find_product(&self, product_id: u64) -> Result<Option<(String, String, Product)>> {
        let Some(placement) = self.catalog.placement(product_id) else {
            return Ok(None);
        };
        let Some(category) = self.get_category(&placement.category)? else {
            return Ok(None);
        };
        Ok(category
            .find_product(product_id)
            .map(|(sub, product)| (placement.category.clone(), sub.to_string(), product.clone())))
    }

    /// Apply a mutation to exactly one product inside its owning
    /// category document. Sibling products in the same subcategory are
    /// rewritten byte-for-byte unchanged.
    pub(crate) fn update_product<F>(&self, product_id: u64, mutate: F) -> Result<Product>
    where
        F: FnOnce(&mut Product) -> Result<()>,
    {
        let placement = self
            .catalog
            .placement(product_id)
            .ok_or_else(|| BazaarError::NotFound(format!("product {product_id}")))?;
        let mut category = self
            .get_category(&placement.category)?
            .ok_or_else(|| BazaarError::NotFound(format!("category {}", placement.category)))?;
        let product = category
            .find_product_mut(product_id)
            .ok_or_else(|| BazaarError::NotFound(format!("product {product_id}")))?;
        mutate(product)?;
        let updated = product.clone();
        self.put_doc(&Self::category_key(&category.name), &category)?;
        Ok(updated)
    }

    // ---- reviews ----

    /// Insert a review under a generated key, returning the key.
    pub fn insert_review(&self, review: &Review) -> Result<String> {
        let doc = serde_json::to_value(review)?;
        self.reviews_schema.validate(&doc)?;

        let key = format!("reviews:{}", Uuid::new_v4());
        self.put_doc(&key, review)?;
        Ok(key)
    }

    pub fn reviews(&self) -> Result<Vec<Review>> {
        self.scan_collection("reviews:")
    }

    // ---- transactions ----

    /// Record a purchase: buyer, seller and product must exist, the
    /// product must have stock, and the transaction id must be fresh.
    /// The product's stock is decremented by one as part of the write.
    pub fn record_transaction(&self, transaction: &Transaction) -> Result<()> {
        let doc = serde_json::to_value(transaction)?;
        self.transactions_schema.validate(&doc)?;

        let key = Self::transaction_key(transaction.id);
        if self.store.get(&key)?.is_some() {
            return Err(BazaarError::UniqueConstraintViolation(
                "transactions.id".to_string(),
                transaction.id.to_string(),
            ));
        }
        if self.get_user(transaction.user_id)?.is_none() {
            return Err(BazaarError::NotFound(format!(
                "user {}",
                transaction.user_id
            )));
        }
        if self.get_user(transaction.seller_id)?.is_none() {
            return Err(BazaarError::NotFound(format!(
                "user {}",
                transaction.seller_id
            )));
        }

        self.update_product(transaction.product_id, |product| {
            if product.stock_quantity == 0 {
                return Err(BazaarError::PreconditionFailed(format!(
                    "product {} is out of stock",
                    product.id
                )));
            }
            product.stock_quantity -= 1;
            Ok(())
        })?;

        self.put_doc(&key, transaction)
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        self.scan_collection("transactions:")
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
