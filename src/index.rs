use dashmap::DashMap;

use crate::error::{BazaarError, Result};
use crate::geo::{GeoPoint, radius_to_radians};

/// In-memory unique index over one field of a collection. Values are
/// kept in canonical string form and map to the owning document key.
pub struct UniqueIndex {
    field: String,
    data: DashMap<String, String>,
}

impl UniqueIndex {
    pub fn new(collection: &str, field: &str) -> Self {
        Self {
            field: format!("{collection}.{field}"),
            data: DashMap::new(),
        }
    }

    /// Whether a value is already claimed by a different document.
    pub fn is_taken(&self, value: &str, doc_key: &str) -> bool {
        self.data
            .get(value)
            .is_some_and(|owner| owner.as_str() != doc_key)
    }

    /// Claim a value for a document, rejecting duplicates.
    pub fn claim(&self, value: &str, doc_key: &str) -> Result<()> {
        if self.is_taken(value, doc_key) {
            return Err(BazaarError::UniqueConstraintViolation(
                self.field.clone(),
                value.to_string(),
            ));
        }
        self.data.insert(value.to_string(), doc_key.to_string());
        Ok(())
    }

    pub fn release(&self, value: &str) {
        self.data.remove(value);
    }

    /// Document key currently owning a value.
    pub fn lookup(&self, value: &str) -> Option<String> {
        self.data.get(value).map(|owner| owner.clone())
    }
}

/// 2D spherical index: entity id to stored point, answering
/// within-radius (spherical cap) queries through the haversine
/// central angle.
#[derive(Default)]
pub struct GeoIndex {
    data: DashMap<u64, GeoPoint>,
}

impl GeoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: u64, point: GeoPoint) {
        self.data.insert(id, point);
    }

    pub fn remove(&self, id: u64) {
        self.data.remove(&id);
    }

    pub fn get(&self, id: u64) -> Option<GeoPoint> {
        self.data.get(&id).map(|p| p.clone())
    }

    /// Ids of every indexed point within `radius_m` metres of `center`.
    /// A zero radius matches only points at exactly the center
    /// coordinates.
    pub fn within_radius(&self, center: &GeoPoint, radius_m: f64) -> Vec<u64> {
        let cap = radius_to_radians(radius_m);
        let mut hits: Vec<u64> = self
            .data
            .iter()
            .filter(|entry| center.central_angle(entry.value()) <= cap)
            .map(|entry| *entry.key())
            .collect();
        hits.sort_unstable();
        hits
    }
}

/// Placement of a product inside the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub category: String,
    pub subcategory: String,
}

/// Maps every product id to its category/subcategory placement so joins
/// and targeted updates resolve a product without walking the whole
/// catalog.
#[derive(Default)]
pub struct CatalogIndex {
    data: DashMap<u64, Placement>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product_id: u64, category: &str, subcategory: &str) {
        self.data.insert(
            product_id,
            Placement {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            },
        );
    }

    pub fn remove(&self, product_id: u64) {
        self.data.remove(&product_id);
    }

    pub fn placement(&self, product_id: u64) -> Option<Placement> {
        self.data.get(&product_id).map(|p| p.clone())
    }
}
