//! Catalog
//!
//! The product catalog store: monotonic identifier assignment, CRUD,
//! search, category filtering and price sorting, persisted wholesale under
//! a single storage key. A fresh store seeds itself from an embedded
//! fixture so the identifier counter is consistent from the first run.

use serde::Deserialize;
use thiserror::Error;

use crate::{
    products::{NewProduct, Product, ProductPatch},
    storage::{Storage, StorageError, keys},
};

/// The default catalog loaded into empty storage.
const SEED_CATALOG: &str = include_str!("seed.yml");

/// Errors raised by the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with the given identifier.
    #[error("product {0} not found")]
    NotFound(u64),

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failure encoding the catalog for persistence.
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] serde_json::Error),

    /// Failure parsing the embedded seed fixture.
    #[error("failed to parse seed catalog: {0}")]
    Seed(#[from] serde_norway::Error),
}

/// Sort direction for [`CatalogStore::sorted_by_price`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    /// Cheapest first.
    Ascending,

    /// Most expensive first.
    Descending,
}

#[derive(Debug, Deserialize)]
struct SeedCatalog {
    products: Vec<NewProduct>,
}

/// The product catalog store.
#[derive(Debug)]
pub struct CatalogStore<S> {
    storage: S,
    products: Vec<Product>,
    next_id: u64,
}

impl<S: Storage> CatalogStore<S> {
    /// Open the catalog over the given storage.
    ///
    /// Absent data seeds the default catalog and persists it immediately;
    /// unreadable data is logged, discarded, and replaced by the seed. The
    /// identifier counter recovers as highest-used + 1.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if storage cannot be read or the seed
    /// cannot be parsed or persisted.
    pub fn open(storage: S) -> Result<Self, CatalogError> {
        let mut store = Self {
            storage,
            products: Vec::new(),
            next_id: 1,
        };

        match store.storage.get(keys::CATALOG)? {
            Some(raw) => match serde_json::from_str::<Vec<Product>>(&raw) {
                Ok(products) => {
                    store.next_id = products.iter().map(|p| p.id).max().map_or(1, |max| max + 1);
                    store.products = products;
                }
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable catalog data, reseeding");
                    store.seed()?;
                }
            },
            None => store.seed()?,
        }

        Ok(store)
    }

    /// Insert a product, assigning the next identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the catalog cannot be persisted.
    pub fn insert(&mut self, product: NewProduct) -> Result<Product, CatalogError> {
        let id = self.next_id;
        self.next_id += 1;

        let stored = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image: product.image,
            stars: product.stars,
        };

        self.products.push(stored.clone());
        self.persist()?;

        Ok(stored)
    }

    /// Merge the supplied fields into an existing product.
    ///
    /// Fields the patch leaves as `None` are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the identifier is absent, or a
    /// persistence error.
    pub fn update(&mut self, id: u64, patch: ProductPatch) -> Result<Product, CatalogError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CatalogError::NotFound(id))?;

        patch.apply(product);

        let updated = product.clone();

        self.persist()?;

        Ok(updated)
    }

    /// Remove a product, returning the removed record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the identifier is absent, or a
    /// persistence error.
    pub fn remove(&mut self, id: u64) -> Result<Product, CatalogError> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or(CatalogError::NotFound(id))?;

        let removed = self.products.remove(index);

        self.persist()?;

        Ok(removed)
    }

    /// Look up a product by identifier.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// All products, as a defensive copy in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<Product> {
        self.products.clone()
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Case-insensitive substring search over name and description.
    ///
    /// Matches are returned in their original catalog order.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<Product> {
        let needle = term.to_lowercase();

        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Products in the given category, exact match.
    ///
    /// An empty category returns the full catalog.
    #[must_use]
    pub fn filter_by_category(&self, category: &str) -> Vec<Product> {
        if category.is_empty() {
            return self.all();
        }

        self.products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    /// A price-sorted copy of the catalog; the stored order is untouched.
    ///
    /// The sort is stable, so equal prices keep their insertion order.
    #[must_use]
    pub fn sorted_by_price(&self, order: PriceOrder) -> Vec<Product> {
        let mut sorted = self.products.clone();

        match order {
            PriceOrder::Ascending => sorted.sort_by(|a, b| a.price.cmp(&b.price)),
            PriceOrder::Descending => sorted.sort_by(|a, b| b.price.cmp(&a.price)),
        }

        sorted
    }

    fn seed(&mut self) -> Result<(), CatalogError> {
        let seed: SeedCatalog = serde_norway::from_str(SEED_CATALOG)?;

        self.products.clear();
        self.next_id = 1;

        for product in seed.products {
            let id = self.next_id;
            self.next_id += 1;

            self.products.push(Product {
                id,
                name: product.name,
                description: product.description,
                price: product.price,
                category: product.category,
                image: product.image,
                stars: product.stars,
            });
        }

        self.persist()
    }

    fn persist(&mut self) -> Result<(), CatalogError> {
        let raw = serde_json::to_string(&self.products)?;

        self.storage.set(keys::CATALOG, &raw)?;

        Ok(())
    }
}
