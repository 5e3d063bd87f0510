//! Cart
//!
//! An insertion-ordered sequence of (product snapshot, quantity) lines.
//! Adding a product that is already present accumulates its quantity
//! instead of appending a second line. Every mutation persists the whole
//! line list synchronously; derived amounts are recomputed on every call so
//! they can never go stale.

use std::num::NonZeroU32;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    products::Product,
    storage::{Storage, StorageError, keys},
};

/// Delivery fee rate applied to a non-zero subtotal.
const DELIVERY_FEE_RATE: f64 = 0.05;

/// Errors raised by the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failure encoding the cart for persistence.
    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One (product snapshot, quantity) pair within a cart.
///
/// The product is a full copy taken when the line was created; later
/// catalog edits do not reach into existing lines. The non-zero quantity
/// type carries the `quantity >= 1` invariant, so persisted data with a
/// zero quantity fails deserialization as structurally invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Snapshot of the product at the time it entered the cart.
    #[serde(rename = "produto")]
    pub product: Product,

    /// Number of units, at least one.
    #[serde(rename = "quantidade")]
    pub quantity: NonZeroU32,
}

/// Persisted cart layout: a single object wrapping the line array.
#[derive(Debug, Serialize, Deserialize)]
struct CartData {
    itens: Vec<CartLine>,
}

/// The shopping cart.
#[derive(Debug)]
pub struct Cart<S> {
    storage: S,
    lines: SmallVec<[CartLine; 8]>,
}

impl<S: Storage> Cart<S> {
    /// Open the cart over the given storage, restoring any persisted lines.
    ///
    /// Corrupt data is recovered in two tiers: unparseable text is logged
    /// and the entry removed from storage; parseable-but-wrong-shape data
    /// is logged, discarded, and overwritten with the empty cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if storage cannot be read or the recovery
    /// write fails.
    pub fn open(storage: S) -> Result<Self, CartError> {
        let mut cart = Self {
            storage,
            lines: SmallVec::new(),
        };

        let Some(raw) = cart.storage.get(keys::CART)? else {
            return Ok(cart);
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Err(error) => {
                tracing::warn!(%error, "removing unparseable cart data");
                cart.storage.remove(keys::CART)?;
            }
            Ok(value) => match serde_json::from_value::<CartData>(value) {
                Ok(data) => cart.lines = SmallVec::from_vec(data.itens),
                Err(error) => {
                    tracing::warn!(%error, "resetting structurally invalid cart data");
                    cart.persist()?;
                }
            },
        }

        Ok(cart)
    }

    /// Add `quantity` units of a product.
    ///
    /// If a line for the product id already exists its quantity
    /// accumulates; otherwise a new line is appended at the end.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn add(&mut self, product: Product, quantity: NonZeroU32) -> Result<(), CartError> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            if let Some(total) = NonZeroU32::new(line.quantity.get().saturating_add(quantity.get()))
            {
                line.quantity = total;
            }
        } else {
            self.lines.push(CartLine { product, quantity });
        }

        self.persist()
    }

    /// Drop the line for the given product id, if present.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn remove(&mut self, product_id: u64) -> Result<(), CartError> {
        self.lines.retain(|line| line.product.id != product_id);

        self.persist()
    }

    /// Overwrite the quantity of an existing line, keeping its position.
    ///
    /// A quantity of zero behaves as [`Cart::remove`]; an unknown product
    /// id is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn set_quantity(&mut self, product_id: u64, quantity: u32) -> Result<(), CartError> {
        if !self.lines.iter().any(|l| l.product.id == product_id) {
            return Ok(());
        }

        let Some(quantity) = NonZeroU32::new(quantity) else {
            return self.remove(product_id);
        };

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }

        self.persist()
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();

        self.persist()
    }

    /// Read-only view of the lines, in insertion order.
    ///
    /// Mutation goes through [`Cart::add`], [`Cart::set_quantity`] and
    /// [`Cart::remove`].
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.product.price.to_decimal() * Decimal::from(line.quantity.get()))
            .sum()
    }

    /// Delivery fee: 5% of the subtotal, zero when the subtotal is zero.
    #[must_use]
    pub fn delivery_fee(&self) -> Decimal {
        let subtotal = self.subtotal();

        if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            Percentage::from(DELIVERY_FEE_RATE) * subtotal
        }
    }

    /// Subtotal plus delivery fee.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.delivery_fee()
    }

    fn persist(&mut self) -> Result<(), CartError> {
        let data = CartData {
            itens: self.lines.to_vec(),
        };

        let raw = serde_json::to_string(&data)?;

        self.storage.set(keys::CART, &raw)?;

        Ok(())
    }
}
