//! Orders
//!
//! An order is an immutable snapshot of a cart taken at checkout: deep
//! copies of every line plus the derived amounts frozen as plain numbers.
//! Only the approval status may change afterwards, and only once: pending
//! orders move to approved or rejected and stay there.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartLine},
    storage::{Storage, StorageError, keys},
};

/// Errors raised by the order store.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order with the given identifier.
    #[error("order {0} not found")]
    NotFound(u64),

    /// The order has already been approved or rejected.
    #[error("order {id} is already {status}")]
    AlreadyDecided {
        /// Identifier of the order.
        id: u64,
        /// The status the order already holds.
        status: OrderStatus,
    },

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failure encoding the orders for persistence.
    #[error("failed to encode orders: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting an approval decision.
    Pending,

    /// Approved by the store side.
    Approved,

    /// Rejected by the store side.
    Rejected,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        };

        f.write_str(label)
    }
}

/// A placed order.
///
/// Amounts are captured from the cart at checkout time and never
/// recomputed; later catalog or cart changes cannot reach them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier, assigned by the store on creation.
    pub id: u64,

    /// Snapshot of the cart lines at checkout.
    #[serde(rename = "itens")]
    pub lines: Vec<CartLine>,

    /// Sum of price × quantity at checkout.
    pub subtotal: Decimal,

    /// Delivery fee at checkout.
    #[serde(rename = "taxaEntrega")]
    pub delivery_fee: Decimal,

    /// Subtotal plus delivery fee at checkout.
    pub total: Decimal,

    /// Creation time.
    #[serde(rename = "dataHora")]
    pub placed_at: Timestamp,

    /// Approval status.
    pub status: OrderStatus,
}

/// Per-status counts plus the approved order value.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatistics {
    /// Number of orders in the store.
    pub total: usize,

    /// Orders awaiting a decision.
    pub pending: usize,

    /// Approved orders.
    pub approved: usize,

    /// Rejected orders.
    pub rejected: usize,

    /// Sum of `total` over approved orders only.
    pub approved_value: Decimal,
}

/// The order store.
#[derive(Debug)]
pub struct OrderStore<S> {
    storage: S,
    orders: Vec<Order>,
    next_id: u64,
}

impl<S: Storage> OrderStore<S> {
    /// Open the order store over the given storage.
    ///
    /// Unreadable persisted data is logged and discarded, leaving an empty
    /// store. The identifier counter recovers as highest-used + 1.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if storage cannot be read.
    pub fn open(storage: S) -> Result<Self, OrderError> {
        let mut store = Self {
            storage,
            orders: Vec::new(),
            next_id: 1,
        };

        if let Some(raw) = store.storage.get(keys::ORDERS)? {
            match serde_json::from_str::<Vec<Order>>(&raw) {
                Ok(orders) => {
                    store.next_id = orders.iter().map(|o| o.id).max().map_or(1, |max| max + 1);
                    store.orders = orders;
                }
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable order data");
                }
            }
        }

        Ok(store)
    }

    /// Snapshot a cart into a new pending order.
    ///
    /// Lines are deep-copied and the cart's current derived amounts are
    /// frozen into the order. Callers are responsible for checking
    /// `cart.total_item_count() > 0` first; an order snapshotted from an
    /// empty cart has no lines and a zero total.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if the orders cannot be persisted.
    pub fn create_from_cart<T: Storage>(&mut self, cart: &Cart<T>) -> Result<Order, OrderError> {
        let id = self.next_id;
        self.next_id += 1;

        let order = Order {
            id,
            lines: cart.lines().to_vec(),
            subtotal: cart.subtotal(),
            delivery_fee: cart.delivery_fee(),
            total: cart.total(),
            placed_at: Timestamp::now(),
            status: OrderStatus::Pending,
        };

        self.orders.push(order.clone());
        self.persist()?;

        Ok(order)
    }

    /// Approve a pending order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for an unknown identifier and
    /// [`OrderError::AlreadyDecided`] if the order is no longer pending;
    /// the store is left unchanged in both cases.
    pub fn approve(&mut self, id: u64) -> Result<(), OrderError> {
        self.decide(id, OrderStatus::Approved)
    }

    /// Reject a pending order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for an unknown identifier and
    /// [`OrderError::AlreadyDecided`] if the order is no longer pending;
    /// the store is left unchanged in both cases.
    pub fn reject(&mut self, id: u64) -> Result<(), OrderError> {
        self.decide(id, OrderStatus::Rejected)
    }

    /// Look up an order by identifier.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// All orders, as a defensive copy in creation order.
    #[must_use]
    pub fn all(&self) -> Vec<Order> {
        self.orders.clone()
    }

    /// Orders currently in the given status.
    #[must_use]
    pub fn by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    /// Per-status counts plus the sum of `total` over approved orders.
    #[must_use]
    pub fn statistics(&self) -> OrderStatistics {
        let count_with = |status: OrderStatus| {
            self.orders
                .iter()
                .filter(|order| order.status == status)
                .count()
        };

        OrderStatistics {
            total: self.orders.len(),
            pending: count_with(OrderStatus::Pending),
            approved: count_with(OrderStatus::Approved),
            rejected: count_with(OrderStatus::Rejected),
            approved_value: self
                .orders
                .iter()
                .filter(|order| order.status == OrderStatus::Approved)
                .map(|order| order.total)
                .sum(),
        }
    }

    fn decide(&mut self, id: u64, status: OrderStatus) -> Result<(), OrderError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OrderError::NotFound(id))?;

        if order.status != OrderStatus::Pending {
            return Err(OrderError::AlreadyDecided {
                id,
                status: order.status,
            });
        }

        order.status = status;

        self.persist()
    }

    fn persist(&mut self) -> Result<(), OrderError> {
        let raw = serde_json::to_string(&self.orders)?;

        self.storage.set(keys::ORDERS, &raw)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use testresult::TestResult;

    use crate::{prices::Price, products::Product, rating::Stars, storage::MemoryStorage};

    use super::*;

    fn product(id: u64, price: u64) -> Product {
        Product {
            id,
            name: format!("Produto {id}"),
            description: String::new(),
            price: Price::new(price),
            category: "eletronicos".to_string(),
            image: String::new(),
            stars: Stars::try_from(4).expect("4 is a valid rating"),
        }
    }

    fn qty(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).expect("test quantity must be non-zero")
    }

    fn cart_with_lines() -> TestResult<Cart<MemoryStorage>> {
        let mut cart = Cart::open(MemoryStorage::new())?;

        cart.add(product(1, 1000), qty(2))?;
        cart.add(product(2, 500), qty(1))?;

        Ok(cart)
    }

    #[test]
    fn create_from_cart_freezes_the_derived_amounts() -> TestResult {
        let cart = cart_with_lines()?;
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let order = orders.create_from_cart(&cart)?;

        assert_eq!(order.subtotal, Decimal::from(2500));
        assert_eq!(order.delivery_fee, Decimal::from(125));
        assert_eq!(order.total, Decimal::from(2625));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines.len(), 2);

        Ok(())
    }

    #[test]
    fn order_lines_are_independent_of_the_cart() -> TestResult {
        let mut cart = cart_with_lines()?;
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let order = orders.create_from_cart(&cart)?;

        cart.set_quantity(1, 10)?;
        cart.remove(2)?;

        let stored = orders.get(order.id).expect("order must exist");

        assert_eq!(stored.lines.len(), 2);
        assert_eq!(stored.lines.first().map(|l| l.quantity), Some(qty(2)));
        assert_eq!(stored.subtotal, Decimal::from(2500));

        Ok(())
    }

    #[test]
    fn orders_receive_monotonic_ids() -> TestResult {
        let cart = cart_with_lines()?;
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let first = orders.create_from_cart(&cart)?;
        let second = orders.create_from_cart(&cart)?;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        Ok(())
    }

    #[test]
    fn id_counter_survives_a_reload() -> TestResult {
        let cart = cart_with_lines()?;
        let storage = MemoryStorage::new();

        {
            let mut orders = OrderStore::open(storage.clone())?;
            orders.create_from_cart(&cart)?;
            orders.create_from_cart(&cart)?;
            orders.create_from_cart(&cart)?;
        }

        let mut reloaded = OrderStore::open(storage)?;
        let next = reloaded.create_from_cart(&cart)?;

        assert_eq!(next.id, 4, "counter must recover as highest-used + 1");

        Ok(())
    }

    #[test]
    fn approve_moves_a_pending_order() -> TestResult {
        let cart = cart_with_lines()?;
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let order = orders.create_from_cart(&cart)?;

        orders.approve(order.id)?;

        assert_eq!(
            orders.get(order.id).map(|o| o.status),
            Some(OrderStatus::Approved)
        );

        Ok(())
    }

    #[test]
    fn approve_unknown_id_returns_not_found_and_changes_nothing() -> TestResult {
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let result = orders.approve(42);

        assert!(
            matches!(result, Err(OrderError::NotFound(42))),
            "expected NotFound, got {result:?}"
        );
        assert!(orders.all().is_empty());

        Ok(())
    }

    #[test]
    fn decided_orders_cannot_transition_again() -> TestResult {
        let cart = cart_with_lines()?;
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let order = orders.create_from_cart(&cart)?;

        orders.reject(order.id)?;

        let result = orders.approve(order.id);

        assert!(
            matches!(
                result,
                Err(OrderError::AlreadyDecided {
                    status: OrderStatus::Rejected,
                    ..
                })
            ),
            "expected AlreadyDecided, got {result:?}"
        );
        assert_eq!(
            orders.get(order.id).map(|o| o.status),
            Some(OrderStatus::Rejected),
            "failed transition must not change the stored status"
        );

        Ok(())
    }

    #[test]
    fn by_status_partitions_the_orders() -> TestResult {
        let cart = cart_with_lines()?;
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let first = orders.create_from_cart(&cart)?;
        let second = orders.create_from_cart(&cart)?;
        orders.create_from_cart(&cart)?;

        orders.approve(first.id)?;
        orders.reject(second.id)?;

        assert_eq!(orders.by_status(OrderStatus::Approved).len(), 1);
        assert_eq!(orders.by_status(OrderStatus::Rejected).len(), 1);
        assert_eq!(orders.by_status(OrderStatus::Pending).len(), 1);

        Ok(())
    }

    #[test]
    fn statistics_count_statuses_and_sum_approved_value() -> TestResult {
        let cart = cart_with_lines()?;
        let mut orders = OrderStore::open(MemoryStorage::new())?;

        let first = orders.create_from_cart(&cart)?;
        let second = orders.create_from_cart(&cart)?;
        orders.create_from_cart(&cart)?;

        orders.approve(first.id)?;
        orders.approve(second.id)?;

        let stats = orders.statistics();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved, 2);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.approved_value, Decimal::from(5250));

        Ok(())
    }

    #[test]
    fn orders_round_trip_through_storage() -> TestResult {
        let cart = cart_with_lines()?;
        let storage = MemoryStorage::new();

        let placed = {
            let mut orders = OrderStore::open(storage.clone())?;
            orders.create_from_cart(&cart)?
        };

        let reloaded = OrderStore::open(storage)?;
        let restored = reloaded.get(placed.id).expect("order must survive reload");

        assert_eq!(restored, &placed);

        Ok(())
    }

    #[test]
    fn unreadable_order_data_leaves_an_empty_store() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.set(keys::ORDERS, "broken")?;

        let orders = OrderStore::open(storage)?;

        assert!(orders.all().is_empty());

        Ok(())
    }
}
