//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine},
    catalog::{CatalogError, CatalogStore, PriceOrder},
    orders::{Order, OrderError, OrderStatistics, OrderStatus, OrderStore},
    prices::{Price, format_amount},
    products::{NewProduct, Product, ProductPatch},
    rating::{Stars, StarsOutOfRange},
    reviews::{NewReview, Review, ReviewError, ReviewStore},
    session::{Session, SessionError},
    storage::{FileStorage, MemoryStorage, Storage, StorageError},
    users::{NewUser, Role, User, UserError, UserStore},
};
