//! Reviews
//!
//! Per-product star ratings with free-text comments. The one-review-per-
//! user rule is an advisory pre-check: callers ask `has_user_reviewed`
//! before submitting; `add` itself does not reject duplicates.

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    rating::Stars,
    storage::{Storage, StorageError, keys},
};

/// Errors raised by the review store.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failure encoding the reviews for persistence.
    #[error("failed to encode reviews: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A posted product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier, assigned by the store.
    pub id: u64,

    /// Product being reviewed.
    #[serde(rename = "produtoId")]
    pub product_id: u64,

    /// Author identifier.
    #[serde(rename = "usuarioId")]
    pub user_id: u64,

    /// Author display name, denormalized for rendering.
    #[serde(rename = "nomeUsuario")]
    pub user_name: String,

    /// Star rating, 1–5.
    #[serde(rename = "estrelas")]
    pub stars: Stars,

    /// Free-text comment.
    #[serde(rename = "comentario")]
    pub comment: String,

    /// Submission time.
    #[serde(rename = "dataHora")]
    pub posted_at: Timestamp,
}

/// A review about to be posted; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    /// Product being reviewed.
    pub product_id: u64,

    /// Author identifier.
    pub user_id: u64,

    /// Author display name.
    pub user_name: String,

    /// Star rating, 1–5.
    pub stars: Stars,

    /// Free-text comment.
    pub comment: String,
}

/// The review store.
#[derive(Debug)]
pub struct ReviewStore<S> {
    storage: S,
    reviews: Vec<Review>,
    next_id: u64,
}

impl<S: Storage> ReviewStore<S> {
    /// Open the review store over the given storage.
    ///
    /// Unreadable persisted data is logged and discarded, leaving an empty
    /// store. The identifier counter recovers as highest-used + 1.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewError`] if storage cannot be read.
    pub fn open(storage: S) -> Result<Self, ReviewError> {
        let mut store = Self {
            storage,
            reviews: Vec::new(),
            next_id: 1,
        };

        if let Some(raw) = store.storage.get(keys::REVIEWS)? {
            match serde_json::from_str::<Vec<Review>>(&raw) {
                Ok(reviews) => {
                    store.next_id = reviews.iter().map(|r| r.id).max().map_or(1, |max| max + 1);
                    store.reviews = reviews;
                }
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable review data");
                }
            }
        }

        Ok(store)
    }

    /// Post a review, assigning the next identifier and the current time.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewError`] if the reviews cannot be persisted.
    pub fn add(&mut self, review: NewReview) -> Result<Review, ReviewError> {
        let id = self.next_id;
        self.next_id += 1;

        let stored = Review {
            id,
            product_id: review.product_id,
            user_id: review.user_id,
            user_name: review.user_name,
            stars: review.stars,
            comment: review.comment,
            posted_at: Timestamp::now(),
        };

        self.reviews.push(stored.clone());
        self.persist()?;

        Ok(stored)
    }

    /// All reviews for the given product, in submission order.
    #[must_use]
    pub fn by_product(&self, product_id: u64) -> Vec<Review> {
        self.reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect()
    }

    /// Mean rating for the product, rounded to the nearest whole star
    /// (midpoint away from zero). `None` when the product has no reviews.
    #[must_use]
    pub fn average_for_product(&self, product_id: u64) -> Option<Stars> {
        let ratings: Vec<Decimal> = self
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| Decimal::from(r.stars.value()))
            .collect();

        if ratings.is_empty() {
            return None;
        }

        let mean = ratings.iter().sum::<Decimal>() / Decimal::from(ratings.len());

        mean.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u8()
            .and_then(|value| Stars::try_from(value).ok())
    }

    /// Whether the user already reviewed the product. Linear scan; callers
    /// use this as the duplicate-submission pre-check.
    #[must_use]
    pub fn has_user_reviewed(&self, product_id: u64, user_id: u64) -> bool {
        self.reviews
            .iter()
            .any(|r| r.product_id == product_id && r.user_id == user_id)
    }

    fn persist(&mut self) -> Result<(), ReviewError> {
        let raw = serde_json::to_string(&self.reviews)?;

        self.storage.set(keys::REVIEWS, &raw)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::storage::MemoryStorage;

    use super::*;

    fn review(product_id: u64, user_id: u64, stars: u8) -> TestResult<NewReview> {
        Ok(NewReview {
            product_id,
            user_id,
            user_name: format!("Usuário {user_id}"),
            stars: Stars::try_from(stars)?,
            comment: "Muito bom".to_string(),
        })
    }

    #[test]
    fn add_assigns_sequential_ids() -> TestResult {
        let mut reviews = ReviewStore::open(MemoryStorage::new())?;

        let first = reviews.add(review(1, 1, 5)?)?;
        let second = reviews.add(review(1, 2, 3)?)?;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        Ok(())
    }

    #[test]
    fn by_product_filters_and_keeps_order() -> TestResult {
        let mut reviews = ReviewStore::open(MemoryStorage::new())?;

        reviews.add(review(1, 1, 5)?)?;
        reviews.add(review(2, 1, 2)?)?;
        reviews.add(review(1, 2, 3)?)?;

        let for_product = reviews.by_product(1);
        let user_ids: Vec<u64> = for_product.iter().map(|r| r.user_id).collect();

        assert_eq!(user_ids, vec![1, 2]);

        Ok(())
    }

    #[test]
    fn average_rounds_to_the_nearest_star() -> TestResult {
        let mut reviews = ReviewStore::open(MemoryStorage::new())?;

        reviews.add(review(1, 1, 5)?)?;
        reviews.add(review(1, 2, 4)?)?;
        reviews.add(review(1, 3, 4)?)?;

        // 13 / 3 = 4.33…, rounds to 4
        assert_eq!(reviews.average_for_product(1), Some(Stars::try_from(4)?));

        Ok(())
    }

    #[test]
    fn average_rounds_midpoints_up() -> TestResult {
        let mut reviews = ReviewStore::open(MemoryStorage::new())?;

        reviews.add(review(1, 1, 2)?)?;
        reviews.add(review(1, 2, 3)?)?;

        // 5 / 2 = 2.5, rounds away from zero to 3
        assert_eq!(reviews.average_for_product(1), Some(Stars::try_from(3)?));

        Ok(())
    }

    #[test]
    fn average_of_unreviewed_product_is_none() -> TestResult {
        let reviews = ReviewStore::open(MemoryStorage::new())?;

        assert_eq!(reviews.average_for_product(99), None);

        Ok(())
    }

    #[test]
    fn has_user_reviewed_matches_the_exact_pair() -> TestResult {
        let mut reviews = ReviewStore::open(MemoryStorage::new())?;

        reviews.add(review(1, 1, 5)?)?;

        assert!(reviews.has_user_reviewed(1, 1));
        assert!(!reviews.has_user_reviewed(1, 2));
        assert!(!reviews.has_user_reviewed(2, 1));

        Ok(())
    }

    #[test]
    fn reviews_round_trip_through_storage() -> TestResult {
        let storage = MemoryStorage::new();

        let posted = {
            let mut reviews = ReviewStore::open(storage.clone())?;
            reviews.add(review(1, 1, 5)?)?
        };

        let reloaded = ReviewStore::open(storage)?;
        let restored = reloaded.by_product(1);

        assert_eq!(restored.first(), Some(&posted));

        Ok(())
    }

    #[test]
    fn id_counter_survives_a_reload() -> TestResult {
        let storage = MemoryStorage::new();

        {
            let mut reviews = ReviewStore::open(storage.clone())?;
            reviews.add(review(1, 1, 5)?)?;
            reviews.add(review(1, 2, 4)?)?;
        }

        let mut reloaded = ReviewStore::open(storage)?;
        let next = reloaded.add(review(1, 3, 3)?)?;

        assert_eq!(next.id, 3);

        Ok(())
    }

    #[test]
    fn unreadable_review_data_leaves_an_empty_store() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.set(keys::REVIEWS, "not json")?;

        let reviews = ReviewStore::open(storage)?;

        assert!(reviews.by_product(1).is_empty());

        Ok(())
    }
}
