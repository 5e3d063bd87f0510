//! Products

use serde::{Deserialize, Serialize};

use crate::{prices::Price, rating::Stars};

/// A purchasable product record.
///
/// Serialized field names follow the persisted catalog layout, which
/// predates this crate and is shared with other consumers of the same
/// storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier, assigned by the catalog store on insert.
    pub id: u64,

    /// Product name.
    #[serde(rename = "nome")]
    pub name: String,

    /// Free-text description.
    #[serde(rename = "descricao")]
    pub description: String,

    /// Unit price in whole currency units.
    #[serde(rename = "preco")]
    pub price: Price,

    /// Category label; an open string set, not an enum.
    #[serde(rename = "categoria")]
    pub category: String,

    /// Image reference: a URL or embedded data produced by the caller.
    #[serde(rename = "imagem")]
    pub image: String,

    /// Star rating shown in the catalog.
    #[serde(rename = "estrelas")]
    pub stars: Stars,
}

/// A product about to enter the catalog; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    /// Product name.
    pub name: String,

    /// Free-text description.
    pub description: String,

    /// Unit price in whole currency units.
    pub price: Price,

    /// Category label.
    pub category: String,

    /// Image reference.
    pub image: String,

    /// Star rating.
    pub stars: Stars,
}

/// A partial-field update for an existing product.
///
/// `None` fields are preserved on merge; only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    /// Replacement name.
    pub name: Option<String>,

    /// Replacement description.
    pub description: Option<String>,

    /// Replacement unit price.
    pub price: Option<Price>,

    /// Replacement category.
    pub category: Option<String>,

    /// Replacement image reference.
    pub image: Option<String>,

    /// Replacement star rating.
    pub stars: Option<Stars>,
}

impl ProductPatch {
    /// Merge the supplied fields into `product`, leaving the rest intact.
    pub(crate) fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }

        if let Some(description) = self.description {
            product.description = description;
        }

        if let Some(price) = self.price {
            product.price = price;
        }

        if let Some(category) = self.category {
            product.category = category;
        }

        if let Some(image) = self.image {
            product.image = image;
        }

        if let Some(stars) = self.stars {
            product.stars = stars;
        }
    }
}
