//! Virtual try-on domain rules.
//!
//! A try-on session dresses a model (3D avatar or uploaded photo) with at most
//! one garment per clothing category, plus any number of accessories. The
//! [`Outfit`] type owns that rule so storage code only has to apply the
//! placement it reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ParseEnumError;

/// What the shopper is dressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// The built-in 3D avatar.
    #[serde(rename = "3d_model")]
    ThreeDModel,
    /// A photo uploaded by the shopper.
    #[serde(rename = "user_photo")]
    UserPhoto,
}

impl ModelType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeDModel => "3d_model",
            Self::UserPhoto => "user_photo",
        }
    }

    /// A photo session cannot be created without the photo itself.
    #[must_use]
    pub const fn requires_photo(self) -> bool {
        matches!(self, Self::UserPhoto)
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3d_model" => Ok(Self::ThreeDModel),
            "user_photo" => Ok(Self::UserPhoto),
            _ => Err(ParseEnumError::new("model type", s)),
        }
    }
}

/// Clothing slot a product occupies on the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothingCategory {
    Top,
    Bottom,
    Shoes,
    FullOutfit,
    Accessories,
}

impl ClothingCategory {
    pub const ALL: [Self; 5] = [
        Self::Top,
        Self::Bottom,
        Self::Shoes,
        Self::FullOutfit,
        Self::Accessories,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Shoes => "shoes",
            Self::FullOutfit => "full_outfit",
            Self::Accessories => "accessories",
        }
    }

    /// Accessories stack; every other category holds a single garment.
    #[must_use]
    pub const fn is_stackable(self) -> bool {
        matches!(self, Self::Accessories)
    }
}

impl std::fmt::Display for ClothingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClothingCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("clothing category", s))
    }
}

/// Optional body measurements captured with a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hips: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoe_size: Option<f64>,
}

impl BodyMeasurements {
    /// Field names accepted from clients.
    pub const FIELDS: [&'static str; 6] = ["height", "weight", "chest", "waist", "hips", "shoe_size"];

    /// Set a measurement by field name. Returns `false` for unknown fields.
    pub fn set(&mut self, field: &str, value: f64) -> bool {
        let slot = match field {
            "height" => &mut self.height,
            "weight" => &mut self.weight,
            "chest" => &mut self.chest,
            "waist" => &mut self.waist,
            "hips" => &mut self.hips,
            "shoe_size" => &mut self.shoe_size,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.height.is_none()
            && self.weight.is_none()
            && self.chest.is_none()
            && self.waist.is_none()
            && self.hips.is_none()
            && self.shoe_size.is_none()
    }
}

/// Items currently worn in a try-on session.
///
/// Invariant: one item per non-stackable category; accessories unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outfit<T> {
    garments: BTreeMap<ClothingCategory, T>,
    accessories: Vec<T>,
}

impl<T> Default for Outfit<T> {
    fn default() -> Self {
        Self {
            garments: BTreeMap::new(),
            accessories: Vec::new(),
        }
    }
}

impl<T> Outfit<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an outfit from stored items in insertion order.
    ///
    /// A later garment in an already occupied category replaces the earlier
    /// one, exactly as if the items had been placed one by one.
    pub fn from_items(items: impl IntoIterator<Item = (ClothingCategory, T)>) -> Self {
        let mut outfit = Self::new();
        for (category, item) in items {
            outfit.place(category, item);
        }
        outfit
    }

    /// Put an item on the model, returning the garment it displaced, if any.
    pub fn place(&mut self, category: ClothingCategory, item: T) -> Option<T> {
        if category.is_stackable() {
            self.accessories.push(item);
            None
        } else {
            self.garments.insert(category, item)
        }
    }

    /// Remove the first item matching `pred`.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let key = self
            .garments
            .iter()
            .find_map(|(category, item)| pred(item).then_some(*category));
        if let Some(category) = key {
            return self.garments.remove(&category);
        }
        let index = self.accessories.iter().position(pred)?;
        Some(self.accessories.remove(index))
    }

    /// The garment in a single-item category.
    #[must_use]
    pub fn garment(&self, category: ClothingCategory) -> Option<&T> {
        self.garments.get(&category)
    }

    #[must_use]
    pub fn accessories(&self) -> &[T] {
        &self.accessories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.garments.len() + self.accessories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All worn items, garments first in category order, then accessories.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.garments.values().chain(self.accessories.iter())
    }
}
