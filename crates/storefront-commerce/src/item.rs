//! Items held in the cart and favorites collections.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// What an item refers to. Spelled `item_type` on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single product.
    Product,
    /// A bundle of products sold together.
    Bundle,
}

impl ItemKind {
    #[allow(missing_docs)]
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Product => "product",
            ItemKind::Bundle => "bundle",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseItemKeyError {
    #[error("Unknown item type `{0}`, expected `product` or `bundle`")]
    UnknownKind(String),
    #[error("Invalid item key `{0}`, expected `<type>-<id>`")]
    Malformed(String),
}

impl FromStr for ItemKind {
    type Err = ParseItemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(ItemKind::Product),
            "bundle" => Ok(ItemKind::Bundle),
            other => Err(ParseItemKeyError::UnknownKind(other.to_string())),
        }
    }
}

/// Identity of an item within a collection. No two items of a collection share a key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    #[serde(rename = "item_type")]
    #[allow(missing_docs)]
    pub kind: ItemKind,
    #[serde(rename = "item_id", deserialize_with = "string_or_number")]
    #[allow(missing_docs)]
    pub id: String,
}

impl ItemKey {
    #[allow(missing_docs)]
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    #[allow(missing_docs)]
    pub fn product(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Product, id)
    }

    #[allow(missing_docs)]
    pub fn bundle(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Bundle, id)
    }
}

/// Formats as `product-7`.
impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

impl FromStr for ItemKey {
    type Err = ParseItemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('-')
            .filter(|(_, id)| !id.is_empty())
            .ok_or_else(|| ParseItemKeyError::Malformed(s.to_string()))?;
        Ok(Self::new(kind.parse()?, id))
    }
}

/// An entry of the cart or favorites.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceItem {
    #[serde(flatten)]
    #[allow(missing_docs)]
    pub key: ItemKey,
    #[serde(rename = "name", default)]
    #[allow(missing_docs)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub image: Option<String>,
    /// Price of a single unit. Decimal strings on the wire.
    #[serde(rename = "price", default, deserialize_with = "decimal")]
    pub unit_price: f64,
    /// Price before discount, if the item is discounted.
    #[serde(
        default,
        deserialize_with = "optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<f64>,
    #[serde(default = "default_quantity")]
    #[allow(missing_docs)]
    pub quantity: u32,
}

impl ResourceItem {
    /// A single unit of the item identified by `key`.
    pub fn new(key: ItemKey, display_name: impl Into<String>, unit_price: f64) -> Self {
        Self {
            key,
            display_name: display_name.into(),
            image: None,
            unit_price,
            original_price: None,
            quantity: 1,
        }
    }

    #[allow(missing_docs)]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// `unit_price * quantity`.
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        StringOrNumber::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("price out of range")),
    }
}

fn optional_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "decimal")] f64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(price)| price))
}

/// A collection as returned by the API: either wrapped (`{"items": [..]}`) or a bare list.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum CollectionPayload {
    Wrapped { items: Vec<ResourceItem> },
    Bare(Vec<ResourceItem>),
}

impl CollectionPayload {
    pub(crate) fn into_items(self) -> Vec<ResourceItem> {
        match self {
            CollectionPayload::Wrapped { items } | CollectionPayload::Bare(items) => items,
        }
    }

    /// Extract the collection from a mutation response. Bodies that don't carry a collection,
    /// like a single created item or an acknowledgement, yield `None`. A body shaped like a
    /// collection (a list, or an object with `items`) must decode in full.
    pub(crate) fn from_response(
        response: Option<Value>,
    ) -> Result<Option<Vec<ResourceItem>>, serde_json::Error> {
        let Some(value) = response else {
            return Ok(None);
        };
        let is_collection = match &value {
            Value::Array(_) => true,
            Value::Object(map) => map.contains_key("items"),
            _ => false,
        };
        if !is_collection {
            debug!("Response carries no collection");
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_value::<CollectionPayload>(value)?.into_items(),
        ))
    }
}
