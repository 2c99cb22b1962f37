use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::de;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    Villa,
    Flat,
    Penthouse,
    Plot,
    Commercial,
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "apartment" => Ok(Self::Apartment),
            "villa" => Ok(Self::Villa),
            "flat" => Ok(Self::Flat),
            "penthouse" => Ok(Self::Penthouse),
            "plot" => Ok(Self::Plot),
            "commercial" => Ok(Self::Commercial),
            other => Err(format!("unknown property type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Possession {
    Ready,
    UnderConstruction,
    Upcoming,
}

impl FromStr for Possession {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ready" => Ok(Self::Ready),
            "under-construction" => Ok(Self::UnderConstruction),
            "upcoming" => Ok(Self::Upcoming),
            other => Err(format!("unknown possession status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
}

/// Stored listing document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    #[serde(rename = "propertyTitle")]
    pub title: String,
    pub property_type: Option<PropertyType>,
    pub location: String,
    pub city: String,
    /// Rupees.
    pub price: Option<u64>,
    pub beds: Option<u32>,
    pub baths: Option<u32>,
    /// Square feet.
    pub area: Option<u32>,
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub possession: Option<Possession>,
    pub builder_name: String,
    pub builder_phone: String,
    pub builder_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_id: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image_file_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_plan_file_id: Option<String>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// File ids to remove from the image host when the listing goes away.
    pub fn hosted_file_ids(&self) -> Vec<String> {
        self.image_file_ids
            .iter()
            .chain(self.floor_plan_file_id.iter())
            .filter(|id| !id.trim().is_empty())
            .cloned()
            .collect()
    }

    pub fn view(&self) -> PropertyView {
        PropertyView {
            price_label: self.price.map(format_price),
            property: self.clone(),
        }
    }
}

/// Listing as returned to clients, with a display price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_label: Option<String>,
}

/// Listing form as posted by the list-property page. Numbers may arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyDraft {
    pub property_title: String,
    #[serde(deserialize_with = "de::optional_from_str")]
    pub property_type: Option<PropertyType>,
    pub location: String,
    pub city: String,
    #[serde(deserialize_with = "de::optional_number")]
    pub price: Option<u64>,
    #[serde(deserialize_with = "de::optional_number")]
    pub beds: Option<u32>,
    #[serde(deserialize_with = "de::optional_number")]
    pub baths: Option<u32>,
    #[serde(deserialize_with = "de::optional_number")]
    pub area: Option<u32>,
    pub description: String,
    pub amenities: Vec<String>,
    #[serde(deserialize_with = "de::optional_from_str")]
    pub possession: Option<Possession>,
    pub builder_name: String,
    pub builder_phone: String,
    pub builder_email: String,
    pub images: Vec<String>,
    pub image_file_ids: Vec<String>,
    pub video_url: Option<String>,
    pub floor_plan: Option<String>,
    pub floor_plan_file_id: Option<String>,
}

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;

/// Indian-style price label: `₹1.25 Cr`, `₹45.00 L`, `₹9.50 K` or `₹750`.
pub fn format_price(rupees: u64) -> String {
    let scaled = |unit: u64, suffix: &str| format!("₹{:.2} {suffix}", rupees as f64 / unit as f64);
    if rupees >= CRORE {
        scaled(CRORE, "Cr")
    } else if rupees >= LAKH {
        scaled(LAKH, "L")
    } else if rupees >= THOUSAND {
        scaled(THOUSAND, "K")
    } else {
        format!("₹{rupees}")
    }
}

/// Budget bucket used by the search bar, in lakhs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetRange {
    pub min: u64,
    pub max: Option<u64>,
}

impl FromStr for BudgetRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (min_lakhs, max_lakhs) = match value.trim() {
            "0-25" => (0, Some(25)),
            "25-50" => (25, Some(50)),
            "50-75" => (50, Some(75)),
            "75-100" => (75, Some(100)),
            "100-200" => (100, Some(200)),
            // `+` arrives as a space when the query string is not percent-encoded.
            "200+" | "200" => (200, None),
            other => return Err(format!("unknown budget range '{other}'")),
        };
        Ok(Self {
            min: min_lakhs * LAKH,
            max: max_lakhs.map(|lakhs| lakhs * LAKH),
        })
    }
}

/// Search filters applied to the newest-first listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_beds: Option<u32>,
}

impl PropertyFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Narrows the price window to a budget bucket.
    pub fn with_budget(mut self, budget: BudgetRange) -> Self {
        self.min_price = Some(self.min_price.map_or(budget.min, |min| min.max(budget.min)));
        self.max_price = match (self.max_price, budget.max) {
            (Some(current), Some(cap)) => Some(current.min(cap)),
            (current, cap) => current.or(cap),
        };
        self
    }

    /// Price filters exclude listings without a price.
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(city) = &self.city {
            if !property.city.trim().eq_ignore_ascii_case(city.trim()) {
                return false;
            }
        }
        if let Some(kind) = self.property_type {
            if property.property_type != Some(kind) {
                return false;
            }
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let Some(price) = property.price else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min) {
                return false;
            }
            if self.max_price.is_some_and(|max| price > max) {
                return false;
            }
        }
        if let Some(beds) = self.min_beds {
            if property.beds.unwrap_or(0) < beds {
                return false;
            }
        }
        true
    }
}
