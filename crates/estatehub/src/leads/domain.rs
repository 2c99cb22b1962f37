use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::de;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sales pipeline stage of an enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadStatus {
    New,
    Contacted,
    SiteVisit,
    Negotiation,
    Closed,
    Lost,
}

impl LeadStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::SiteVisit => "site-visit",
            Self::Negotiation => "negotiation",
            Self::Closed => "closed",
            Self::Lost => "lost",
        }
    }

    /// Closed and lost leads never change stage again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Lost)
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "site-visit" => Ok(Self::SiteVisit),
            "negotiation" => Ok(Self::Negotiation),
            "closed" => Ok(Self::Closed),
            "lost" => Ok(Self::Lost),
            other => Err(format!("unknown lead status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_title: Option<String>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enquiry form posted from a property page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadForm {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message: Option<String>,
    #[serde(deserialize_with = "de::optional_id")]
    pub property_id: Option<String>,
    pub property_title: Option<String>,
}

/// Enquiry forwarded by email to the sales inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Enquiry {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message: Option<String>,
    pub property_title: Option<String>,
    pub property_url: Option<String>,
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
