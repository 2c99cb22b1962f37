use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered builders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuilderId(pub String);

impl BuilderId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for BuilderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Approval state of a builder account. Only `Pending` accounts can be decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderStatus {
    Pending,
    Approved,
    Rejected,
}

impl BuilderStatus {
    pub const ALL: [BuilderStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for BuilderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown builder status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub gst_number: String,
    pub pan_number: String,
}

/// Uploaded verification documents, stored as hosted URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderDocuments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_certificate: Option<String>,
}

/// Stored builder account, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builder {
    pub id: BuilderId,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub company: CompanyDetails,
    pub documents: BuilderDocuments,
    pub status: BuilderStatus,
    pub email_verified: bool,
    pub must_change_password: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Builder {
    pub fn view(&self) -> BuilderView {
        BuilderView {
            id: self.id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            company: self.company.clone(),
            documents: self.documents.clone(),
            status: self.status,
            email_verified: self.email_verified,
            must_change_password: self.must_change_password,
            approved_by: self.approved_by.clone(),
            approved_at: self.approved_at,
            rejected_at: self.rejected_at,
            rejection_reason: self.rejection_reason.clone(),
            created_at: self.created_at,
        }
    }

    pub fn summary(&self) -> BuilderSummary {
        BuilderSummary {
            id: self.id.clone(),
            name: self.full_name.clone(),
            email: self.email.clone(),
            status: self.status,
            company: self.company.name.clone(),
        }
    }
}

/// Password-free projection returned by every builder-facing and admin route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderView {
    pub id: BuilderId,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub company: CompanyDetails,
    pub documents: BuilderDocuments,
    pub status: BuilderStatus,
    pub email_verified: bool,
    pub must_change_password: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuilderSummary {
    pub id: BuilderId,
    pub name: String,
    pub email: String,
    pub status: BuilderStatus,
    pub company: String,
}

/// Totals by status plus a compact listing of every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuilderOverview {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
    pub builders: Vec<BuilderSummary>,
}

/// Registration form as posted by the signup page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub company_name: String,
    pub company_address: String,
    pub gst_number: String,
    pub pan_number: String,
    pub registration_certificate: Option<String>,
    pub gst_certificate: Option<String>,
}

impl SignupForm {
    /// Every field except the company address and documents is mandatory.
    pub fn is_complete(&self) -> bool {
        [
            &self.email,
            &self.password,
            &self.full_name,
            &self.phone,
            &self.company_name,
            &self.gst_number,
            &self.pan_number,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}
