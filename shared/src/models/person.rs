//! Person Model
//!
//! One record per registered participant, partitioned by role into three
//! tables (`person_farmer`, `person_buyer`, `person_admin`). Phone, aadhar
//! and email are unique across all three partitions.

use serde::{Deserialize, Serialize};

/// Participant role. Also selects the backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Buyer,
    Admin,
}

impl Role {
    /// Fixed scan order for cross-role lookups.
    pub const SCAN_ORDER: [Role; 3] = [Role::Farmer, Role::Buyer, Role::Admin];

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            Role::Farmer => "person_farmer",
            Role::Buyer => "person_buyer",
            Role::Admin => "person_admin",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Buyer => "buyer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "farmer" => Some(Role::Farmer),
            "buyer" => Some(Role::Buyer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Person entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub aadhar: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    /// Preferred notification locale code ("en", "hi", "kn").
    pub language: Option<String>,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub role: Role,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub aadhar: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub language: Option<String>,
}

/// Profile update payload (partial; only supplied fields change)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub aadhar: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub language: Option<String>,
}
