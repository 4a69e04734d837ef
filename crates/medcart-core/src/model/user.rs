use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Doctor,
    PharmacyAdmin,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
}

/// Body of a successful login response.
#[derive(Debug, Deserialize)]
pub struct AuthToken {
    #[serde(alias = "access_token")]
    pub token: SecretString,
    #[serde(default)]
    pub user: Option<User>,
}
