//! User record types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identity provider a user signed in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Github,
}

impl AccountType {
    pub const ALL: [AccountType; 1] = [AccountType::Github];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Github => "github",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown account type: {0}")]
pub struct UnknownAccountType(pub String);

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownAccountType(s.to_string()))
    }
}

/// A user row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Subject id from the identity provider
    pub id: String,
    pub email: String,
    /// Opaque sync payload, empty until first upload
    pub data: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Epoch ms of first sign-in; never changes
    pub created: i64,
    /// Epoch ms of the last mutation
    pub updated: i64,
}

/// The sync payload of a user together with its write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub data: String,
    pub updated: i64,
}
