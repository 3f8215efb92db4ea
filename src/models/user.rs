use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Borrower {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO 3166 alpha-2, normalized at registration time.
    pub country: String,
    pub role: Role,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Borrower,
    Admin,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBorrower {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBorrower {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct BorrowerResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: BorrowerResponse,
    pub token: String,
}

/// JWT claims decoded by the auth middleware and threaded through handlers
/// as the authenticated-borrower context.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}
