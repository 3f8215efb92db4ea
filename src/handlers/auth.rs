use axum::{
    extract::State,
    response::Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use jsonwebtoken::{encode, EncodingKey, Header};
use chrono::Utc;
use mongodb::Collection;
use mongodb::bson::{doc, oid::ObjectId};

use crate::state::AppState;
use crate::errors::{AppError, Result};
use crate::models::user::{
    AuthResponse, Borrower, BorrowerResponse, Claims, LoginBorrower, RegisterBorrower, Role,
};
use crate::services::method_gateway::normalize_country;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterBorrower>,
) -> Result<Json<AuthResponse>> {
    let collection: Collection<Borrower> = state.db.collection("borrowers");

    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::invalid_data("a valid email address is required"));
    }
    if payload.password.len() < 8 {
        return Err(AppError::invalid_data("password must be at least 8 characters"));
    }

    let email = payload.email.trim().to_ascii_lowercase();
    let existing = collection.find_one(doc! { "email": &email }).await?;
    if existing.is_some() {
        return Err(AppError::invalid_data("an account with this email already exists"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|_| AppError::AuthError)?;

    let borrower_id = ObjectId::new();
    let borrower = Borrower {
        _id: Some(borrower_id),
        email: email.clone(),
        password_hash,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        country: normalize_country(&payload.country),
        role: Role::Borrower,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    collection.insert_one(&borrower).await?;

    let token = issue_token(&state.config.jwt_secret, &borrower)?;

    Ok(Json(AuthResponse {
        user: borrower_response(&borrower),
        token,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginBorrower>,
) -> Result<Json<AuthResponse>> {
    let collection: Collection<Borrower> = state.db.collection("borrowers");

    let email = payload.email.trim().to_ascii_lowercase();
    let borrower = collection
        .find_one(doc! { "email": &email })
        .await?
        .ok_or(AppError::AuthError)?;

    let valid = verify(&payload.password, &borrower.password_hash)
        .map_err(|_| AppError::AuthError)?;
    if !valid {
        return Err(AppError::AuthError);
    }

    let token = issue_token(&state.config.jwt_secret, &borrower)?;

    Ok(Json(AuthResponse {
        user: borrower_response(&borrower),
        token,
    }))
}

fn issue_token(secret: &str, borrower: &Borrower) -> Result<String> {
    let claims = Claims {
        sub: borrower._id.map(|id| id.to_hex()).unwrap_or_default(),
        email: borrower.email.clone(),
        role: borrower.role,
        exp: (Utc::now().timestamp() + 86400) as usize, // 24 hours
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|_| AppError::AuthError)
}

fn borrower_response(borrower: &Borrower) -> BorrowerResponse {
    BorrowerResponse {
        id: borrower._id.map(|id| id.to_hex()).unwrap_or_default(),
        email: borrower.email.clone(),
        first_name: borrower.first_name.clone(),
        last_name: borrower.last_name.clone(),
        country: borrower.country.clone(),
    }
}
