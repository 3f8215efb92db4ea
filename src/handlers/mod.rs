pub mod admin;
pub mod auth;
pub mod confirmations;
pub mod payments;
pub mod receipts;
