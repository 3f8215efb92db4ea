pub mod application;
pub mod confirmation;
pub mod payment;
pub mod scheme;
pub mod user;
