pub mod assessments;
pub mod auth;
pub mod companies;
pub mod health;
pub mod reports;
