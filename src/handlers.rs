pub mod health;
pub mod profiles;
pub mod relationships;
pub mod reports;
pub mod users;
