pub mod backup;
pub mod finance;
pub mod installations;
pub mod inventory;
pub mod products;
pub mod quotes;
pub mod reports;
pub mod settings;
