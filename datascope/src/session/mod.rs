pub mod account;
pub mod extract;
pub mod instruments;
pub mod templates;
