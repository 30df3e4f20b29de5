pub mod api;
pub mod connectivity;
pub mod database;
