pub mod data;
pub mod not_found;
