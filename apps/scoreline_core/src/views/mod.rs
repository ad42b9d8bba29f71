pub mod health;
pub mod result_lookup;
