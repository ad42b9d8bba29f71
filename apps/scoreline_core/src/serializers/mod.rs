pub mod result_lookup;
