pub mod models;
pub mod scoring;
