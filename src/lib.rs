pub mod analytics;
pub mod analyzer;
pub mod api;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod data_models;
pub mod db;
pub mod filter;
pub mod geo;
pub mod parser;
pub mod pricing;
pub mod query_engine;
