pub mod app;
pub mod catalog;
pub mod db;
pub mod filter;
pub mod import;
pub mod models;
pub mod notifications;
pub mod nutrients;
pub mod selection;
pub mod store;
