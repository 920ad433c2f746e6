pub mod catalog;
pub mod days;
pub mod meals;
pub mod migrate;
pub mod models;
pub mod nutrition;
pub mod service;
pub mod store;
