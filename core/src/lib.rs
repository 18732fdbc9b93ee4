pub mod credentials;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod service;
