//! Infrastructure adapters for the back-office module.

pub mod rest;

pub use rest::RestBackoffice;
