//! # Service Layer

pub mod catalog_service;

pub use catalog_service::*;

#[cfg(test)]
mod tests;
