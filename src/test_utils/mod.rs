//! Shared test helpers: configurations, fixtures and mock adapters.

#![cfg(test)]

pub mod config;
pub mod fixtures;
pub mod html;
pub mod mocks;
