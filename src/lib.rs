//! Library crate for crossword-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod layout;
mod progress;
pub mod routes;
pub mod services;
pub mod state;
