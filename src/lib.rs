//! Song of the Week backend: weekly song submission, anonymized surveys, voting and
//! guessing, exposed as modules for the binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod music;
pub mod routes;
pub mod services;
pub mod state;
