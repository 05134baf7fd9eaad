//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway.

pub mod config;
pub mod login;
pub mod settings;
