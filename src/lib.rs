//! Entrata Lead Webhook Library
//!
//! Receives lead-capture form submissions, maps them onto the Entrata leads
//! API schema and forwards them with the configured authentication style.
//!
//! # Modules
//!
//! - `auth`: Auth-mode selection and the payload auth block.
//! - `config`: Configuration management.
//! - `entrata_client`: Entrata leads API client and response classification.
//! - `entrata_models`: Entrata request payload types and builder.
//! - `errors`: Error handling types.
//! - `forwarder`: Resolve, validate, build and send workflow.
//! - `handlers`: HTTP request handlers and router.
//! - `lead_models`: Incoming lead, field aliases and validation.
//! - `normalize`: Date, opt-in and timestamp normalization.

pub mod auth;
pub mod config;
pub mod entrata_client;
pub mod entrata_models;
pub mod errors;
pub mod forwarder;
pub mod handlers;
pub mod lead_models;
pub mod normalize;
