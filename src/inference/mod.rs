//! External diagnosis model.
//!
//! This module provides the client that sends leaf images to a vision model.

pub mod client;

pub use client::{DiagnosisClient, InferenceConfig};
