//! Client for the counterfeit component detector backend.
//!
//! Polls live electrical readings of a chip under test, classifies them
//! with a threshold evaluator and falls back to synthetic data when the
//! backend is down. Also uploads images to the label and scratch
//! detection endpoints.

pub mod backend;
pub mod config;
pub mod detection;
pub mod evaluator;
pub mod mock;
pub mod monitor;
pub mod reading;
pub mod report;
