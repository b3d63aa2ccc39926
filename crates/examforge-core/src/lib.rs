//! examforge-core — Blueprint validation, pool normalization, and seeded test assembly.
//!
//! A blueprint describes the shape of a mock test: sections, topic quotas
//! and a difficulty distribution. Question pools are loaded from JSON
//! sources and normalized into a [`catalog::PoolCatalog`]. The
//! [`engine::TestAssembler`] turns a validated blueprint into a
//! [`report::GeneratedTest`], drawing questions with an RNG seeded from the
//! test id so identical inputs always produce the identical test.

pub mod allocation;
pub mod audit;
pub mod blueprint;
pub mod catalog;
pub mod composite;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod report;
pub mod rng;
pub mod selector;
pub mod statistics;
pub mod traits;
pub mod validator;
