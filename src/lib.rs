//! Robix - a local-first question answering assistant.
//!
//! Questions are answered from a persistent knowledge cache, optionally
//! supplemented by web retrieval, and phrased by a generative backend when one
//! is reachable.

pub mod ai;
pub mod config;
pub mod display;
pub mod knowledge;
pub mod pipeline;
pub mod web;
