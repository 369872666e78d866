//! Shared primitives for the huddle crates.
//!
//! - [`serial`] - MSB-first bit buffers and the [`serial::WriteTo`] / [`serial::ReadFrom`] traits
//! - [`locks`] - lock aliases used across the workspace

pub mod locks;
pub mod serial;
