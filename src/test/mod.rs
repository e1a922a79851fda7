//! Shared fixtures for the unit tests of the crate.

pub(crate) mod factories;
