//! Fork tests.
//!
//! - Service tests: fetch, select, remap and save through a store
//! - Property tests: selector and remap invariants over random forests

mod service;
