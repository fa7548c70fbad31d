//! Integration test modules

mod balance;
mod cli;
mod knowledge;
mod store;
mod trackers;
mod verification;
