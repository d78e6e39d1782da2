//! EventLab Core: event model, data feed, portfolio, execution, orchestrator, analytics.
//!
//! This crate contains the whole simulation pipeline:
//! - Domain types (bars, market/signal/order/fill events)
//! - Data handler contract and the historical CSV implementation
//! - Strategy contract with two reference strategies
//! - Simulated execution (commission, slippage, liquidity, limit orders)
//! - Fixed-lot portfolio with mark-to-market holdings history
//! - Single-threaded per-bar event loop with cooperative cancellation
//! - Pure performance analytics over the derived equity curve

pub mod analytics;
pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod portfolio;
pub mod strategy;
