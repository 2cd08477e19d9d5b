//! Arithmetic expression evaluator with an HTTP JSON front door.
//!
//! The evaluator in [`calc_engine`] handles `+ - * /`, parentheses,
//! decimal literals and unary minus, and reports failures through the
//! closed [`CalcError`] enum. [`server`] exposes it as `POST /calculate`.

pub mod calc_engine;
pub mod config;
pub mod display;
pub mod logging;
pub mod server;

pub use calc_engine::{evaluate, evaluate_traced, CalcError, EvaluationTrace};
