// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Unseal state machine and the engine driving it.

pub mod decision;
pub mod engine;

pub use decision::{decide, Decision, Observation};
pub use engine::{Outcome, UnsealEngine};
