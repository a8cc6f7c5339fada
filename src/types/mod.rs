// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes resource views used by the unsealer.

pub mod pod;

pub use pod::{OpenBaoPod, PodKey};
