// Copyright (c) 2025 - Cowboy AI, Inc.
//! Monitoring synchronization for HPC cluster fleets
//!
//! Resolves the fleet topology from two declarative sources, an equipment
//! inventory and per-cluster hieradata, then decides for every equipment
//! whether the central `master` zone or its cluster's satellite zone monitors
//! it.
//!
//! # Architecture
//!
//! ```text
//! inventory + hieradata ──> loader ──> Topology ──> classifier ──> ZoneHosts
//!                                         │                           │
//!                                         ▼                           ▼
//!                                    certs (PKI)                assembler
//!                                                    (render, stage, diff, deploy)
//! ```
//!
//! The topology is built once per run, passed explicitly between stages and
//! never mutated after loading.

pub mod app;
pub mod assembler;
pub mod certs;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod errors;
pub mod loader;

pub use app::{Action, App};
pub use classifier::{HostEntry, Zone, ZoneClassifier, ZoneHosts};
pub use config::RunConfig;
pub use domain::{Cluster, Equipment, Topology};
pub use errors::{SyncError, SyncResult};
pub use loader::TopologyLoader;
