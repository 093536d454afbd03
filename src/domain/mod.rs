// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Model
//!
//! Passive entity graph describing the fleet, populated by the loader and read
//! by the zone classifier.
//!
//! # Value Objects
//!
//! - [`Network`] / [`NetworkRole`] - networks declared for the run
//! - [`Netif`] - attachment of an equipment to a network, with its IP
//! - [`Category`] - equipment category (`server` or anything else)
//! - [`HostSet`] - expansion of compact host-set expressions
//!
//! # Entities and Aggregates
//!
//! - [`Equipment`] - identified by name, owns its netifs and profiles
//! - [`Cluster`] - keyed registry of equipment, iterated in name order
//! - [`Topology`] - network registry plus keyed registry of clusters

pub mod category;
pub mod cluster;
pub mod equipment;
pub mod hostset;
pub mod network;

pub use category::Category;
pub use cluster::{Cluster, Topology};
pub use equipment::{Equipment, RoleExtractionError, RoleExtractor};
pub use hostset::{HostSet, HostSetError};
pub use network::{Netif, NetifError, Network, NetworkRegistry, NetworkRole};
