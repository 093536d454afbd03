// Copyright (c) 2025 - Cowboy AI, Inc.
//! Equipment Entity
//!
//! An equipment is identified by its name alone. It is created by the
//! inventory ingestion and enriched once by the hieradata ingestion; after
//! loading it is only read.

use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Category, Netif, NetifError, Network, NetworkRole};

/// Role extraction error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleExtractionError {
    #[error("unable to extract role from equipment name {name} (cluster prefix {prefix})")]
    NoMatch { name: String, prefix: String },

    #[error("invalid cluster prefix {0:?}")]
    InvalidPrefix(String),
}

/// Extracts server roles from names following `<prefix><role>[<digits>]`
///
/// The role is a run of lowercase letters and digits that starts and ends with
/// a letter, so it never looks purely numeric: with prefix `ge`, `gesrv01`
/// has role `srv` and `gecn12` has role `cn`.
#[derive(Debug, Clone)]
pub struct RoleExtractor {
    prefix: String,
    pattern: Regex,
}

impl RoleExtractor {
    pub fn new(prefix: &str) -> Result<Self, RoleExtractionError> {
        let pattern = Regex::new(&format!(
            r"^{}([a-z](?:[a-z0-9]*[a-z])?)[0-9]*",
            regex::escape(prefix)
        ))
        .map_err(|_| RoleExtractionError::InvalidPrefix(prefix.to_string()))?;

        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn extract(&self, name: &str) -> Result<String, RoleExtractionError> {
        self.pattern
            .captures(name)
            .and_then(|captures| captures.get(1))
            .map(|role| role.as_str().to_string())
            .ok_or_else(|| RoleExtractionError::NoMatch {
                name: name.to_string(),
                prefix: self.prefix.clone(),
            })
    }
}

/// A piece of equipment of one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equipment {
    name: String,
    fqdn: Option<String>,
    category: Category,
    model: Option<String>,
    role: Option<String>,
    profiles: Option<Vec<String>>,
    netifs: Vec<Netif>,
}

impl Equipment {
    pub fn new(name: impl Into<String>, category: impl Into<Category>) -> Self {
        Self {
            name: name.into(),
            fqdn: None,
            category: category.into(),
            model: None,
            role: None,
            profiles: None,
            netifs: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_profiles(profiles.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fqdn(&self) -> Option<&str> {
        self.fqdn.as_deref()
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn is_server(&self) -> bool {
        self.category.is_server()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn profiles(&self) -> Option<&[String]> {
        self.profiles.as_deref()
    }

    pub fn netifs(&self) -> &[Netif] {
        &self.netifs
    }

    pub fn set_fqdn(&mut self, fqdn: impl Into<String>) {
        self.fqdn = Some(fqdn.into());
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model;
    }

    pub fn set_profiles(&mut self, profiles: Vec<String>) {
        debug!("equipment {} profiles: {:?}", self.name, profiles);
        self.profiles = Some(profiles);
    }

    /// Derive and store the role of this equipment from its name
    pub fn extract_role(&mut self, extractor: &RoleExtractor) -> Result<&str, RoleExtractionError> {
        let role = extractor.extract(&self.name)?;
        debug!("role of {} is {}", self.name, role);
        Ok(self.role.insert(role).as_str())
    }

    /// Attach this equipment to a network
    ///
    /// # Invariant
    /// - At most one netif per network role; a second attachment on the same
    ///   role is rejected and the first one kept.
    pub fn add_netif(&mut self, network: Arc<Network>, ip: impl Into<String>) -> Result<(), NetifError> {
        let role = network.role();
        if self.netifs.iter().any(|netif| netif.role() == role) {
            return Err(NetifError::DuplicateRole {
                equipment: self.name.clone(),
                role,
            });
        }
        self.netifs.push(Netif::new(network, ip));
        Ok(())
    }

    /// IP address of the netif on the network playing `role`
    pub fn ip_on(&self, role: NetworkRole) -> Option<&str> {
        self.netifs
            .iter()
            .find(|netif| netif.role() == role)
            .map(Netif::ip)
    }

    /// True when the profile list intersects `profiles`
    pub fn has_profile<S: AsRef<str>>(&self, profiles: &[S]) -> bool {
        match &self.profiles {
            Some(own) => own
                .iter()
                .any(|profile| profiles.iter().any(|p| p.as_ref() == profile)),
            None => false,
        }
    }

    /// True when attached to at least one network and only to `wan` networks
    pub fn wan_connected_only(&self) -> bool {
        if self.netifs.is_empty() {
            warn!("equipment {} is not connected to any network", self.name);
            return false;
        }
        self.netifs.iter().all(|netif| netif.role() == NetworkRole::Wan)
    }
}
