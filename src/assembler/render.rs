// Copyright (c) 2025 - Cowboy AI, Inc.
//! Zone Configuration Rendering
//!
//! Each zone produces two files:
//!
//! - `hosts.conf` from every host of the zone
//! - `zones.conf` from the zone servers and the parent zone name
//!
//! [`HandlebarsRenderer`] loads `hosts.conf.hbs` and `zones.conf.hbs` from a
//! templates directory. Output is plain text, so HTML escaping is disabled.

use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::classifier::{HostEntry, ZoneHosts};
use crate::errors::{SyncError, SyncResult};

/// Name of the hosts file of a zone
pub const HOSTS_FILE: &str = "hosts.conf";

/// Name of the zone tree file of a zone
pub const ZONES_FILE: &str = "zones.conf";

/// Template file extension
pub const TEMPLATE_EXTENSION: &str = "hbs";

/// Turns classified zones into configuration text
pub trait ZoneRenderer {
    fn render_hosts(&self, zone: &ZoneHosts) -> SyncResult<String>;

    fn render_zones(&self, zone: &ZoneHosts) -> SyncResult<String>;
}

#[derive(Serialize)]
struct HostsContext<'a> {
    hosts: &'a [HostEntry],
}

#[derive(Serialize)]
struct ZonesContext<'a> {
    hosts: &'a [HostEntry],
    parent: &'a str,
}

/// Handlebars-backed renderer
pub struct HandlebarsRenderer {
    handlebars: Handlebars<'static>,
}

impl HandlebarsRenderer {
    fn engine() -> Handlebars<'static> {
        let mut hb = Handlebars::new();
        hb.register_escape_fn(handlebars::no_escape);
        hb
    }

    /// Load `hosts.conf.hbs` and `zones.conf.hbs` from `dir`
    pub fn from_dir(dir: &Path) -> SyncResult<Self> {
        let mut hb = Self::engine();
        for name in [HOSTS_FILE, ZONES_FILE] {
            let path = dir.join(format!("{name}.{TEMPLATE_EXTENSION}"));
            debug!("loading template {}", path.display());
            hb.register_template_file(name, &path)
                .map_err(|e| SyncError::Render(format!("{}: {}", path.display(), e)))?;
        }
        Ok(Self { handlebars: hb })
    }

    /// Build a renderer from in-memory templates
    pub fn from_strings(hosts: &str, zones: &str) -> SyncResult<Self> {
        let mut hb = Self::engine();
        hb.register_template_string(HOSTS_FILE, hosts)?;
        hb.register_template_string(ZONES_FILE, zones)?;
        Ok(Self { handlebars: hb })
    }
}

impl ZoneRenderer for HandlebarsRenderer {
    fn render_hosts(&self, zone: &ZoneHosts) -> SyncResult<String> {
        let context = HostsContext { hosts: &zone.hosts };
        Ok(self.handlebars.render(HOSTS_FILE, &context)?)
    }

    fn render_zones(&self, zone: &ZoneHosts) -> SyncResult<String> {
        let context = ZonesContext {
            hosts: &zone.servers,
            parent: zone.zone.name(),
        };
        Ok(self.handlebars.render(ZONES_FILE, &context)?)
    }
}
