// Copyright (c) 2025 - Cowboy AI, Inc.
//! Equipment Category
//!
//! The inventory names categories freely (one file per category), but only
//! `server` carries behavior: role extraction, profiles, BMC attachments and
//! certificates. Every other category is kept verbatim for output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Equipment category taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Server (has a role, profiles and possibly a BMC)
    Server,
    /// Any other equipment (switch, pdu, storage controller...)
    Other(String),
}

impl Category {
    pub const SERVER: &'static str = "server";

    pub fn as_str(&self) -> &str {
        match self {
            Self::Server => Self::SERVER,
            Self::Other(name) => name,
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        if s == Self::SERVER {
            Self::Server
        } else {
            Self::Other(s.to_string())
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        if s == Self::SERVER {
            Self::Server
        } else {
            Self::Other(s)
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Server => Category::SERVER.to_string(),
            Category::Other(name) => name,
        }
    }
}
