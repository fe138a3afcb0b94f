//! Forwarder router: rewrites `fwdDest` per a per-forwarder policy and
//! hands the envelope off to a peer endpoint.
//!
//! The omitted-policy default splits two ways: a *named* forwarder with no
//! explicit policy defaults to delivering locally at the peer
//! (`Rewrite(None)`), since a named forwarder models the terminal hop of one
//! specific route. The wildcard forwarder (`"*"`) defaults to pass-through,
//! since its entire purpose is relaying whatever didn't match a more
//! specific route without assuming anything about it.

use std::collections::HashMap;

use crate::endpoint::Endpoint;

pub(crate) const WILDCARD: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ForwardPolicy {
    PassThrough,
    Rewrite(Option<String>),
}

impl ForwardPolicy {
    pub(crate) fn from_registration(name: &str, fwd_dest: Option<String>) -> Self {
        match fwd_dest {
            Some(ref dest) if dest == WILDCARD => ForwardPolicy::PassThrough,
            Some(dest) if dest.is_empty() => ForwardPolicy::Rewrite(None),
            Some(dest) => ForwardPolicy::Rewrite(Some(dest)),
            None if name == WILDCARD => ForwardPolicy::PassThrough,
            None => ForwardPolicy::Rewrite(None),
        }
    }

    pub(crate) fn rewrite(&self, original: Option<&str>) -> Option<String> {
        match self {
            ForwardPolicy::PassThrough => original.map(str::to_string),
            ForwardPolicy::Rewrite(dest) => dest.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ForwarderRecord {
    pub peer: Endpoint,
    pub policy: ForwardPolicy,
}

#[derive(Default)]
pub(crate) struct ForwarderRegistry {
    forwarders: HashMap<String, ForwarderRecord>,
}

impl ForwarderRegistry {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.forwarders.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: String, record: ForwarderRecord) {
        self.forwarders.insert(name, record);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.forwarders.remove(name);
    }

    /// Resolves the forwarder that should handle `fwd_dest`: an exact match
    /// first, then the wildcard `"*"` if registered.
    pub(crate) fn resolve(&self, fwd_dest: &str) -> Option<&ForwarderRecord> {
        self.forwarders
            .get(fwd_dest)
            .or_else(|| self.forwarders.get(WILDCARD))
    }
}
