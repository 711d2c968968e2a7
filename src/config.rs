//! Configuration data model for the DNS proxy.
//!
//! This module defines the persisted structure (environments holding
//! hostname overrides, the upstream DNS server list, and the active
//! environment pointer) along with the in-memory query and mutation
//! methods over it. Durability is handled by [`crate::store`].

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Single hostname-to-IP override stored inside an environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostnameMapping {
    /// The DNS name to override (exact match).
    pub hostname: String,

    /// The IPv4 address to answer with, as raw octets.
    pub ip: [u8; 4],

    /// Advisory time-to-live in seconds.
    pub ttl: u32,
}

impl HostnameMapping {
    /// Creates a new mapping.
    pub fn new(hostname: impl Into<String>, ip: Ipv4Addr, ttl: u32) -> Self {
        Self {
            hostname: hostname.into(),
            ip: ip.octets(),
            ttl,
        }
    }

    /// Returns the mapped address as an `Ipv4Addr`.
    pub fn ip_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.ip)
    }
}

/// Transport representation of a hostname mapping crossing the CRUD API
/// boundary.
///
/// Unlike the stored [`HostnameMapping`], a request names the environment
/// it targets. The target name is routing metadata only and is never
/// persisted inside the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingRequest {
    /// Name of the environment the mapping targets.
    pub env: String,

    /// The DNS name to override.
    pub hostname: String,

    /// The IPv4 address to answer with, as raw octets.
    pub ip: [u8; 4],

    /// Advisory time-to-live in seconds.
    pub ttl: u32,
}

impl MappingRequest {
    /// Strips the routing metadata, leaving the stored entity.
    pub fn into_mapping(self) -> HostnameMapping {
        HostnameMapping {
            hostname: self.hostname,
            ip: self.ip,
            ttl: self.ttl,
        }
    }
}

/// A named set of hostname overrides, selectable as active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Environment {
    /// Environment name. Uniqueness is not enforced; lookups return the
    /// first match.
    pub name: String,

    /// Hostname overrides, in insertion order.
    pub hostnames: Vec<HostnameMapping>,
}

impl Environment {
    /// Creates an empty environment with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostnames: Vec::new(),
        }
    }

    /// Finds the first mapping for `hostname`, with its index.
    pub fn find_hostname(&self, hostname: &str) -> Option<(&HostnameMapping, usize)> {
        self.hostnames
            .iter()
            .enumerate()
            .find(|(_, m)| m.hostname == hostname)
            .map(|(i, m)| (m, i))
    }
}

/// Root configuration structure.
///
/// Field names follow the persisted JSON layout: `remoteDnsServers`,
/// `envs`, `activeEnv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// Upstream resolver addresses, in fallback order.
    pub remote_dns_servers: Vec<[u8; 4]>,

    /// Environments, in insertion order.
    pub envs: Vec<Environment>,

    /// Name of the currently selected environment, or empty.
    pub active_env: String,
}

impl Configuration {
    /// Finds the first environment named `name`, with its index.
    pub fn find_env(&self, name: &str) -> Option<(&Environment, usize)> {
        self.envs
            .iter()
            .enumerate()
            .find(|(_, env)| env.name == name)
            .map(|(i, env)| (env, i))
    }

    /// The currently selected environment, if one matches the pointer.
    pub fn active_env(&self) -> Option<(&Environment, usize)> {
        self.find_env(&self.active_env)
    }

    /// Upstream resolver addresses as `Ipv4Addr`s, in fallback order.
    pub fn dns_servers(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.remote_dns_servers.iter().copied().map(Ipv4Addr::from)
    }

    /// Appends an environment. Duplicate names are not rejected; lookups
    /// return the first match.
    pub fn add_env(&mut self, env: Environment) {
        self.envs.push(env);
    }

    /// Removes the environment at `index`.
    pub fn remove_env(&mut self, index: usize) -> Result<Environment> {
        check_index(index, self.envs.len())?;
        Ok(self.envs.remove(index))
    }

    /// Appends an upstream DNS server address.
    pub fn add_dns_server(&mut self, addr: Ipv4Addr) {
        self.remote_dns_servers.push(addr.octets());
    }

    /// Removes the upstream DNS server at `index`.
    pub fn remove_dns_server(&mut self, index: usize) -> Result<Ipv4Addr> {
        check_index(index, self.remote_dns_servers.len())?;
        Ok(Ipv4Addr::from(self.remote_dns_servers.remove(index)))
    }

    /// Appends a mapping to the environment named `env_name`.
    pub fn add_hostname(&mut self, env_name: &str, mapping: HostnameMapping) -> Result<()> {
        let env = self
            .envs
            .iter_mut()
            .find(|env| env.name == env_name)
            .ok_or_else(|| StoreError::env_not_found(env_name))?;
        env.hostnames.push(mapping);
        Ok(())
    }

    /// Removes the first mapping for `hostname` from the environment
    /// named `env_name`.
    pub fn remove_hostname_by_name(
        &mut self,
        env_name: &str,
        hostname: &str,
    ) -> Result<HostnameMapping> {
        let (env, env_index) = self
            .find_env(env_name)
            .ok_or_else(|| StoreError::env_not_found(env_name))?;
        let (_, host_index) = env
            .find_hostname(hostname)
            .ok_or_else(|| StoreError::hostname_not_found(env_name, hostname))?;
        self.remove_hostname(env_index, host_index)
    }

    /// Removes the mapping at `host_index` inside the environment at
    /// `env_index`.
    pub fn remove_hostname(&mut self, env_index: usize, host_index: usize) -> Result<HostnameMapping> {
        check_index(env_index, self.envs.len())?;
        let env = &mut self.envs[env_index];
        check_index(host_index, env.hostnames.len())?;
        Ok(env.hostnames.remove(host_index))
    }

    /// Points the active environment at `name`, which must exist.
    pub fn set_active_env(&mut self, name: &str) -> Result<()> {
        if self.find_env(name).is_none() {
            return Err(StoreError::env_not_found(name));
        }
        self.active_env = name.to_string();
        Ok(())
    }

    /// Injects the default environment when none exist, so a persisted
    /// configuration always names at least one environment.
    pub(crate) fn ensure_default_env(&mut self) {
        if self.envs.is_empty() {
            self.envs.push(Environment::default());
        }
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(StoreError::IndexOutOfRange { index, len });
    }
    Ok(())
}
