//! Durable storage for the proxy configuration.
//!
//! This module owns the JSON codec, the configuration file on disk, and
//! the [`ConfigStore`] handle that serializes all access through an
//! internal lock. The store is loaded (or bootstrapped) once at startup;
//! every mutation rewrites the full file before the lock is released, so
//! the on-disk snapshot never lags a concurrent in-memory change.

use crate::config::{Configuration, Environment, HostnameMapping, MappingRequest};
use crate::error::{Result, StoreError};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Default configuration file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "conf/config.json";

/// Decodes a configuration from raw JSON bytes.
///
/// Unknown fields are ignored, so files written by older versions (which
/// carried a transport `env` field inside each hostname entry) still
/// load. Missing fields fall back to empty sequences and an empty
/// active-environment name.
pub fn decode(bytes: &[u8]) -> Result<Configuration> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::decode(e.to_string()))
}

/// Encodes a configuration to JSON bytes, fields in declaration order.
pub fn encode(config: &Configuration) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(config).map_err(|e| StoreError::decode(e.to_string()))
}

/// Reads the raw file content, or `None` if the file does not exist.
pub fn load(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes the full configuration to `path`, truncating any previous
/// content. The write is buffered and flushed before returning.
pub fn write(path: &Path, config: &Configuration) -> Result<()> {
    let bytes = encode(config)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(())
}

/// Creates the parent directory of the configuration file so a fresh
/// file can be written there.
fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Thread-safe handle to the persisted configuration.
///
/// Constructed once at startup and shared by reference (or `Arc`) with
/// every consumer: the DNS resolution path reads it, the management API
/// mutates it. Mutating operations apply the in-memory change and
/// persist the whole configuration while still holding the write lock.
#[derive(Debug)]
pub struct ConfigStore {
    /// Current configuration.
    config: RwLock<Configuration>,

    /// Path of the persisted file.
    path: PathBuf,
}

impl ConfigStore {
    /// Opens the store at `path`, loading the existing file or
    /// bootstrapping a fresh one.
    ///
    /// A missing file is created (together with its parent directory)
    /// with the default content: no servers, a single environment with
    /// an empty name, no active environment. A malformed existing file
    /// is an error, never a silent reset.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let config = match load(&path)? {
            Some(bytes) => {
                info!(path = %path.display(), "Loading configuration");
                decode(&bytes)?
            }
            None => {
                info!(path = %path.display(), "Configuration file absent, bootstrapping");
                create_parent_dir(&path)?;
                Configuration::default()
            }
        };

        let store = Self {
            config: RwLock::new(config),
            path,
        };

        // The initial save normalizes whatever was loaded: the default
        // environment is injected and stale transport fields are dropped.
        {
            let mut config = store.config.write().unwrap();
            store.persist(&mut config)?;
        }

        Ok(store)
    }

    /// Opens the store at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_CONFIG_PATH)
    }

    /// Path of the persisted file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a clone of the current configuration.
    pub fn snapshot(&self) -> Configuration {
        self.config.read().unwrap().clone()
    }

    /// Finds the first environment named `name`, with its index.
    pub fn find_env(&self, name: &str) -> Option<(Environment, usize)> {
        let config = self.config.read().unwrap();
        config.find_env(name).map(|(env, i)| (env.clone(), i))
    }

    /// The currently selected environment, if one matches the pointer.
    pub fn active_env(&self) -> Option<(Environment, usize)> {
        let config = self.config.read().unwrap();
        config.active_env().map(|(env, i)| (env.clone(), i))
    }

    /// Finds the first mapping for `hostname` inside the environment
    /// named `env_name`, with its index in that environment.
    pub fn find_hostname(&self, env_name: &str, hostname: &str) -> Option<(HostnameMapping, usize)> {
        let config = self.config.read().unwrap();
        let (env, _) = config.find_env(env_name)?;
        env.find_hostname(hostname).map(|(m, i)| (m.clone(), i))
    }

    /// Appends an environment and persists. Duplicate names are not
    /// rejected; lookups return the first match.
    pub fn add_env(&self, env: Environment) -> Result<()> {
        info!(name = %env.name, "Adding environment");
        let mut config = self.config.write().unwrap();
        config.add_env(env);
        self.persist(&mut config)
    }

    /// Removes the environment at `index` and persists.
    ///
    /// Indices come from a prior lookup; any other removal invalidates
    /// them.
    pub fn remove_env(&self, index: usize) -> Result<()> {
        let mut config = self.config.write().unwrap();
        let removed = config.remove_env(index)?;
        info!(name = %removed.name, index, "Removed environment");
        self.persist(&mut config)
    }

    /// Appends an upstream DNS server and persists.
    pub fn add_dns_server(&self, addr: Ipv4Addr) -> Result<()> {
        info!(addr = %addr, "Adding remote DNS server");
        let mut config = self.config.write().unwrap();
        config.add_dns_server(addr);
        self.persist(&mut config)
    }

    /// Removes the upstream DNS server at `index` and persists.
    pub fn remove_dns_server(&self, index: usize) -> Result<()> {
        let mut config = self.config.write().unwrap();
        let removed = config.remove_dns_server(index)?;
        info!(addr = %removed, index, "Removed remote DNS server");
        self.persist(&mut config)
    }

    /// Appends the requested mapping to its target environment and
    /// persists. Fails if the environment does not exist.
    pub fn add_hostname(&self, request: MappingRequest) -> Result<()> {
        info!(env = %request.env, hostname = %request.hostname, "Adding hostname");
        let mut config = self.config.write().unwrap();
        let env_name = request.env.clone();
        config.add_hostname(&env_name, request.into_mapping())?;
        self.persist(&mut config)
    }

    /// Removes the first mapping for `hostname` from the environment
    /// named `env_name` and persists.
    pub fn remove_hostname_by_name(&self, env_name: &str, hostname: &str) -> Result<()> {
        let mut config = self.config.write().unwrap();
        config.remove_hostname_by_name(env_name, hostname)?;
        info!(env = %env_name, hostname = %hostname, "Removed hostname");
        self.persist(&mut config)
    }

    /// Removes the mapping at `host_index` inside the environment at
    /// `env_index` and persists.
    pub fn remove_hostname(&self, env_index: usize, host_index: usize) -> Result<()> {
        let mut config = self.config.write().unwrap();
        let removed = config.remove_hostname(env_index, host_index)?;
        info!(hostname = %removed.hostname, env_index, host_index, "Removed hostname");
        self.persist(&mut config)
    }

    /// Points the active environment at `name` and persists. Fails if
    /// the environment does not exist.
    pub fn set_active_env(&self, name: &str) -> Result<()> {
        info!(name = %name, "Switching active environment");
        let mut config = self.config.write().unwrap();
        config.set_active_env(name)?;
        self.persist(&mut config)
    }

    /// Re-encodes and rewrites the whole file. Callers hold the write
    /// lock for the duration, so concurrent mutations cannot interleave
    /// between the in-memory change and the on-disk snapshot.
    fn persist(&self, config: &mut Configuration) -> Result<()> {
        config.ensure_default_env();
        write(&self.path, config)?;
        debug!(path = %self.path.display(), "Configuration persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ConfigStore {
        ConfigStore::open(dir.join("conf/config.json")).unwrap()
    }

    #[test]
    fn test_bootstrap_creates_parent_and_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf/config.json");
        assert!(!path.exists());

        let store = store_in(dir.path());
        assert!(path.exists());

        let config = store.snapshot();
        assert!(config.remote_dns_servers.is_empty());
        assert_eq!(config.envs.len(), 1);
        assert_eq!(config.envs[0].name, "");
        assert!(config.envs[0].hostnames.is_empty());
        assert_eq!(config.active_env, "");
    }

    #[test]
    fn test_open_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();

        let err = ConfigStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let config = decode(b"{}").unwrap();
        assert!(config.remote_dns_servers.is_empty());
        assert!(config.envs.is_empty());
        assert_eq!(config.active_env, "");
    }

    #[test]
    fn test_decode_ignores_legacy_transport_field() {
        let legacy = br#"{
            "remoteDnsServers": [[8, 8, 8, 8]],
            "envs": [
                {
                    "name": "prod",
                    "hostnames": [
                        {"hostname": "api.local", "ip": [10, 0, 0, 5], "ttl": 300, "env": "stale"}
                    ]
                }
            ],
            "activeEnv": "prod"
        }"#;

        let config = decode(legacy).unwrap();
        assert_eq!(config.envs[0].hostnames[0].ip, [10, 0, 0, 5]);
        assert_eq!(config.active_env, "prod");

        // Re-encoding does not carry the transport field forward.
        let bytes = encode(&config).unwrap();
        assert!(!String::from_utf8(bytes).unwrap().contains("stale"));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let config = Configuration {
            remote_dns_servers: vec![[8, 8, 8, 8], [1, 1, 1, 1]],
            envs: vec![Environment {
                name: "prod".to_string(),
                hostnames: vec![HostnameMapping::new(
                    "api.local",
                    Ipv4Addr::new(10, 0, 0, 5),
                    300,
                )],
            }],
            active_env: "prod".to_string(),
        };

        let decoded = decode(&encode(&config).unwrap()).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = store_in(dir.path());
            store.add_env(Environment::new("prod")).unwrap();
            store
                .add_hostname(MappingRequest {
                    env: "prod".to_string(),
                    hostname: "api.local".to_string(),
                    ip: [10, 0, 0, 5],
                    ttl: 300,
                })
                .unwrap();
            store.add_dns_server(Ipv4Addr::new(8, 8, 8, 8)).unwrap();
            store.set_active_env("prod").unwrap();
        }

        let store = store_in(dir.path());
        let (mapping, index) = store.find_hostname("prod", "api.local").unwrap();
        assert_eq!(index, 0);
        assert_eq!(mapping.ip, [10, 0, 0, 5]);
        assert_eq!(mapping.ttl, 300);

        let (env, _) = store.active_env().unwrap();
        assert_eq!(env.name, "prod");
        assert_eq!(store.snapshot().remote_dns_servers, vec![[8, 8, 8, 8]]);
    }

    #[test]
    fn test_save_then_load_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        {
            let store = ConfigStore::open(&path).unwrap();
            store.add_env(Environment::new("prod")).unwrap();
        }
        let first = fs::read(&path).unwrap();

        // Reopening rewrites the file; content must not drift.
        ConfigStore::open(&path).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_mutation_does_not_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let store = ConfigStore::open(&path).unwrap();
        store.add_env(Environment::new("prod")).unwrap();
        let before = fs::read(&path).unwrap();

        assert!(store.remove_env(10).is_err());
        assert!(store
            .add_hostname(MappingRequest {
                env: "missing".to_string(),
                hostname: "x".to_string(),
                ip: [1, 1, 1, 1],
                ttl: 60,
            })
            .is_err());

        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(store.snapshot().envs.len(), 2);
    }

    #[test]
    fn test_empty_config_persists_default_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let store = ConfigStore::open(&path).unwrap();
        // The bootstrapped file holds the injected environment, and the
        // last one cannot be removed without it coming back.
        store.remove_env(0).unwrap();

        let config = decode(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(config.envs.len(), 1);
        assert_eq!(config.envs[0].name, "");
    }

    #[test]
    fn test_concurrent_mutations_are_serialized() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let store = Arc::new(ConfigStore::open(dir.path().join("config.json")).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..10 {
                        store.add_dns_server(Ipv4Addr::new(10, 0, i, j)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let config = store.snapshot();
        assert_eq!(config.remote_dns_servers.len(), 40);

        // The on-disk snapshot matches the in-memory state.
        let on_disk = decode(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, config);
    }
}
