//! NVS (Non-Volatile Storage) adapter.
//!
//! One adapter serves both persistence ports:
//!
//! | Port          | Namespace | Key      | Value                      |
//! |---------------|-----------|----------|----------------------------|
//! | `ConfigPort`  | `solmate` | `syscfg` | postcard `SystemConfig`    |
//! | `StoragePort` | any       | any      | raw blob (owner number, …) |
//!
//! Both go through the same three blob primitives (`get`, `put`,
//! `erase`).  On target those wrap an open/close NVS handle; on host they
//! hit an in-memory map.  [`validate_config`] gates every config save.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use crate::sensors::float_switch::MAX_FLOAT_SWITCHES;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::{cell::RefCell, collections::HashMap};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub const CONFIG_NAMESPACE: &str = "solmate";
pub const CONFIG_KEY: &str = "syscfg";

/// Largest blob `get` will fetch.
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

fn config_error(e: StorageError) -> ConfigError {
    match e {
        StorageError::NotFound => ConfigError::NotFound,
        StorageError::Full => ConfigError::StorageFull,
        StorageError::IoError => ConfigError::IoError,
    }
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blobs: RefCell<HashMap<(String, String), Vec<u8>>>,
}

// ── Target backend ────────────────────────────────────────────

/// NUL-padded NVS name; IDF caps names at 15 bytes.
#[cfg(target_os = "espidf")]
fn nvs_name(name: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    let len = name.len().min(15);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

#[cfg(target_os = "espidf")]
fn esp_check(ret: esp_err_t) -> Result<(), esp_err_t> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
}

#[cfg(target_os = "espidf")]
fn storage_error(ret: esp_err_t) -> StorageError {
    if ret == ESP_ERR_NVS_NOT_FOUND as i32 {
        StorageError::NotFound
    } else if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
        StorageError::Full
    } else {
        warn!("NvsAdapter: NVS error {ret}");
        StorageError::IoError
    }
}

/// An open namespace, closed on drop.
#[cfg(target_os = "espidf")]
struct Namespace(nvs_handle_t);

#[cfg(target_os = "espidf")]
impl Namespace {
    fn open(namespace: &str, writable: bool) -> Result<Self, esp_err_t> {
        let name = nvs_name(namespace);
        let mode = if writable {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `name` is NUL-terminated and outlives the call.
        esp_check(unsafe { nvs_open(name.as_ptr().cast(), mode, &mut handle) })?;
        Ok(Self(handle))
    }

    fn commit(&self) -> Result<(), esp_err_t> {
        // SAFETY: handle is open until drop.
        esp_check(unsafe { nvs_commit(self.0) })
    }
}

#[cfg(target_os = "espidf")]
impl Drop for Namespace {
    fn drop(&mut self) {
        // SAFETY: opened in `open`, closed exactly once here.
        unsafe { nvs_close(self.0) }
    }
}

#[cfg(target_os = "espidf")]
impl NvsAdapter {
    /// Bring up the NVS partition.  A full partition or one written by a
    /// newer IDF is erased first.
    pub fn new() -> Result<Self, ConfigError> {
        // SAFETY: runs once from the main task before any other NVS call.
        let ret = unsafe { nvs_flash_init() };
        let unusable = ret == ESP_ERR_NVS_NO_FREE_PAGES as i32
            || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32;
        if unusable {
            warn!("NvsAdapter: partition unusable (rc={ret}), erasing");
            // SAFETY: as above.
            esp_check(unsafe { nvs_flash_erase() }).map_err(|_| ConfigError::IoError)?;
            esp_check(unsafe { nvs_flash_init() }).map_err(|_| ConfigError::IoError)?;
        } else {
            esp_check(ret).map_err(|_| ConfigError::IoError)?;
        }
        info!("NvsAdapter: NVS ready");
        Ok(Self {})
    }

    /// Adapter for a board whose NVS failed to come up.  Reads miss and
    /// writes fail.
    pub fn detached() -> Self {
        Self {}
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let ns = Namespace::open(namespace, false).map_err(storage_error)?;
        let key = nvs_name(key);
        let mut size: usize = 0;
        // SAFETY: a null data pointer only queries the length.
        esp_check(unsafe {
            nvs_get_blob(ns.0, key.as_ptr().cast(), core::ptr::null_mut(), &mut size)
        })
        .map_err(storage_error)?;
        if size > MAX_BLOB_SIZE {
            warn!("NvsAdapter: {namespace} blob of {size} bytes ignored");
            return Err(StorageError::IoError);
        }
        let mut blob = vec![0u8; size];
        // SAFETY: `blob` has exactly `size` bytes.
        esp_check(unsafe {
            nvs_get_blob(ns.0, key.as_ptr().cast(), blob.as_mut_ptr().cast(), &mut size)
        })
        .map_err(storage_error)?;
        blob.truncate(size);
        Ok(blob)
    }

    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let ns = Namespace::open(namespace, true).map_err(storage_error)?;
        let key = nvs_name(key);
        // SAFETY: key is NUL-terminated and `data` outlives the call.
        esp_check(unsafe {
            nvs_set_blob(ns.0, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
        })
        .map_err(storage_error)?;
        ns.commit().map_err(storage_error)
    }

    fn erase(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let ns = match Namespace::open(namespace, true) {
            Ok(ns) => ns,
            // Never-created namespace: nothing to erase.
            Err(ret) if ret == ESP_ERR_NVS_NOT_FOUND as i32 => return Ok(()),
            Err(ret) => return Err(storage_error(ret)),
        };
        let key = nvs_name(key);
        // SAFETY: key is NUL-terminated.
        match esp_check(unsafe { nvs_erase_key(ns.0, key.as_ptr().cast()) }) {
            Ok(()) => {}
            Err(ret) if ret == ESP_ERR_NVS_NOT_FOUND as i32 => return Ok(()),
            Err(ret) => return Err(storage_error(ret)),
        }
        ns.commit().map_err(storage_error)
    }

    fn contains(&self, namespace: &str, key: &str) -> bool {
        let Ok(ns) = Namespace::open(namespace, false) else {
            return false;
        };
        let key = nvs_name(key);
        // SAFETY: key is NUL-terminated; the type out-pointer may be null.
        unsafe { nvs_find_key(ns.0, key.as_ptr().cast(), core::ptr::null_mut()) == ESP_OK as i32 }
    }
}

// ── Host backend ──────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl NvsAdapter {
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsAdapter: in-memory backend");
        Ok(Self::detached())
    }

    pub fn detached() -> Self {
        Self {
            blobs: RefCell::new(HashMap::new()),
        }
    }

    fn slot(namespace: &str, key: &str) -> (String, String) {
        (namespace.to_owned(), key.to_owned())
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .borrow()
            .get(&Self::slot(namespace, key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .borrow_mut()
            .insert(Self::slot(namespace, key), data.to_vec());
        Ok(())
    }

    fn erase(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.blobs.borrow_mut().remove(&Self::slot(namespace, key));
        Ok(())
    }

    fn contains(&self, namespace: &str, key: &str) -> bool {
        self.blobs
            .borrow()
            .contains_key(&Self::slot(namespace, key))
    }
}

// ── Ports ─────────────────────────────────────────────────────

/// Range checks applied before any config is persisted.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    let rules: [(bool, &'static str); 9] = [
        (
            cfg.battery_low_threshold < cfg.battery_high_threshold,
            "battery_low_threshold must be < battery_high_threshold",
        ),
        (cfg.alert_min_switches >= 1, "alert_min_switches must be >= 1"),
        (
            cfg.alert_min_switches <= cfg.float_switch_count,
            "alert_min_switches must be <= float_switch_count",
        ),
        (
            usize::from(cfg.float_switch_count) <= MAX_FLOAT_SWITCHES,
            "float_switch_count must be <= 8",
        ),
        (
            (100..=2000).contains(&cfg.tick_interval_ms),
            "tick_interval_ms must be 100-2000",
        ),
        (
            (1..=32).contains(&cfg.max_send_attempts),
            "max_send_attempts must be 1-32",
        ),
        (
            (1_000..=600_000).contains(&cfg.retry_backoff_ms),
            "retry_backoff_ms must be 1000-600000",
        ),
        (!cfg.sms_secret.is_empty(), "sms_secret must not be empty"),
        (!cfg.status_phrase.is_empty(), "status_phrase must not be empty"),
    ];
    match rules.iter().find(|(ok, _)| !*ok) {
        Some(&(_, why)) => Err(ConfigError::ValidationFailed(why)),
        None => Ok(()),
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let blob = self
            .get(CONFIG_NAMESPACE, CONFIG_KEY)
            .map_err(config_error)?;
        let cfg = postcard::from_bytes(&blob).map_err(|_| ConfigError::Corrupted)?;
        info!("NvsAdapter: config loaded ({} bytes)", blob.len());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let blob = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.put(CONFIG_NAMESPACE, CONFIG_KEY, &blob)
            .map_err(config_error)?;
        info!("NvsAdapter: config saved ({} bytes)", blob.len());
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let blob = self.get(namespace, key)?;
        let n = blob.len().min(buf.len());
        buf[..n].copy_from_slice(&blob[..n]);
        Ok(n)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.put(namespace, key, data)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.erase(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.contains(namespace, key)
    }
}

/// Load the stored config, falling back to defaults.  On first boot the
/// defaults are written back.
pub fn load_or_init(port: &impl ConfigPort) -> SystemConfig {
    match port.load() {
        Ok(cfg) => match validate_config(&cfg) {
            Ok(()) => cfg,
            Err(e) => {
                warn!("config: stored values rejected ({e}), using defaults");
                SystemConfig::default()
            }
        },
        Err(ConfigError::NotFound) => {
            let cfg = SystemConfig::default();
            if let Err(e) = port.save(&cfg) {
                warn!("config: defaults not persisted: {e}");
            }
            cfg
        }
        Err(e) => {
            warn!("config: load failed ({e}), using defaults");
            SystemConfig::default()
        }
    }
}
