/// Oracle Instant Client detection and initialization
///
/// The driver needs the native client library at runtime. This module
/// resolves where that library lives (default location or a user-supplied
/// directory), verifies it, and loads it once per process.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use serde::Serialize;

use crate::error::Error;

/// The loaded client library, kept alive for the process lifetime.
static CLIENT_LIB: OnceLock<Mutex<Option<libloading::Library>>> = OnceLock::new();

/// Default Instant Client directory when no custom path is configured.
#[cfg(target_os = "macos")]
const DEFAULT_CLIENT_PATH: &str = "~/lib";
#[cfg(target_os = "linux")]
const DEFAULT_CLIENT_PATH: &str = "/opt/oracle/instantclient";
#[cfg(target_os = "windows")]
const DEFAULT_CLIENT_PATH: &str = r"C:\oracle\instantclient";

#[cfg(target_os = "macos")]
const CLIENT_LIB_NAME: &str = "libclntsh.dylib";
#[cfg(target_os = "linux")]
const CLIENT_LIB_NAME: &str = "libclntsh.so";
#[cfg(target_os = "windows")]
const CLIENT_LIB_NAME: &str = "oci.dll";

/// The real client library is tens of megabytes; anything smaller is a stub
/// or a broken download.
const MIN_CLIENT_LIB_BYTES: u64 = 1_048_576;

/// Client detection result, for hosts and diagnostics.
#[derive(Debug, Serialize)]
pub struct ClientStatus {
    pub installed: bool,
    pub primed: bool,
    pub path: String,
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolves the Instant Client directory.
///
/// A custom directory wins when given (with `~/` expanded); otherwise the
/// platform default is used.
pub fn resolve_client_path(custom_path: Option<&str>) -> PathBuf {
    match custom_path {
        Some(path) => expand_home(path),
        None => expand_home(DEFAULT_CLIENT_PATH),
    }
}

/// Checks whether the client library exists at the resolved location and
/// looks plausible. Does not load anything.
pub fn check_client_ready(custom_path: Option<&str>) -> bool {
    let client_dir = resolve_client_path(custom_path);
    let lib_path = client_dir.join(CLIENT_LIB_NAME);

    if !lib_path.is_file() {
        log::debug!("oracle client library not found at {}", lib_path.display());
        return false;
    }

    match std::fs::metadata(&lib_path) {
        Ok(meta) if meta.len() >= MIN_CLIENT_LIB_BYTES => true,
        Ok(meta) => {
            log::warn!(
                "oracle client library at {} is suspiciously small ({} bytes)",
                lib_path.display(),
                meta.len()
            );
            false
        }
        Err(e) => {
            log::warn!("failed to stat {}: {}", lib_path.display(), e);
            false
        }
    }
}

/// Reports where the client was looked for and whether it is usable.
pub fn detect_client(custom_path: Option<&str>) -> ClientStatus {
    let path = resolve_client_path(custom_path);
    ClientStatus {
        installed: check_client_ready(custom_path),
        primed: is_primed(),
        path: path.to_string_lossy().to_string(),
    }
}

/// Loads the Instant Client library into the process, once.
///
/// The loader search path is set before loading so the driver can resolve
/// the library later, and the handle is held for the process lifetime. On
/// Unix the library is opened with RTLD_GLOBAL so its symbols are visible to
/// the driver. Calling `prime` again after a successful load is a no-op,
/// regardless of the path argument.
pub fn prime(custom_path: Option<&str>) -> Result<(), Error> {
    let slot = CLIENT_LIB.get_or_init(|| Mutex::new(None));
    let mut guard = slot
        .lock()
        .map_err(|_| Error::ClientInit("client library lock poisoned".to_string()))?;
    if guard.is_some() {
        return Ok(());
    }

    let client_dir = resolve_client_path(custom_path);
    let lib_path = client_dir.join(CLIENT_LIB_NAME);
    if !lib_path.exists() {
        return Err(Error::ClientInit(format!(
            "client library not found at {}. Install Oracle Instant Client \
             or configure a custom client path.",
            lib_path.display()
        )));
    }

    // The search path must be in place before the driver first resolves
    // symbols.
    #[cfg(target_os = "macos")]
    std::env::set_var("DYLD_LIBRARY_PATH", &client_dir);
    #[cfg(target_os = "linux")]
    std::env::set_var("LD_LIBRARY_PATH", &client_dir);
    #[cfg(target_os = "windows")]
    std::env::set_var("PATH", &client_dir);

    #[cfg(unix)]
    let library = unsafe {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
        UnixLibrary::open(Some(&lib_path), RTLD_NOW | RTLD_GLOBAL)
            .map(libloading::Library::from)
            .map_err(|e| {
                Error::ClientInit(format!("failed to load {}: {}", lib_path.display(), e))
            })?
    };

    #[cfg(not(unix))]
    let library = unsafe {
        libloading::Library::new(&lib_path).map_err(|e| {
            Error::ClientInit(format!("failed to load {}: {}", lib_path.display(), e))
        })?
    };

    *guard = Some(library);
    log::info!("loaded oracle client library from {}", lib_path.display());
    Ok(())
}

/// Whether the client library has been loaded into this process.
pub fn is_primed() -> bool {
    CLIENT_LIB
        .get()
        .and_then(|slot| slot.lock().ok())
        .map(|guard| guard.is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_client_path_custom() {
        let path = resolve_client_path(Some("/opt/oracle/instantclient_21_3"));
        assert_eq!(path, PathBuf::from("/opt/oracle/instantclient_21_3"));
    }

    #[test]
    fn test_resolve_client_path_expands_home() {
        let path = resolve_client_path(Some("~/instantclient"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("instantclient"));
        }
    }

    #[test]
    fn test_check_client_ready_missing() {
        assert!(!check_client_ready(Some("/nonexistent/path/oracle")));
    }

    #[test]
    fn test_prime_missing_library() {
        // Only meaningful while nothing has primed the client in this
        // process; a prior successful prime turns this into a no-op.
        if is_primed() {
            return;
        }
        let result = prime(Some("/nonexistent/path/oracle"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_detect_client_reports_path() {
        let status = detect_client(Some("/nonexistent/path/oracle"));
        assert!(!status.installed);
        assert_eq!(status.path, "/nonexistent/path/oracle");
    }
}
