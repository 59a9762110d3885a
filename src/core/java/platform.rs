use std::path::{Path, PathBuf};

use crate::core::error::ProvisionError;

/// Architecture name as the runtime vendors spell it.
pub fn platform_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "x64".to_string(),
        "x86" => "x32".to_string(),
        other => other.to_string(),
    }
}

pub fn platform_os() -> &'static str {
    match std::env::consts::OS {
        "windows" => "windows",
        "linux" => "linux",
        "macos" => "mac",
        _ => "windows",
    }
}

pub fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Where the runtime executable of an unpacked distribution lives.
///
/// Falls back to `<root>/bin/java` when nothing is found, so the caller's
/// presence check fails on a path that makes sense in log output.
pub fn locate_java_binary(runtime_root: &Path) -> PathBuf {
    let primary = runtime_root.join("bin").join(java_exe());
    if primary.is_file() {
        return primary;
    }

    let mac_layout = runtime_root
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe());
    if mac_layout.is_file() {
        return mac_layout;
    }

    find_java_binary_recursive(runtime_root).unwrap_or(primary)
}

fn find_java_binary_recursive(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let file_type = entry.file_type().ok()?;

        if file_type.is_file() {
            let in_bin = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                == Some("bin");
            if in_bin && path.file_name().and_then(|n| n.to_str()) == Some(java_exe()) {
                return Some(path);
            }
        } else if file_type.is_dir() {
            if let Some(found) = find_java_binary_recursive(&path) {
                return Some(found);
            }
        }
    }
    None
}

/// The presence check: a regular file the current user may execute.
pub fn is_runtime_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

pub fn ensure_executable(java_bin: &Path) -> Result<(), ProvisionError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if java_bin.is_file() {
            let mut perms = std::fs::metadata(java_bin)
                .map_err(|source| ProvisionError::PathUnwritable {
                    path: java_bin.to_path_buf(),
                    source,
                })?
                .permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(java_bin, perms).map_err(|source| {
                ProvisionError::PathUnwritable {
                    path: java_bin.to_path_buf(),
                    source,
                }
            })?;
        }
    }
    #[cfg(not(unix))]
    let _ = java_bin;
    Ok(())
}
