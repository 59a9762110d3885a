// ─── Archive Unpacking ───
// Blocking; call from `spawn_blocking`.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use super::source::ArchiveKind;
use crate::core::error::ProvisionError;

/// Unpack `archive` into `dest`. A single top-level directory shared by
/// every entry (`jdk-17.0.9+9-jre/...`) is stripped.
pub fn unpack(kind: ArchiveKind, archive: &Path, dest: &Path) -> Result<(), ProvisionError> {
    std::fs::create_dir_all(dest).map_err(|source| ProvisionError::PathUnwritable {
        path: dest.to_path_buf(),
        source,
    })?;

    match kind {
        ArchiveKind::Zip => unpack_zip(archive, dest),
        ArchiveKind::TarGz => unpack_tar_gz(archive, dest),
    }
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<(), ProvisionError> {
    let mut archive = zip::ZipArchive::new(open(archive_path)?)
        .map_err(|err| unpack_failed(archive_path, err.to_string()))?;

    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|err| unpack_failed(archive_path, err.to_string()))?;
        let name = entry
            .enclosed_name()
            .ok_or_else(|| unpack_failed(archive_path, format!("unsafe entry {:?}", entry.name())))?;
        names.push(name);
    }
    let strip = common_root(&names);

    for (index, name) in names.iter().enumerate() {
        let Some(rel_path) = relative_target(name, strip) else {
            continue;
        };
        let mut entry = archive
            .by_index(index)
            .map_err(|err| unpack_failed(archive_path, err.to_string()))?;
        let out_path = dest.join(rel_path);

        if entry.is_dir() {
            create_dir(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            create_dir(parent)?;
        }

        let mut out = File::create(&out_path).map_err(|source| ProvisionError::PathUnwritable {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|err| unpack_failed(archive_path, format!("{:?}: {}", name, err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ = std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode));
            }
        }
    }

    Ok(())
}

fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> Result<(), ProvisionError> {
    let names = {
        let mut archive = tar::Archive::new(GzDecoder::new(open(archive_path)?));
        let entries = archive
            .entries()
            .map_err(|err| unpack_failed(archive_path, err.to_string()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| unpack_failed(archive_path, err.to_string()))?;
            let path = entry
                .path()
                .map_err(|err| unpack_failed(archive_path, err.to_string()))?
                .into_owned();
            names.push(path);
        }
        names
    };
    let strip = common_root(&names);

    let root = dest
        .canonicalize()
        .map_err(|source| ProvisionError::PathUnwritable {
            path: dest.to_path_buf(),
            source,
        })?;

    let mut archive = tar::Archive::new(GzDecoder::new(open(archive_path)?));
    let entries = archive
        .entries()
        .map_err(|err| unpack_failed(archive_path, err.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|err| unpack_failed(archive_path, err.to_string()))?;
        let name = entry
            .path()
            .map_err(|err| unpack_failed(archive_path, err.to_string()))?
            .into_owned();
        if has_unsafe_component(&name) {
            return Err(unpack_failed(archive_path, format!("unsafe entry {:?}", name)));
        }
        let Some(rel_path) = relative_target(&name, strip) else {
            continue;
        };
        let out_path = dest.join(rel_path);
        let parent = match out_path.parent() {
            Some(parent) => parent,
            None => return Err(unpack_failed(archive_path, format!("unsafe entry {:?}", name))),
        };
        // An earlier symlink entry may redirect a parent directory; check
        // before `create_dir_all` follows it.
        let existing = existing_ancestor(parent)
            .canonicalize()
            .map_err(|err| unpack_failed(archive_path, format!("{:?}: {}", name, err)))?;
        if !existing.starts_with(&root) {
            return Err(unpack_failed(
                archive_path,
                format!("entry {:?} escapes the destination", name),
            ));
        }
        create_dir(parent)?;
        let real_parent = parent
            .canonicalize()
            .map_err(|err| unpack_failed(archive_path, format!("{:?}: {}", name, err)))?;

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            let target = entry
                .link_name()
                .map_err(|err| unpack_failed(archive_path, err.to_string()))?
                .map(|target| target.into_owned())
                .ok_or_else(|| unpack_failed(archive_path, format!("link {:?} has no target", name)))?;

            if kind.is_hard_link() {
                // Hard link targets name another archive member.
                let source = match relative_target(&target, strip) {
                    Some(rel) if !has_unsafe_component(&target) => dest.join(rel),
                    _ => {
                        return Err(unpack_failed(
                            archive_path,
                            format!("link {:?} points outside the archive: {:?}", name, target),
                        ))
                    }
                };
                std::fs::hard_link(&source, &out_path)
                    .map_err(|err| unpack_failed(archive_path, format!("{:?}: {}", name, err)))?;
                continue;
            }

            if !link_stays_inside(&root, &real_parent, &target) {
                return Err(unpack_failed(
                    archive_path,
                    format!("link {:?} points outside the archive: {:?}", name, target),
                ));
            }
        }

        entry
            .unpack(&out_path)
            .map_err(|err| unpack_failed(archive_path, format!("{:?}: {}", name, err)))?;
    }

    Ok(())
}

fn existing_ancestor(path: &Path) -> &Path {
    path.ancestors()
        .find(|candidate| candidate.exists())
        .unwrap_or(path)
}

/// Whether a symlink created in `parent` with `target` resolves under `root`.
fn link_stays_inside(root: &Path, parent: &Path, target: &Path) -> bool {
    let mut resolved = parent.to_path_buf();
    for component in target.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    resolved.starts_with(root)
}

/// Whether every entry sits under one shared top-level directory.
fn common_root(names: &[PathBuf]) -> bool {
    let mut root: Option<&std::ffi::OsStr> = None;
    let mut nested = false;
    for name in names {
        let mut parts = name.components().filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        });
        let Some(first) = parts.next() else {
            continue;
        };
        match root {
            None => root = Some(first),
            Some(existing) if existing != first => return false,
            Some(_) => {}
        }
        if parts.next().is_some() {
            nested = true;
        }
    }
    root.is_some() && nested
}

fn relative_target(name: &Path, strip_root: bool) -> Option<PathBuf> {
    let mut rel_path = PathBuf::new();
    let mut components = name.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part),
        _ => None,
    });
    if strip_root {
        components.next();
    }
    for part in components {
        rel_path.push(part);
    }
    if rel_path.as_os_str().is_empty() {
        None
    } else {
        Some(rel_path)
    }
}

fn has_unsafe_component(name: &Path) -> bool {
    name.components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

fn open(path: &Path) -> Result<File, ProvisionError> {
    File::open(path).map_err(|err| unpack_failed(path, err.to_string()))
}

fn create_dir(path: &Path) -> Result<(), ProvisionError> {
    std::fs::create_dir_all(path).map_err(|source| ProvisionError::PathUnwritable {
        path: path.to_path_buf(),
        source,
    })
}

fn unpack_failed(archive: &Path, reason: String) -> ProvisionError {
    ProvisionError::UnpackFailed {
        archive: archive.to_path_buf(),
        reason,
    }
}
