use crate::utils::version;
use anyhow::{bail, Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const KERNEL_PREFIX: &str = "vmlinuz-";
const RESCUE_MARKER: &str = "-rescue-";

/// Lists the kernel versions installed in the image mounted at `root`.
///
/// Kernels are looked up in `boot/` and, if `efi_dir` is set, in
/// `boot/efi/EFI/<efi_dir>/`. Rescue kernels are skipped and the result is
/// sorted from oldest to newest.
pub fn scan(root: &Path, efi_dir: Option<&str>) -> Result<Vec<String>> {
    if !root.is_dir() {
        bail!("Live image root {} is not available", root.display());
    }

    let mut locations = vec![root.join("boot")];
    if let Some(efi_dir) = efi_dir {
        locations.push(kernel_dir_on_efi(root, efi_dir));
    }

    let mut versions = Vec::new();
    for location in locations {
        versions.extend(scan_dir(&location)?);
    }

    // rpm ordering ties distinct strings such as 6.1.0 and 6.01.0, byte order
    // keeps copies adjacent and the result stable across scans
    versions.sort_by(|left, right| version::compare(left, right).then_with(|| left.cmp(right)));
    versions.dedup();

    Ok(versions)
}

fn kernel_dir_on_efi(root: &Path, efi_dir: &str) -> PathBuf {
    root.join("boot").join("efi").join("EFI").join(efi_dir)
}

fn scan_dir(location: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(location) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", location.display()));
        }
    };

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read {}", location.display()))?;

        // follows symlinks, a dangling link is not a kernel
        if !entry.path().is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };

        if name.contains(RESCUE_MARKER) {
            continue;
        }

        match name.strip_prefix(KERNEL_PREFIX) {
            Some(version) if !version.is_empty() => versions.push(version.to_string()),
            _ => {}
        }
    }

    Ok(versions)
}
