//! Installed-package metadata extraction.
//!
//! Once a package has been materialized into a scratch directory, its
//! declared requirements live in `{name}-{version}.dist-info/METADATA` as
//! `Requires-Dist:` lines. The directory name does not reliably match the
//! requested spelling of the package: installers variously keep the original
//! casing, swap hyphens for underscores, or capitalize. The extractor
//! therefore probes a fixed set of spelling variants and reads the first one
//! that exists.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;

static REQUIRES_DIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Requires-Dist:\s*(.*)$").expect("metadata regex"));

/// Result of scanning a scratch directory for package metadata.
///
/// `Found` with an empty list is a confirmed zero-requirement package.
/// `NoMetadata` means no metadata file existed under any name variant, so
/// nothing could be determined — the two must not be conflated, and the
/// policy for `NoMetadata` lives with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Found(Vec<String>),
    NoMetadata,
}

/// Scans `scratch` for the package's dist-info metadata and returns its
/// declared requirement strings.
///
/// # Errors
///
/// Only genuine I/O failures (permissions, encoding) error out; a missing
/// file is part of the probing loop and ends in [`ExtractOutcome::NoMetadata`].
pub fn extract(name: &str, version: &str, scratch: &Path) -> Result<ExtractOutcome> {
    for variant in name_variants(name) {
        let path = scratch
            .join(format!("{variant}-{version}.dist-info"))
            .join("METADATA");

        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!("reading metadata from {}", path.display());
                return Ok(ExtractOutcome::Found(parse_metadata(&content)));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }

    tracing::debug!("no dist-info found for {name}-{version} under any name variant");
    Ok(ExtractOutcome::NoMetadata)
}

/// Spelling variants tried against the filesystem, in probe order: the name
/// as given and with its separators swapped, each additionally lower-cased,
/// upper-cased, and first-letter-capitalized. Duplicates are dropped while
/// preserving order.
fn name_variants(name: &str) -> Vec<String> {
    let swapped: String = name
        .chars()
        .map(|c| match c {
            '-' => '_',
            '_' => '-',
            other => other,
        })
        .collect();

    let mut variants = Vec::new();
    for base in [name.to_string(), swapped] {
        for candidate in [
            base.clone(),
            base.to_lowercase(),
            base.to_uppercase(),
            capitalize(&base),
        ] {
            if !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }
    }
    variants
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Pulls requirement strings out of METADATA content, dropping any
/// environment marker introduced after a semicolon.
fn parse_metadata(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let caps = REQUIRES_DIST_RE.captures(line)?;
            let data = caps.get(1)?.as_str();
            let without_marker = data.split(';').next().unwrap_or(data).trim();
            if without_marker.is_empty() {
                None
            } else {
                Some(without_marker.to_string())
            }
        })
        .collect()
}
