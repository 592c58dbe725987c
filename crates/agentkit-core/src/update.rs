//! Update detection for installed types.

use agentkit_types::error::ResolveError;
use agentkit_types::resolve::{ResolvedType, Source};
use semver::Version;
use serde::Serialize;
use tracing::{debug, warn};

use crate::source::resolve_type;

/// An installed type with a newer version available from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateCandidate {
    pub type_path: String,
    pub installed_version: String,
    pub available_version: String,
    pub source_name: String,
}

/// Parse a version string leniently.
///
/// Accepts a leading `v` and fills a missing minor or patch component with
/// zero, so `v1.2` parses as `1.2.0`.
pub fn parse_relaxed_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    // Pad only the numeric core; pre-release and build tags follow it.
    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, rest) = trimmed.split_at(split);
    let dots = core.matches('.').count();
    let padded = match dots {
        0 => format!("{core}.0.0{rest}"),
        1 => format!("{core}.0{rest}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Compare each installed type against what the sources currently offer.
///
/// Types that no longer resolve, and versions that do not parse on either
/// side, are skipped.
pub fn check_updates(
    installed: &[ResolvedType],
    sources: &[Source],
) -> Result<Vec<UpdateCandidate>, ResolveError> {
    let mut candidates = Vec::new();

    for current in installed {
        let Some(available) = resolve_type(&current.type_path, sources)? else {
            debug!(type_path = %current.type_path, "No longer offered by any source");
            continue;
        };

        let (Some(have), Some(offered)) = (
            parse_relaxed_version(&current.version),
            parse_relaxed_version(&available.version),
        ) else {
            warn!(
                type_path = %current.type_path,
                installed = %current.version,
                available = %available.version,
                "Unparseable version, skipping update check"
            );
            continue;
        };

        if offered > have {
            candidates.push(UpdateCandidate {
                type_path: current.type_path.clone(),
                installed_version: current.version.clone(),
                available_version: available.version,
                source_name: available.source_name,
            });
        }
    }

    Ok(candidates)
}
