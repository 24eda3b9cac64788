//! Path normalization and provenance stamping.

use super::{RepositoryProperty, RunProperties, SarifDocument};
use crate::git::RepoMetadata;
use std::path::Path;

/// Absolute execution-root prefix used inside scanner containers.
pub const SANDBOX_PREFIX: &str = "/app/";

/// Rewrite container-absolute location paths to repository-relative ones
/// and stamp each run with repository provenance.
///
/// Every message occurrence of a rewritten location's original absolute
/// path is replaced with the same relative path, so the prose and the
/// structured location always agree. Single-pass: running it twice over
/// the same document is not supported.
pub fn normalize(mut document: SarifDocument, target: &Path, metadata: &RepoMetadata) -> SarifDocument {
    let subfolder = match metadata {
        RepoMetadata::Git(repo) => subfolder_of(target, &repo.root),
        RepoMetadata::Folder => None,
    };

    for run in &mut document.runs {
        if let RepoMetadata::Git(repo) = metadata {
            let properties = run.properties.get_or_insert_with(RunProperties::default);
            properties.repository = Some(RepositoryProperty {
                kind: "git".to_string(),
                url: repo.https_url.clone(),
            });
            if let Some(dir) = &subfolder {
                properties.includedirs = Some(vec![dir.clone()]);
            }
        }

        for result in &mut run.results {
            let mut rewrites: Vec<(String, String)> = Vec::new();
            for location in &mut result.locations {
                let Some(physical) = &mut location.physical_location else {
                    continue;
                };
                let Some(artifact) = &mut physical.artifact_location else {
                    continue;
                };
                let Some(stripped) = artifact.uri.strip_prefix(SANDBOX_PREFIX) else {
                    continue;
                };
                let relative = match &subfolder {
                    Some(dir) => format!("{dir}/{stripped}"),
                    None => stripped.to_string(),
                };
                rewrites.push((artifact.uri.clone(), relative.clone()));
                artifact.uri = relative;
            }
            for (absolute, relative) in rewrites {
                if result.message.text.contains(&absolute) {
                    result.message.text = result.message.text.replace(&absolute, &relative);
                }
            }
        }
    }

    document
}

/// The target's offset below the repository root, when it is a strict
/// subfolder.
fn subfolder_of(target: &Path, root: &Path) -> Option<String> {
    let offset = target.strip_prefix(root).ok()?;
    let offset = offset.to_string_lossy().replace('\\', "/");
    if offset.is_empty() { None } else { Some(offset) }
}
