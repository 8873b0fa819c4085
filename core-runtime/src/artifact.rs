//! # Engine Artifact Source
//!
//! Decides where the prebuilt ipatool engine bindings come from: a locally
//! built copy in the package tree, or a release asset on GitHub.
//!
//! ## Resolution
//!
//! 1. `APPLEPACKAGE_USE_LOCAL_BINDINGS` set to `1`, `true`, or `yes` selects
//!    the local artifact at [`LOCAL_BINDINGS_PATH`].
//! 2. Otherwise the release metadata at [`BINDINGS_METADATA_PATH`] names the
//!    tag, asset, and checksum, and the owning repository slug is resolved:
//!    `APPLEPACKAGE_GITHUB_REPOSITORY` → the `upstream` git remote → the
//!    metadata's `repository` → the `origin` git remote → error.

use crate::config::Environment;
use crate::error::{Error, Result};
use crate::logging::strip_path;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Selects the locally built artifact when truthy
pub const USE_LOCAL_BINDINGS_ENV: &str = "APPLEPACKAGE_USE_LOCAL_BINDINGS";

/// Explicit `owner/repo` slug hosting the release asset
pub const GITHUB_REPOSITORY_ENV: &str = "APPLEPACKAGE_GITHUB_REPOSITORY";

/// Locally built bindings, relative to the package root
pub const LOCAL_BINDINGS_PATH: &str = "Binaries/GoIPAToolBindings.xcframework";

/// Release metadata, relative to the package root
pub const BINDINGS_METADATA_PATH: &str = "GoIPAToolWrapper/bindings-metadata.json";

const GITHUB_REMOTE_PREFIXES: &[&str] = &[
    "https://github.com/",
    "http://github.com/",
    "git@github.com:",
    "ssh://git@github.com/",
    "git://github.com/",
];

/// Published release of the engine bindings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingsMetadata {
    pub release_tag: String,
    pub asset_name: String,
    pub checksum: String,
    #[serde(default)]
    pub repository: Option<String>,
}

impl BindingsMetadata {
    /// Load the metadata file from the first root that contains it.
    pub fn load(roots: &[PathBuf]) -> Result<Self> {
        let path = roots
            .iter()
            .map(|root| root.join(BINDINGS_METADATA_PATH))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                Error::Artifact(format!(
                    "Missing {}. Regenerate the bindings release metadata.",
                    BINDINGS_METADATA_PATH
                ))
            })?;

        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::Artifact(format!("Invalid {}: {}", BINDINGS_METADATA_PATH, e))
        })
    }

    /// Download URL of the release asset within `repository`.
    pub fn release_url(&self, repository: &str) -> String {
        format!(
            "https://github.com/{}/releases/download/{}/{}",
            repository, self.release_tag, self.asset_name
        )
    }
}

/// Where the engine artifact should be taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A locally built artifact
    Local { path: PathBuf },
    /// A published release asset, verified by checksum
    Remote { url: String, checksum: String },
}

impl ArtifactSource {
    /// Resolve the artifact source for the package rooted at `roots`.
    ///
    /// `roots` lists candidate package roots in priority order, typically
    /// from [`candidate_roots`].
    pub fn resolve(env: &Environment, roots: &[PathBuf]) -> Result<Self> {
        if use_local_bindings(env) {
            let path = roots
                .iter()
                .map(|root| root.join(LOCAL_BINDINGS_PATH))
                .find(|candidate| candidate.exists())
                .or_else(|| roots.first().map(|root| root.join(LOCAL_BINDINGS_PATH)))
                .unwrap_or_else(|| PathBuf::from(LOCAL_BINDINGS_PATH));
            debug!(
                artifact = %strip_path(&path.to_string_lossy()),
                "Using locally built engine bindings"
            );
            return Ok(ArtifactSource::Local { path });
        }

        let metadata = BindingsMetadata::load(roots)?;
        let repository = resolve_repository_slug(env, roots, metadata.repository.as_deref())?;
        let url = metadata.release_url(&repository);
        debug!(%repository, release = %metadata.release_tag, "Using released engine bindings");

        Ok(ArtifactSource::Remote {
            url,
            checksum: metadata.checksum,
        })
    }
}

/// Whether the locally built bindings were requested.
pub fn use_local_bindings(env: &Environment) -> bool {
    env.get(USE_LOCAL_BINDINGS_ENV)
        .map(|raw| matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Deduplicated candidate package roots, in priority order.
pub fn candidate_roots(execution_root: &Path, manifest_root: &Path) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::with_capacity(2);
    for root in [execution_root, manifest_root] {
        if !roots.iter().any(|seen| seen == root) {
            roots.push(root.to_path_buf());
        }
    }
    roots
}

/// Resolve the `owner/repo` slug that hosts the release asset.
///
/// # Errors
///
/// Returns [`Error::Artifact`] when no source in the chain yields a valid slug.
pub fn resolve_repository_slug(
    env: &Environment,
    roots: &[PathBuf],
    fallback: Option<&str>,
) -> Result<String> {
    if let Some(slug) = env
        .get(GITHUB_REPOSITORY_ENV)
        .filter(|value| is_valid_repository_slug(value))
    {
        return Ok(slug.clone());
    }

    if let Some(slug) = slug_from_git_remotes(roots, &["upstream"]) {
        return Ok(slug);
    }

    if let Some(slug) = fallback.filter(|value| is_valid_repository_slug(value)) {
        return Ok(slug.to_string());
    }

    if let Some(slug) = slug_from_git_remotes(roots, &["origin"]) {
        return Ok(slug);
    }

    Err(Error::Artifact(format!(
        "Unable to resolve the GitHub repository hosting the engine bindings. \
         Set {}=<owner>/<repo> or add a valid repository to {}.",
        GITHUB_REPOSITORY_ENV, BINDINGS_METADATA_PATH
    )))
}

fn slug_from_git_remotes(roots: &[PathBuf], remotes: &[&str]) -> Option<String> {
    for root in roots {
        let Some(config_path) = git_config_path(root) else {
            continue;
        };
        let Ok(config) = fs::read_to_string(&config_path) else {
            continue;
        };

        for remote in remotes {
            if let Some(slug) =
                extract_remote_url(&config, remote).and_then(|url| slug_from_remote_url(&url))
            {
                return Some(slug);
            }
        }
    }
    None
}

/// Locate the git config of the repository rooted at `root`.
///
/// Handles both a `.git` directory and a `.git` file pointing elsewhere with
/// `gitdir:` (worktrees and submodules).
pub fn git_config_path(root: &Path) -> Option<PathBuf> {
    let git_path = root.join(".git");
    if git_path.is_dir() {
        return Some(git_path.join("config"));
    }
    if !git_path.is_file() {
        return None;
    }

    let contents = fs::read_to_string(&git_path).ok()?;
    let (_, raw) = contents.split_once("gitdir:")?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let git_dir = Path::new(raw);
    let git_dir = if git_dir.is_absolute() {
        git_dir.to_path_buf()
    } else {
        root.join(git_dir)
    };
    Some(git_dir.join("config"))
}

/// Find the `url` of `[remote "<remote>"]` in a git config file.
pub fn extract_remote_url(config: &str, remote: &str) -> Option<String> {
    let header = format!("[remote \"{}\"]", remote);
    let mut in_section = false;

    for line in config.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_section = trimmed == header;
            continue;
        }
        if !in_section || !trimmed.starts_with("url") {
            continue;
        }

        if let Some((_, value)) = trimmed.split_once('=') {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Convert a GitHub remote URL into an `owner/repo` slug.
///
/// # Examples
///
/// ```
/// use core_runtime::artifact::slug_from_remote_url;
///
/// assert_eq!(
///     slug_from_remote_url("git@github.com:owner/repo.git").as_deref(),
///     Some("owner/repo")
/// );
/// assert_eq!(slug_from_remote_url("https://gitlab.com/owner/repo"), None);
/// ```
pub fn slug_from_remote_url(remote_url: &str) -> Option<String> {
    let normalized = remote_url.trim();
    let prefix = GITHUB_REMOTE_PREFIXES
        .iter()
        .find(|prefix| normalized.starts_with(*prefix))?;

    let path = &normalized[prefix.len()..];
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut parts = path.split('/').filter(|part| !part.is_empty());
    let slug = format!("{}/{}", parts.next()?, parts.next()?);
    is_valid_repository_slug(&slug).then_some(slug)
}

/// Whether `value` is exactly `owner/repo` with non-empty parts made of
/// alphanumerics, `-`, `_`, and `.`.
pub fn is_valid_repository_slug(value: &str) -> bool {
    let parts: Vec<&str> = value.split('/').collect();
    parts.len() == 2
        && parts.iter().all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_git_config(root: &Path, remotes: &[(&str, &str)]) {
        let git_dir = root.join(".git");
        fs::create_dir_all(&git_dir).unwrap();
        let mut config = String::from("[core]\n\tbare = false\n");
        for (name, url) in remotes {
            config.push_str(&format!("[remote \"{}\"]\n\turl = {}\n", name, url));
        }
        fs::write(git_dir.join("config"), config).unwrap();
    }

    fn write_metadata(root: &Path, repository: Option<&str>) {
        let dir = root.join("GoIPAToolWrapper");
        fs::create_dir_all(&dir).unwrap();
        let mut value = serde_json::json!({
            "releaseTag": "bindings-v1.2.3",
            "assetName": "GoIPAToolBindings.xcframework.zip",
            "checksum": "abc123"
        });
        if let Some(repository) = repository {
            value["repository"] = serde_json::json!(repository);
        }
        fs::write(dir.join("bindings-metadata.json"), value.to_string()).unwrap();
    }

    #[test]
    fn test_use_local_bindings_values() {
        for truthy in ["1", "true", "YES", " True "] {
            assert!(use_local_bindings(&env(&[(USE_LOCAL_BINDINGS_ENV, truthy)])));
        }
        for falsy in ["0", "false", "no", "", "on"] {
            assert!(!use_local_bindings(&env(&[(USE_LOCAL_BINDINGS_ENV, falsy)])));
        }
        assert!(!use_local_bindings(&env(&[])));
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_repository_slug("owner/repo"));
        assert!(is_valid_repository_slug("my-org/repo_name.swift"));
        assert!(!is_valid_repository_slug("owner"));
        assert!(!is_valid_repository_slug("owner/"));
        assert!(!is_valid_repository_slug("/repo"));
        assert!(!is_valid_repository_slug("a/b/c"));
        assert!(!is_valid_repository_slug("owner/re po"));
    }

    #[test]
    fn test_slug_from_remote_url_forms() {
        let cases = [
            ("https://github.com/owner/repo.git", Some("owner/repo")),
            ("http://github.com/owner/repo", Some("owner/repo")),
            ("git@github.com:owner/repo.git", Some("owner/repo")),
            ("ssh://git@github.com/owner/repo.git", Some("owner/repo")),
            ("git://github.com/owner/repo/extra", Some("owner/repo")),
            ("https://github.com/owner", None),
            ("https://example.com/owner/repo", None),
        ];

        for (url, expected) in cases {
            assert_eq!(slug_from_remote_url(url).as_deref(), expected, "{}", url);
        }
    }

    #[test]
    fn test_extract_remote_url_scopes_to_section() {
        let config = "[remote \"origin\"]\n\turl = git@github.com:me/fork.git\n\
                      [remote \"upstream\"]\n\tfetch = +refs/heads/*\n\turl = https://github.com/org/repo\n";

        assert_eq!(
            extract_remote_url(config, "upstream").as_deref(),
            Some("https://github.com/org/repo")
        );
        assert_eq!(
            extract_remote_url(config, "origin").as_deref(),
            Some("git@github.com:me/fork.git")
        );
        assert_eq!(extract_remote_url(config, "missing"), None);
    }

    #[test]
    fn test_explicit_env_slug_wins() {
        let dir = TempDir::new().unwrap();
        write_git_config(dir.path(), &[("upstream", "https://github.com/up/repo")]);

        let slug = resolve_repository_slug(
            &env(&[(GITHUB_REPOSITORY_ENV, "explicit/repo")]),
            &[dir.path().to_path_buf()],
            Some("fallback/repo"),
        )
        .unwrap();
        assert_eq!(slug, "explicit/repo");
    }

    #[test]
    fn test_invalid_env_slug_is_skipped() {
        let dir = TempDir::new().unwrap();
        let slug = resolve_repository_slug(
            &env(&[(GITHUB_REPOSITORY_ENV, "not-a-slug")]),
            &[dir.path().to_path_buf()],
            Some("fallback/repo"),
        )
        .unwrap();
        assert_eq!(slug, "fallback/repo");
    }

    #[test]
    fn test_upstream_beats_fallback_and_fallback_beats_origin() {
        let dir = TempDir::new().unwrap();
        write_git_config(
            dir.path(),
            &[
                ("origin", "git@github.com:me/fork.git"),
                ("upstream", "https://github.com/up/repo.git"),
            ],
        );
        let roots = [dir.path().to_path_buf()];

        assert_eq!(
            resolve_repository_slug(&env(&[]), &roots, Some("fallback/repo")).unwrap(),
            "up/repo"
        );

        write_git_config(dir.path(), &[("origin", "git@github.com:me/fork.git")]);
        assert_eq!(
            resolve_repository_slug(&env(&[]), &roots, Some("fallback/repo")).unwrap(),
            "fallback/repo"
        );
        assert_eq!(
            resolve_repository_slug(&env(&[]), &roots, None).unwrap(),
            "me/fork"
        );
    }

    #[test]
    fn test_unresolvable_slug_fails() {
        let dir = TempDir::new().unwrap();
        let err = resolve_repository_slug(&env(&[]), &[dir.path().to_path_buf()], None)
            .unwrap_err();
        assert!(err.to_string().contains(GITHUB_REPOSITORY_ENV));
    }

    #[test]
    fn test_gitdir_file_is_followed() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real-git");
        fs::create_dir_all(&real).unwrap();
        fs::write(
            real.join("config"),
            "[remote \"origin\"]\n\turl = https://github.com/linked/repo\n",
        )
        .unwrap();

        let worktree = dir.path().join("worktree");
        fs::create_dir_all(&worktree).unwrap();
        fs::write(worktree.join(".git"), "gitdir: ../real-git\n").unwrap();

        assert_eq!(
            git_config_path(&worktree),
            Some(worktree.join("../real-git").join("config"))
        );
        assert_eq!(
            resolve_repository_slug(&env(&[]), &[worktree], None).unwrap(),
            "linked/repo"
        );
    }

    #[test]
    fn test_candidate_roots_deduplicates() {
        let roots = candidate_roots(Path::new("/pkg"), Path::new("/pkg"));
        assert_eq!(roots, vec![PathBuf::from("/pkg")]);

        let roots = candidate_roots(Path::new("/cwd"), Path::new("/pkg"));
        assert_eq!(roots.len(), 2);
    }

    #[test]
    fn test_resolve_local_source() {
        let dir = TempDir::new().unwrap();
        let source = ArtifactSource::resolve(
            &env(&[(USE_LOCAL_BINDINGS_ENV, "1")]),
            &[dir.path().to_path_buf()],
        )
        .unwrap();

        assert_eq!(
            source,
            ArtifactSource::Local {
                path: dir.path().join(LOCAL_BINDINGS_PATH)
            }
        );
    }

    #[test]
    fn test_resolve_remote_source() {
        let dir = TempDir::new().unwrap();
        write_metadata(dir.path(), Some("owner/bindings"));

        let source = ArtifactSource::resolve(&env(&[]), &[dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            source,
            ArtifactSource::Remote {
                url: "https://github.com/owner/bindings/releases/download/bindings-v1.2.3/GoIPAToolBindings.xcframework.zip"
                    .to_string(),
                checksum: "abc123".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_metadata_fails() {
        let dir = TempDir::new().unwrap();
        let err = ArtifactSource::resolve(&env(&[]), &[dir.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains(BINDINGS_METADATA_PATH));
    }

    #[test]
    fn test_invalid_metadata_fails() {
        let dir = TempDir::new().unwrap();
        let meta_dir = dir.path().join("GoIPAToolWrapper");
        fs::create_dir_all(&meta_dir).unwrap();
        fs::write(meta_dir.join("bindings-metadata.json"), "{\"releaseTag\": 1}").unwrap();

        let err = BindingsMetadata::load(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains("Invalid"));
    }
}
