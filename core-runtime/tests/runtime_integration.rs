//! Integration tests for configuration, artifact resolution, and logging

use core_runtime::artifact::{
    candidate_roots, ArtifactSource, GITHUB_REPOSITORY_ENV, LOCAL_BINDINGS_PATH,
    USE_LOCAL_BINDINGS_ENV,
};
use core_runtime::config::{Environment, StoreConfig, DEVICE_IDENTIFIER_ENV};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::fs;
use tempfile::TempDir;

fn environment(vars: &[(&str, &str)]) -> Environment {
    vars.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn write_package(root: &std::path::Path) {
    let wrapper = root.join("GoIPAToolWrapper");
    fs::create_dir_all(&wrapper).unwrap();
    fs::write(
        wrapper.join("bindings-metadata.json"),
        r#"{"releaseTag":"bindings-2024.10","assetName":"GoIPAToolBindings.xcframework.zip","checksum":"deadbeef"}"#,
    )
    .unwrap();

    let git = root.join(".git");
    fs::create_dir_all(&git).unwrap();
    fs::write(
        git.join("config"),
        "[remote \"origin\"]\n\turl = git@github.com:contributor/ApplePackage.git\n",
    )
    .unwrap();
}

#[test]
fn test_remote_artifact_from_origin_remote() {
    let package = TempDir::new().unwrap();
    write_package(package.path());
    let roots = candidate_roots(package.path(), package.path());

    let source = ArtifactSource::resolve(&environment(&[]), &roots).unwrap();

    match source {
        ArtifactSource::Remote { url, checksum } => {
            assert_eq!(
                url,
                "https://github.com/contributor/ApplePackage/releases/download/bindings-2024.10/GoIPAToolBindings.xcframework.zip"
            );
            assert_eq!(checksum, "deadbeef");
        }
        other => panic!("expected remote artifact, got {:?}", other),
    }
}

#[test]
fn test_explicit_repository_overrides_git_remotes() {
    let package = TempDir::new().unwrap();
    write_package(package.path());
    let roots = candidate_roots(package.path(), package.path());

    let source = ArtifactSource::resolve(
        &environment(&[(GITHUB_REPOSITORY_ENV, "release-owner/ApplePackage")]),
        &roots,
    )
    .unwrap();

    assert!(matches!(
        source,
        ArtifactSource::Remote { ref url, .. } if url.starts_with("https://github.com/release-owner/ApplePackage/")
    ));
}

#[test]
fn test_local_artifact_prefers_existing_root() {
    let cwd = TempDir::new().unwrap();
    let package = TempDir::new().unwrap();
    fs::create_dir_all(package.path().join(LOCAL_BINDINGS_PATH)).unwrap();
    let roots = candidate_roots(cwd.path(), package.path());

    let source =
        ArtifactSource::resolve(&environment(&[(USE_LOCAL_BINDINGS_ENV, "true")]), &roots)
            .unwrap();

    assert_eq!(
        source,
        ArtifactSource::Local {
            path: package.path().join(LOCAL_BINDINGS_PATH)
        }
    );
}

#[test]
fn test_store_config_from_environment_map() {
    let env = environment(&[(DEVICE_IDENTIFIER_ENV, "0123456789AB")]);
    let config = StoreConfig::builder().environment(&env).build().unwrap();
    assert_eq!(config.device_identifier, "0123456789AB");
}

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    // Only one global subscriber may be installed per process
    init_logging(config.clone()).unwrap();
    assert!(init_logging(config).is_err());
}
