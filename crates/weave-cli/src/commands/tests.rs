use super::*;
use crate::output::{ColorSupport, OutputHandler};
use crate::ResolveArgs;
use camino::Utf8Path;
use tempfile::TempDir;
use weave_core::{ConcretePackage, Version};

fn create_temp_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, path)
}

fn create_test_context(cwd: &Utf8Path) -> CommandContext {
    CommandContext {
        cwd: cwd.to_path_buf(),
        config_path: None,
        output: OutputHandler::with_colors(ColorSupport::disabled()),
    }
}

fn write_manifest(dir: &Utf8Path, name: &str, version: &str, requires: &[(&str, &str, &str)]) {
    let mut content = format!("[package]\nname = \"{}\"\nversion = \"{}\"\n", name, version);
    for (dep, min, max) in requires {
        content.push_str(&format!(
            "\n[requires.{}]\nmin = \"{}\"\nmax = \"{}\"\n",
            dep, min, max
        ));
    }
    std::fs::write(dir.join(format!("{}-{}.toml", name, version)), content).unwrap();
}

/// vim 8.0 needs libc in [2.0, 2.31] and ncurses 6.0 exactly; the newest
/// libc is 2.31
fn write_fixture(dir: &Utf8Path) {
    std::fs::create_dir_all(dir).unwrap();
    write_manifest(dir, "vim", "8.0", &[("libc", "2.0", "2.31"), ("ncurses", "6.0", "6.0")]);
    write_manifest(dir, "libc", "2.31", &[]);
    std::fs::copy(dir.join("libc-2.31.toml"), dir.join("libc-latest.toml")).unwrap();
    write_manifest(dir, "ncurses", "6.0", &[("libc", "2.17", "latest")]);
}

#[tokio::test]
async fn test_resolve_with_explicit_packages() {
    let (_temp, path) = create_temp_dir();
    write_fixture(&path.join("manifests"));
    let context = create_test_context(&path);

    let args = ResolveArgs {
        packages: vec!["vim@8.0".to_string()],
        manifests: vec![Utf8PathBuf::from("manifests")],
        ..ResolveArgs::default()
    };

    resolve::execute(args, &context).await.unwrap();
}

#[tokio::test]
async fn test_resolve_uses_configured_roots_and_sources() {
    let (_temp, path) = create_temp_dir();
    write_fixture(&path.join("manifests"));
    std::fs::write(
        path.join("weave.toml"),
        "[[sources]]\npath = \"manifests\"\n\n[roots]\nvim = \"8.0\"\n",
    )
    .unwrap();
    let context = create_test_context(&path);

    let args = ResolveArgs {
        json: true,
        ..ResolveArgs::default()
    };
    resolve::execute(args, &context).await.unwrap();
}

#[tokio::test]
async fn test_resolve_reports_conflict() {
    let (_temp, path) = create_temp_dir();
    let manifests = path.join("manifests");
    write_fixture(&manifests);
    write_manifest(&manifests, "ncurses", "6.0", &[("libc", "3.0", "latest")]);
    let context = create_test_context(&path);

    let args = ResolveArgs {
        packages: vec!["vim@8.0".to_string()],
        manifests: vec![manifests],
        no_cache: true,
        ..ResolveArgs::default()
    };

    let err = resolve::execute(args, &context).await.unwrap_err();
    assert!(matches!(err, WeaveError::UnsatisfiableConstraints { ref package, .. } if package == "libc"));
}

#[tokio::test]
async fn test_resolve_without_roots_fails() {
    let (_temp, path) = create_temp_dir();
    write_fixture(&path.join("manifests"));
    let context = create_test_context(&path);

    let args = ResolveArgs {
        manifests: vec![Utf8PathBuf::from("manifests")],
        ..ResolveArgs::default()
    };

    let err = resolve::execute(args, &context).await.unwrap_err();
    assert!(matches!(err, WeaveError::ConfigValidation { ref field, .. } if field == "roots"));
}

#[tokio::test]
async fn test_resolve_without_sources_fails() {
    let (_temp, path) = create_temp_dir();
    let context = create_test_context(&path);

    let args = ResolveArgs {
        packages: vec!["vim@8.0".to_string()],
        ..ResolveArgs::default()
    };

    let err = resolve::execute(args, &context).await.unwrap_err();
    assert!(matches!(err, WeaveError::ConfigValidation { ref field, .. } if field == "sources"));
}

#[tokio::test]
async fn test_resolve_rejects_bad_package_spec() {
    let (_temp, path) = create_temp_dir();
    let context = create_test_context(&path);

    let args = ResolveArgs {
        packages: vec!["vim".to_string()],
        manifests: vec![path.clone()],
        ..ResolveArgs::default()
    };

    let err = resolve::execute(args, &context).await.unwrap_err();
    assert!(matches!(err, WeaveError::InvalidPackageSpec { .. }));
}

#[test]
fn test_root_packages_prefer_command_line() {
    let mut config = WeaveToml::default();
    config.roots.insert("emacs".to_string(), "29.1".to_string());

    let roots = resolve::root_packages(&["vim@8.0".to_string()], &config).unwrap();
    assert_eq!(roots, vec![ConcretePackage::new("vim", Version::parse("8.0").unwrap())]);

    let roots = resolve::root_packages(&[], &config).unwrap();
    assert_eq!(roots[0].name, "emacs");
}

#[test]
fn test_manifest_directories_order() {
    let (_temp, path) = create_temp_dir();
    let context = create_test_context(&path);
    let mut config = WeaveToml::default();
    config.sources.push(weave_config::SourceSection {
        path: Utf8PathBuf::from("/opt/manifests"),
    });
    config.sources.push(weave_config::SourceSection {
        path: path.join("local"),
    });

    let directories = resolve::manifest_directories(
        &[Utf8PathBuf::from("local"), Utf8PathBuf::from("/srv/manifests")],
        &config,
        &context,
    );

    assert_eq!(
        directories,
        vec![
            path.join("local"),
            Utf8PathBuf::from("/srv/manifests"),
            Utf8PathBuf::from("/opt/manifests"),
        ]
    );
}

#[test]
fn test_build_provider_wraps_cache() {
    let dirs = vec![Utf8PathBuf::from("/a"), Utf8PathBuf::from("/b")];

    let cached = resolve::build_provider(&dirs, true);
    assert!(cached.describe().starts_with("cached "));

    let uncached = resolve::build_provider(&dirs, false);
    assert!(!uncached.describe().starts_with("cached "));
}

#[test]
fn test_resolver_config_from_section() {
    let section = weave_config::ResolverSection {
        mailbox_capacity: Some(4),
        settle_timeout_ms: Some(1500),
        ..Default::default()
    };

    let config = resolve::resolver_config(&section);
    assert_eq!(config.mailbox_capacity, 4);
    assert_eq!(config.settle_timeout, Some(std::time::Duration::from_millis(1500)));
    assert!(config.manifest_timeout.is_none());
}

#[tokio::test]
async fn test_check_accepts_valid_config() {
    let (_temp, path) = create_temp_dir();
    std::fs::create_dir_all(path.join("manifests")).unwrap();
    std::fs::write(
        path.join("weave.toml"),
        "[resolver]\nmailbox-capacity = 8\n\n[[sources]]\npath = \"manifests\"\n",
    )
    .unwrap();
    let context = create_test_context(&path);

    check::execute(&context).await.unwrap();
}

#[tokio::test]
async fn test_check_rejects_invalid_config() {
    let (_temp, path) = create_temp_dir();
    std::fs::write(path.join("weave.toml"), "[resolver]\nmailbox-capacity = 0\n").unwrap();
    let context = create_test_context(&path);

    let err = check::execute(&context).await.unwrap_err();
    assert!(matches!(err, WeaveError::ConfigValidation { .. }));
}

#[tokio::test]
async fn test_explicit_config_path() {
    let (_temp, path) = create_temp_dir();
    std::fs::write(path.join("ci.toml"), "[roots]\nvim = \"8.0\"\n").unwrap();
    let mut context = create_test_context(&path);
    context.config_path = Some(Utf8PathBuf::from("ci.toml"));

    let (config, source) = context.load_config(HashMap::new()).await.unwrap();
    assert_eq!(source, ConfigSource::Explicit(path.join("ci.toml")));
    assert_eq!(config.roots.len(), 1);
}
