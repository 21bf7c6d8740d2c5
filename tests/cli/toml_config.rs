//! CLI TOML configuration tests
//!
//! Configuration files layered under parsed command-line arguments.

use plugin_updater::app::cli::args::*;
use plugin_updater::app::cli::config::ConfigError;
use plugin_updater::app::startup::parse_args;
use std::path::PathBuf;

#[tokio::test]
async fn test_config_file_fills_gaps_left_by_command_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("plugin-updater.toml");
    std::fs::write(
        &config,
        r#"
plugin-file = "/srv/site/plugins/acme-forms/acme-forms.php"
license-key = "FILE-KEY"
product-id = "acme-forms-pro"
cache-ttl = 3600
same-origin-packages = true

[args]
channel = "stable"
"#,
    )
    .unwrap();

    let mut args = parse_args([
        "plugin-updater",
        "-c",
        config.to_str().unwrap(),
        "-k",
        "CLI-KEY",
        "--arg",
        "channel=beta",
    ])
    .unwrap();
    args.load_config_file().await.unwrap();

    assert_eq!(
        args.plugin_file,
        Some(PathBuf::from("/srv/site/plugins/acme-forms/acme-forms.php"))
    );
    assert_eq!(args.cache_ttl_secs(), 3600);
    assert!(args.same_origin_packages);

    let credentials = args.credentials();
    assert_eq!(credentials.license_key, "CLI-KEY");
    assert_eq!(credentials.product_id, "acme-forms-pro");
    assert_eq!(
        credentials.extra_args.get("channel").map(String::as_str),
        Some("beta")
    );
}

#[tokio::test]
async fn test_invalid_config_value_names_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("plugin-updater.toml");
    std::fs::write(&config, "timeout = -5\n").unwrap();

    let mut args = Args {
        config_file: Some(config),
        ..Args::default()
    };
    match args.load_config_file().await {
        Err(ConfigError::Invalid { source, .. }) => {
            assert!(source.message().contains("timeout"))
        }
        other => panic!("expected an invalid-value error, got {:?}", other),
    }
}
