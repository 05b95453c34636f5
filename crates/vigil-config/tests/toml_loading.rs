//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use vigil_config::{ConfigError, VigilConfig};

#[test]
fn loads_monitor_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[monitor]
tick_interval_secs = 60
security_scan_interval_secs = 3600
sensitive_keywords = ["vault", "cred"]
review_threshold = 5
"#,
        )?;

        let config: VigilConfig = Figment::from(Serialized::defaults(VigilConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.monitor.tick_interval_secs, 60);
        assert_eq!(config.monitor.security_scan_interval_secs, 3600);
        assert_eq!(config.monitor.sensitive_keywords, vec!["vault", "cred"]);
        assert_eq!(config.monitor.review_threshold, 5);
        // Untouched fields keep their defaults.
        assert_eq!(config.monitor.quality_check_interval_secs, 43_200);
        assert_eq!(config.queue.queue_file, ".vigil/queue.json");
        Ok(())
    });
}

#[test]
fn project_config_is_picked_up_by_load_for() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(jail.directory().join(".vigil")).expect("mkdir .vigil");
        jail.create_file(
            ".vigil/config.toml",
            r#"
[queue]
queue_file = "state/tasks.json"
retry_max_attempts = 2

[general]
default_limit = 50
"#,
        )?;

        let config = VigilConfig::load_for(jail.directory()).expect("config loads");
        assert_eq!(config.queue.queue_file, "state/tasks.json");
        assert_eq!(config.queue.retry_max_attempts, 2);
        assert_eq!(config.general.default_limit, 50);
        assert_eq!(
            config.queue.queue_path(jail.directory()),
            jail.directory().join("state/tasks.json")
        );
        Ok(())
    });
}

#[test]
fn zero_tick_interval_in_toml_is_rejected() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(jail.directory().join(".vigil")).expect("mkdir .vigil");
        jail.create_file(
            ".vigil/config.toml",
            r"
[monitor]
tick_interval_secs = 0
",
        )?;

        let err = VigilConfig::load_for(jail.directory()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "monitor.tick_interval_secs"));
        Ok(())
    });
}

#[test]
fn malformed_toml_surfaces_figment_error() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(jail.directory().join(".vigil")).expect("mkdir .vigil");
        jail.create_file(
            ".vigil/config.toml",
            r#"
[monitor]
tick_interval_secs = "soon"
"#,
        )?;

        let err = VigilConfig::load_for(jail.directory()).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}
