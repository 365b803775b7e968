//! File-based configuration tests
//!
//! Exercises format detection, env substitution and layering against real
//! files in a temporary directory.

#[cfg(test)]
mod integration_tests {
    use crate::config::*;
    use serde::Deserialize;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct ServiceConfig {
        cache: CacheConfig,
        scoring: Option<ScoringConfig>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct CacheConfig {
        store_url: String,
        op_timeout_ms: u64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct ScoringConfig {
        fuel_price_per_litre: f64,
        hourly_rate: Option<f64>,
    }

    fn write(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
        let path = dir.path().join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_yaml_toml_and_json_agree() {
        let dir = TempDir::new().unwrap();

        let yaml = write(
            &dir,
            "service.yaml",
            r#"
cache:
  store_url: memory://
  op_timeout_ms: 200
scoring:
  fuel_price_per_litre: 1.6
"#,
        );
        let toml = write(
            &dir,
            "service.toml",
            r#"
[cache]
store_url = "memory://"
op_timeout_ms = 200

[scoring]
fuel_price_per_litre = 1.6
"#,
        );
        let json = write(
            &dir,
            "service.json",
            r#"{
  "cache": { "store_url": "memory://", "op_timeout_ms": 200 },
  "scoring": { "fuel_price_per_litre": 1.6 }
}"#,
        );

        let a: ServiceConfig = load_config(yaml.to_str().unwrap()).unwrap();
        let b: ServiceConfig = load_config(toml.to_str().unwrap()).unwrap();
        let c: ServiceConfig = load_config(json.to_str().unwrap()).unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.cache.op_timeout_ms, 200);
        assert_eq!(a.scoring.unwrap().hourly_rate, None);
    }

    #[test]
    fn test_env_substitution_in_file() {
        let dir = TempDir::new().unwrap();
        // SAFETY: test-local variable name, no other test reads it.
        unsafe {
            std::env::set_var("GREENROUTE_TEST_STORE_URL", "redis://cache:6379");
        }

        let path = write(
            &dir,
            "service.toml",
            r#"
[cache]
store_url = "${GREENROUTE_TEST_STORE_URL}"
op_timeout_ms = 100
"#,
        );

        let cfg: ServiceConfig = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.cache.store_url, "redis://cache:6379");
    }

    #[test]
    fn test_load_merged_overrides_fields() {
        let dir = TempDir::new().unwrap();
        let defaults = write(
            &dir,
            "defaults.toml",
            r#"
[cache]
store_url = "memory://"
op_timeout_ms = 500
"#,
        );
        let local = write(
            &dir,
            "local.json",
            r#"{ "cache": { "op_timeout_ms": 25 } }"#,
        );

        let cfg: ServiceConfig =
            load_merged(&[defaults.to_str().unwrap(), local.to_str().unwrap()]).unwrap();
        assert_eq!(cfg.cache.store_url, "memory://");
        assert_eq!(cfg.cache.op_timeout_ms, 25);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config::<ServiceConfig>("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_type_mismatch_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "bad.toml",
            r#"
[cache]
store_url = "memory://"
op_timeout_ms = "soon"
"#,
        );

        let err = load_config::<ServiceConfig>(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Serialization(_)));
    }
}
