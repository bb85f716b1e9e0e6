// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, defaults, env resolution, discovery, and product selection.

use lamina::cloud::Architecture;
use lamina::config::*;
use lamina::error::Error;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
functions:
  - orders
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let orders = config.functions.first();

        assert_eq!(orders.product.as_str(), "orders");
        assert_eq!(orders.function_name().as_str(), "orders");
        assert_eq!(orders.alias.as_str(), "live");
        assert_eq!(orders.memory_mb, 128);
        assert_eq!(orders.timeout, Duration::from_secs(30));
        assert_eq!(orders.architecture, Architecture::X86_64);
        assert_eq!(config.builder.image, DEFAULT_BUILDER_IMAGE);
        assert_eq!(config.deploy_timeout, Duration::from_secs(15 * 60));
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
project: service
output_dir: dist
region: eu-west-1
deploy_timeout: 5m

builder:
  image: rust:1.80-bullseye
  dockerfile: build/Dockerfile

functions:
  - product: orders
    function: orders-prod
    alias: blue
    role: arn:aws:iam::123456789012:role/orders
    memory_mb: 512
    timeout: 2m
    architecture: arm64
    env:
      LOG_LEVEL: info
    verify:
      payload: fixtures/ping.json
      expect:
        status: "200-204"
        payload:
          contains: { ok: true }
  - billing
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.deploy_timeout, Duration::from_secs(300));
        assert_eq!(config.functions.len(), 2);

        let orders = config.functions.first();
        assert_eq!(orders.function_name().as_str(), "orders-prod");
        assert_eq!(orders.alias.as_str(), "blue");
        assert_eq!(orders.memory_mb, 512);
        assert_eq!(orders.timeout, Duration::from_secs(120));
        assert_eq!(orders.architecture, Architecture::Arm64);
        assert_eq!(orders.verify.expect.status.max, 204);
        assert!(orders.verify.expect.payload.contains.is_some());
    }

    #[test]
    fn empty_function_list_is_rejected() {
        assert!(Config::from_yaml("functions: []\n").is_err());
    }

    #[test]
    fn invalid_product_name_is_rejected() {
        assert!(Config::from_yaml("functions:\n  - ../escape\n").is_err());
    }

    #[test]
    fn numeric_alias_is_rejected() {
        let yaml = r#"
functions:
  - product: orders
    alias: "42"
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn duplicate_function_names_are_rejected() {
        let yaml = r#"
functions:
  - orders
  - product: orders-v2
    function: orders
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}

mod env_values {
    use super::*;

    #[test]
    fn literal_and_env_values_resolve() {
        let yaml = r#"
functions:
  - product: orders
    env:
      MODE: literal
      TOKEN: { env: LAMINA_TEST_TOKEN }
      REGION: { env: LAMINA_TEST_UNSET, default: us-east-1 }
"#;
        let config = Config::from_yaml(yaml).unwrap();

        temp_env::with_vars(
            [
                ("LAMINA_TEST_TOKEN", Some("secret")),
                ("LAMINA_TEST_UNSET", None),
            ],
            || {
                let target = config.functions.first().deploy_target("d".into()).unwrap();
                assert_eq!(target.environment["MODE"], "literal");
                assert_eq!(target.environment["TOKEN"], "secret");
                assert_eq!(target.environment["REGION"], "us-east-1");
            },
        );
    }

    #[test]
    fn missing_env_var_fails_target_resolution() {
        let yaml = r#"
functions:
  - product: orders
    env:
      TOKEN: { env: LAMINA_TEST_MISSING }
"#;
        let config = Config::from_yaml(yaml).unwrap();

        temp_env::with_var_unset("LAMINA_TEST_MISSING", || {
            let err = config
                .functions
                .first()
                .deploy_target("d".into())
                .unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "LAMINA_TEST_MISSING"));
        });
    }
}

mod discovery {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_config_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "output_dir: dist\nbuilder:\n  dockerfile: Dockerfile.build\nfunctions:\n  - orders\n",
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();

        assert_eq!(config.output_dir(), dir.path().join("dist"));
        assert_eq!(config.artifact_dir(), dir.path().join("dist/.artifacts"));
        assert_eq!(config.project_dir(), dir.path().join("."));
        assert_eq!(config.dockerfile(), Some(dir.path().join("Dockerfile.build")));
    }

    #[test]
    fn discovers_alternate_file_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_ALT), "functions:\n  - orders\n").unwrap();

        assert!(Config::discover(dir.path()).is_ok());
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::discover(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("orders"), None, false).unwrap();

        let err = init_config(dir.path(), Some("orders"), None, false).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        init_config(dir.path(), Some("billing"), None, true).unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.functions.first().product.as_str(), "billing");
    }
}

mod selection {
    use super::*;

    fn config() -> Config {
        Config::from_yaml("functions:\n  - orders\n  - billing\n").unwrap()
    }

    #[test]
    fn no_product_selects_all() {
        assert_eq!(config().select(None).unwrap().len(), 2);
    }

    #[test]
    fn product_selects_its_entry() {
        let config = config();
        let selected = config.select(Some("billing")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].product.as_str(), "billing");
    }

    #[test]
    fn unknown_product_is_an_error() {
        let err = config().select(Some("shipping")).unwrap_err();
        assert!(matches!(err, Error::UnknownProduct(ref p) if p == "shipping"));
    }
}
