use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert!(config.host.home_dir.is_empty());
    assert!(config.container.service_folder.is_none());
    assert!(config.container.disable_modules.is_empty());
    assert!(config.container.disable_services.is_empty());
    assert!(config.container.service_map.is_empty());

    let logging = config.logging.as_ref().unwrap();
    let default = logging.get("default").unwrap();
    assert_eq!(default.console_level, "info");
    assert_eq!(default.file, "logs/aethos.log");

    assert!(config.services.is_empty());
}

#[test]
fn test_yaml_serialization() {
    let config = AppConfig::default();
    let yaml = config.to_yaml().expect("Failed to serialize to YAML");

    assert!(yaml.contains("host:"));
    assert!(yaml.contains("container:"));
    assert!(yaml.contains("logging:"));
    assert!(yaml.contains("services:"));
}

#[test]
fn test_layered_loading_yaml_only() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("test-config.yaml");
    let home = temp_dir.path().join("home");

    let yaml_content = format!(
        r#"
host:
  home_dir: "{}"

container:
  service_folder: "/srv/aethos/services"
  disable_modules: ["legacy_auth"]
  disable_services: ["metrics"]
  service_map:
    store: kv_store.memory

services:
  greeter:
    greeting: "hi"
"#,
        home.display()
    );

    fs::write(&config_path, yaml_content).expect("Failed to write config file");

    let config = AppConfig::load_layered(&config_path).expect("Failed to load config");

    assert_eq!(config.host.home_dir, home.to_string_lossy());
    assert!(home.exists(), "home_dir should be created");

    let c = &config.container;
    assert_eq!(c.service_folder.as_deref(), Some("/srv/aethos/services"));
    assert!(c.disable_modules.contains("legacy_auth"));
    assert!(c.disable_services.contains("metrics"));
    assert_eq!(c.service_map.get("store").map(String::as_str), Some("kv_store.memory"));

    assert_eq!(config.services.len(), 1);
    assert!(config.services.contains_key("greeter"));
    // logging section was not provided, so it stays None for layered loads
    assert!(config.logging.is_none());
}

#[test]
fn test_container_accepts_camel_case_keys() {
    let yaml = r#"
serviceFolder: "./services"
disableModules: ["a"]
disableServices: ["b"]
serviceMap:
  db: db.postgres
"#;
    let c: ContainerConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(c.service_folder.as_deref(), Some("./services"));
    assert!(c.disable_modules.contains("a"));
    assert!(c.disable_services.contains("b"));
    assert_eq!(c.service_map["db"], "db.postgres");
}

#[test]
fn test_container_rejects_unknown_keys() {
    let yaml = r#"
service_folder: "./services"
services_folder: "./typo"
"#;
    let res: Result<ContainerConfig, _> = serde_yaml::from_str(yaml);
    assert!(res.is_err());
}

#[test]
fn test_services_dir_merges_yaml_files() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let services_dir = temp_dir.path().join("services.d");
    fs::create_dir_all(&services_dir).unwrap();
    fs::write(services_dir.join("greeter.yaml"), "greeting: hello\n").unwrap();
    fs::write(services_dir.join("notes.txt"), "ignored").unwrap();

    let config_path = temp_dir.path().join("config.yaml");
    let yaml = format!(
        "host:\n  home_dir: \"{}\"\nservices_dir: \"{}\"\n",
        temp_dir.path().join("home").display(),
        services_dir.display()
    );
    fs::write(&config_path, yaml).unwrap();

    let config = AppConfig::load_layered(&config_path).unwrap();
    assert_eq!(config.services.len(), 1);
    assert_eq!(config.services["greeter"]["greeting"], "hello");
}

#[test]
fn test_cli_overrides() {
    let mut config = AppConfig::default();

    let args = CliArgs {
        config: None,
        service_folder: Some("/opt/services".into()),
        print_config: false,
        verbose: 2,
    };

    config.apply_cli_overrides(&args);

    assert_eq!(
        config.container.service_folder.as_deref(),
        Some("/opt/services")
    );
    let logging = config.logging.as_ref().unwrap();
    assert_eq!(logging["default"].console_level, "trace");
}

#[test]
fn test_cli_overrides_verbose_levels() {
    let test_cases = vec![(0, "info"), (1, "debug"), (2, "trace"), (3, "trace")];

    for (verbose_level, expected_log_level) in test_cases {
        let mut config = AppConfig::default();
        let args = CliArgs {
            verbose: verbose_level,
            ..CliArgs::default()
        };

        config.apply_cli_overrides(&args);

        let logging = config.logging.as_ref().unwrap();
        assert_eq!(
            logging["default"].console_level, expected_log_level,
            "Failed for verbose level {verbose_level}"
        );
    }
}

#[test]
fn test_service_config_typed() {
    #[derive(serde::Deserialize, Default, PartialEq, Debug)]
    struct GreeterConfig {
        greeting: String,
        repeat: u32,
    }

    let mut config = AppConfig::default();
    config.services.insert(
        "greeter".to_string(),
        serde_json::json!({ "greeting": "hey", "repeat": 2 }),
    );
    config
        .services
        .insert("broken".to_string(), serde_json::json!("not an object"));

    let cfg: GreeterConfig = config.service_config("greeter").unwrap();
    assert_eq!(cfg.greeting, "hey");
    assert_eq!(cfg.repeat, 2);

    let missing: GreeterConfig = config.service_config("absent").unwrap();
    assert_eq!(missing, GreeterConfig::default());

    let err = config.service_config::<GreeterConfig>("broken").unwrap_err();
    assert!(err.to_string().contains("broken"));
}
