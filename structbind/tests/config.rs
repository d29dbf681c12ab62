use std::collections::HashMap;

use serial_test::serial;
use structbind::{Bindable, ConfigError, EnvProcessor, Validate, ValidationError, ValidationResult};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[derive(Debug, Default, Bindable)]
struct Listen {
    #[bind(tags(config_format = "snake", config_default = "127.0.0.1"))]
    host: String,
    #[bind(tags(config_format = "snake", config_default = "8080"))]
    listen_port: u16,
}

impl Validate for Listen {}

#[derive(Debug, Default, Bindable)]
struct ServerConfig {
    #[bind(tags(config_format = "snake"))]
    value: String,
    #[bind(rename = "ValueToGo", tags(config_format = "snake"))]
    value_to_go: Option<i64>,
    #[bind(tags(config_format = "snake", config_default = "false"))]
    debug: bool,
    #[bind(flatten)]
    listen: Listen,
    untagged: String,
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.value == "forbidden" {
            return Err(ValidationError::single("value", "forbidden", "value is not allowed"));
        }
        Ok(())
    }
}

#[test]
fn reads_prefixed_variables() {
    let processor = EnvProcessor::new().with_prefix("TEST").with_lookup(lookup(&[
        ("TEST_VALUE", "hello"),
        ("TEST_VALUE_TO_GO", "42"),
        ("TEST_DEBUG", "true"),
        ("TEST_LISTEN_PORT", "9090"),
        ("TEST_UNTAGGED", "ignored"),
    ]));

    let config: ServerConfig = processor.process().unwrap();

    assert_eq!(config.value, "hello");
    assert_eq!(config.value_to_go, Some(42));
    assert!(config.debug);
    assert_eq!(config.listen.listen_port, 9090);
    assert_eq!(config.listen.host, "127.0.0.1");
    assert_eq!(config.untagged, "");
}

#[test]
fn defaults_apply_when_variables_are_missing() {
    let config: ServerConfig = EnvProcessor::new().with_lookup(lookup(&[])).process().unwrap();

    assert_eq!(config.value, "");
    assert_eq!(config.value_to_go, None);
    assert!(!config.debug);
    assert_eq!(config.listen.host, "127.0.0.1");
    assert_eq!(config.listen.listen_port, 8080);
}

#[test]
fn variable_names_follow_the_snake_format() {
    let plain = EnvProcessor::new();
    assert_eq!(plain.variable_name("listen_port", "snake"), "LISTEN_PORT");
    assert_eq!(plain.variable_name("ValueToGo", "snake"), "VALUE_TO_GO");

    let prefixed = EnvProcessor::new().with_prefix("APP");
    assert_eq!(prefixed.variable_name("host", "snake"), "APP_HOST");

    let empty_prefix = EnvProcessor::new().with_prefix("");
    assert_eq!(empty_prefix.variable_name("host", "snake"), "HOST");
}

#[test]
fn bad_environment_value_names_variable_and_field() {
    let processor = EnvProcessor::new().with_lookup(lookup(&[("VALUE_TO_GO", "many")]));

    let err = processor.process::<ServerConfig>().unwrap_err();
    assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "ValueToGo"));
    assert!(err.to_string().starts_with("failed to assign env var many to field ValueToGo"), "{err}");
}

#[derive(Debug, Default, Bindable)]
struct BrokenDefault {
    #[bind(tags(config_format = "snake", config_default = "not-a-number"))]
    workers: u32,
}

impl Validate for BrokenDefault {}

#[test]
fn bad_default_value_is_reported() {
    let err = EnvProcessor::new()
        .with_lookup(lookup(&[]))
        .process::<BrokenDefault>()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Default { .. }));
    assert!(err.to_string().contains("failed to assign default value not-a-number"), "{err}");

    let config: BrokenDefault = EnvProcessor::new()
        .with_lookup(lookup(&[("WORKERS", "4")]))
        .process()
        .unwrap();
    assert_eq!(config.workers, 4);
}

#[test]
fn validation_runs_after_binding() {
    let err = EnvProcessor::new()
        .with_lookup(lookup(&[("VALUE", "forbidden")]))
        .process::<ServerConfig>()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("failed while validating the configuration"), "{err}");
}

#[derive(Debug, Default, Bindable)]
struct UnknownFormat {
    #[bind(tags(config_format = "kebab"))]
    value: String,
}

impl Validate for UnknownFormat {}

#[test]
#[should_panic(expected = "invalid config format (kebab)")]
fn unknown_format_panics() {
    let _ = EnvProcessor::new().with_lookup(lookup(&[])).process::<UnknownFormat>();
}

#[test]
#[serial]
fn reads_the_process_environment() {
    // SAFETY: serialized with every other test touching the environment.
    unsafe {
        std::env::set_var("STRUCTBIND_TEST_VALUE", "from env");
        std::env::set_var("STRUCTBIND_TEST_LISTEN_PORT", "7070");
    }

    let config: ServerConfig = EnvProcessor::new().with_prefix("STRUCTBIND_TEST").process().unwrap();

    unsafe {
        std::env::remove_var("STRUCTBIND_TEST_VALUE");
        std::env::remove_var("STRUCTBIND_TEST_LISTEN_PORT");
    }

    assert_eq!(config.value, "from env");
    assert_eq!(config.listen.listen_port, 7070);
}

#[test]
#[serial]
fn empty_environment_value_is_assigned() {
    unsafe {
        std::env::set_var("STRUCTBIND_EMPTY_VALUE", "");
    }

    let config: ServerConfig = EnvProcessor::new().with_prefix("STRUCTBIND_EMPTY").process().unwrap();

    unsafe {
        std::env::remove_var("STRUCTBIND_EMPTY_VALUE");
    }

    assert_eq!(config.value, "");
    assert_eq!(config.listen.listen_port, 8080);
}
