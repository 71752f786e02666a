use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_to_development_backend() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg.environment, Environment::Development);
    assert_eq!(cfg.api_base_url, DEVELOPMENT_API_BASE_URL);
    assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    assert!(cfg.storage_path.is_none());
    assert_eq!(cfg.display_offset, UtcOffset::UTC);
    assert_eq!(cfg, ClientConfig::default());
}

#[test]
fn production_uses_api_prefix_on_origin() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("APP_ENV", "production"),
        ("APP_ORIGIN", "https://assistant.example.edu/"),
    ]))
    .unwrap();
    assert_eq!(cfg.environment, Environment::Production);
    assert_eq!(cfg.api_base_url, "https://assistant.example.edu/api");
}

#[test]
fn production_without_origin_uses_default_origin() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("APP_ENV", "PROD")])).unwrap();
    assert_eq!(cfg.api_base_url, "http://localhost/api");
}

#[test]
fn explicit_base_url_overrides_environment() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("APP_ENV", "production"),
        ("API_BASE_URL", "http://10.0.0.5:9000/api/"),
    ]))
    .unwrap();
    assert_eq!(cfg.api_base_url, "http://10.0.0.5:9000/api");
}

#[test]
fn parses_timeout_storage_and_offset() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("API_TIMEOUT_SECS", "45"),
        ("SESSION_STORE_PATH", "/tmp/session.json"),
        ("DISPLAY_UTC_OFFSET", "+08:00"),
    ]))
    .unwrap();
    assert_eq!(cfg.request_timeout, Duration::from_secs(45));
    assert_eq!(cfg.storage_path, Some(PathBuf::from("/tmp/session.json")));
    assert_eq!(cfg.display_offset, UtcOffset::from_hms(8, 0, 0).unwrap());
}

#[test]
fn negative_offset_parses() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("DISPLAY_UTC_OFFSET", "-05:30")])).unwrap();
    assert_eq!(cfg.display_offset, UtcOffset::from_hms(-5, -30, 0).unwrap());
}

#[test]
fn unknown_environment_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("APP_ENV", "staging")])).unwrap_err();
    assert_eq!(err, ConfigError::UnknownEnvironment("staging".into()));
    assert!(err.to_string().contains("unknown APP_ENV"));
}

#[test]
fn zero_or_garbage_timeout_errors() {
    for raw in ["0", "soon", "-3"] {
        let err = ClientConfig::from_lookup(lookup_from(&[("API_TIMEOUT_SECS", raw)])).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { var: "API_TIMEOUT_SECS", .. }),
            "expected timeout error for {raw:?}"
        );
    }
}

#[test]
fn bad_offset_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("DISPLAY_UTC_OFFSET", "8 hours")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { var: "DISPLAY_UTC_OFFSET", .. }));
}

#[test]
fn blank_storage_path_is_ignored() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("SESSION_STORE_PATH", "  ")])).unwrap();
    assert!(cfg.storage_path.is_none());
}
