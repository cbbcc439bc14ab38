//! Literal secrets in YAML are rejected; env var names are accepted and
//! resolved through the secrets module without leaking values.

use scd_config::secrets::{resolve_store_secrets_with, ResolvedStoreSecrets};
use scd_config::load_layered_yaml_from_strings;

const REST_WITH_ENV_NAME: &str = r#"
store:
  kind: rest
  rest:
    base_url: "https://store.example.com/rest/v1"
    api_key_env: "SCD_STORE_API_KEY"
"#;

#[test]
fn jwt_service_key_literal_is_rejected() {
    let yaml = r#"
store:
  kind: rest
  rest:
    base_url: "https://store.example.com/rest/v1"
    api_key_env: "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.service"
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("CONFIG_SECRET_DETECTED"));
    assert!(msg.contains("/store/rest/api_key_env"));
    assert!(!msg.contains("eyJhbGci"), "secret value must never be echoed");
}

#[test]
fn stripe_key_in_an_array_is_rejected() {
    let yaml = r#"
webhooks:
  - url: "https://example.com"
    token: "sk_live_abcdefgh12345"
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    assert!(format!("{err:#}").contains("/webhooks/0/token"));
}

#[test]
fn env_var_name_resolves_and_debug_redacts() {
    let loaded = load_layered_yaml_from_strings(&[REST_WITH_ENV_NAME]).unwrap();
    let engine = loaded.engine().unwrap();

    let secrets = resolve_store_secrets_with(&engine, |name| {
        (name == "SCD_STORE_API_KEY").then(|| "super-secret-value".to_string())
    })
    .unwrap();
    assert_eq!(secrets.api_key.as_deref(), Some("super-secret-value"));

    let dbg = format!("{secrets:?}");
    assert!(dbg.contains("<REDACTED>"));
    assert!(!dbg.contains("super-secret-value"));
}

#[test]
fn missing_env_var_names_the_variable() {
    let loaded = load_layered_yaml_from_strings(&[REST_WITH_ENV_NAME]).unwrap();
    let engine = loaded.engine().unwrap();
    let err = resolve_store_secrets_with(&engine, |_| Some("   ".to_string())).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("SECRETS_MISSING"));
    assert!(msg.contains("SCD_STORE_API_KEY"));
}

#[test]
fn file_store_needs_no_secrets() {
    let yaml = r#"
store:
  kind: file
  file:
    zones_path: "z.json"
    stripe_orders_path: "s.json"
    woo_orders_path: "w.json"
"#;
    let engine = load_layered_yaml_from_strings(&[yaml])
        .unwrap()
        .engine()
        .unwrap();
    let secrets: ResolvedStoreSecrets = resolve_store_secrets_with(&engine, |_| None).unwrap();
    assert!(secrets.api_key.is_none());
}
