use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_leave_every_sink_disabled() {
    let settings = load_settings_from(None, env_from(&[]));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.email_from, "onboarding@resend.dev");
    assert_eq!(store_target(&settings).expect("target"), None);
    assert!(settings.email_api_key.is_none());
}

#[test]
fn environment_overrides_file() {
    let file = r#"
        bind_addr = "0.0.0.0:8080"
        email_from = "site@example.com"
        sink_timeout_secs = 3
    "#;
    let settings = load_settings_from(
        Some(file),
        env_from(&[
            ("RESEND_FROM_EMAIL", "hello@example.com"),
            ("RESEND_API_KEY", "re_123"),
        ]),
    );

    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.email_from, "hello@example.com");
    assert_eq!(settings.email_api_key.as_deref(), Some("re_123"));
    assert_eq!(settings.sink_timeout_secs, 3);
}

#[test]
fn empty_values_count_as_unset() {
    let settings = load_settings_from(
        Some(r#"email_from = """#),
        env_from(&[("RESEND_API_KEY", ""), ("RESEND_FROM_EMAIL", "  ")]),
    );
    assert_eq!(settings.email_api_key, None);
    assert_eq!(settings.email_from, "onboarding@resend.dev");
}

#[test]
fn rest_store_requires_service_key() {
    let mut settings = load_settings_from(
        None,
        env_from(&[("NEXT_PUBLIC_SUPABASE_URL", "https://project.supabase.co")]),
    );
    assert_eq!(store_target(&settings).expect("target"), None);

    settings.database_service_key = Some("service".into());
    assert_eq!(
        store_target(&settings).expect("target"),
        Some(StoreTarget::Rest {
            url: "https://project.supabase.co".into(),
            service_key: "service".into(),
        })
    );
}

#[test]
fn memory_sqlite_url_is_kept() {
    let settings = Settings {
        database_url: Some("sqlite::memory:".into()),
        ..Settings::default()
    };
    assert_eq!(
        store_target(&settings).expect("target"),
        Some(StoreTarget::Sqlite("sqlite::memory:".into()))
    );
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data/test.db"),
        "sqlite://data/test.db"
    );
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("portfolio_server_test_{suffix}"));
    let db_path = temp_root.join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.join("data").exists());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("portfolio_server_open_test_{suffix}"));
    let db_path = temp_root.join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );

    fs::remove_dir_all(temp_root).expect("cleanup");
}
