mod support;

use std::fs;

use support::TestConfig;
use taskboard::config::Config;
use taskboard::error::Error;
use taskboard::task::Priority;

#[test]
fn defaults_when_file_is_empty() {
    let cfg = TestConfig::new();
    let path = cfg.write("");
    let config = Config::load(&path).expect("load");

    assert_eq!(config.store.url, None);
    assert_eq!(config.store.rest_path, "/rest/v1");
    assert_eq!(config.store.tasks_table, "tareas");
    assert_eq!(config.store.categories_table, "categorias");
    assert_eq!(config.tasks.default_category, "personal");
    assert_eq!(config.tasks.priority(), Priority::Media);
    assert_eq!(config.tasks.upcoming_limit, 5);
    assert_eq!(
        config.tasks.categories,
        vec!["personal", "trabajo", "universidad"]
    );
}

#[test]
fn overrides_from_toml() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = TestConfig::new();
    let path = cfg.write(
        r#"
[store]
url = "https://demo.supabase.co"
api_key = "anon-key"
tasks_table = "tasks"

[tasks]
default_category = "trabajo"
default_priority = "alta"
upcoming_limit = 3
"#,
    );

    let config = Config::load(&path)?;
    assert_eq!(config.store.url.as_deref(), Some("https://demo.supabase.co"));
    assert_eq!(config.store.tasks_table, "tasks");
    assert_eq!(config.tasks.category().as_str(), "trabajo");
    assert_eq!(config.tasks.priority(), Priority::Alta);
    assert_eq!(config.tasks.upcoming_limit, 3);
    Ok(())
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        "[tasks]\ndefault_priority = \"urgente\"",
        "[tasks]\nupcoming_limit = 0",
        "[store]\ntasks_table = \"tareas; drop\"",
        "[store]\nurl = \"ftp://example.com\"",
    ];
    for contents in cases {
        let cfg = TestConfig::new();
        let path = cfg.write(contents);
        let err = Config::load(&path).expect_err(contents);
        assert!(matches!(err, Error::InvalidConfig(_)), "{contents}: {err}");
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let cfg = TestConfig::new();
    let path = cfg.write("[store\nurl = ");
    assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let cfg = TestConfig::new();
    let err = Config::discover(Some(&cfg.path())).expect_err("missing file");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn store_overrides_replace_file_values() {
    let config = Config::default().with_store_overrides(
        Some("https://other.supabase.co".to_string()),
        Some("   ".to_string()),
    );
    assert_eq!(config.store.url.as_deref(), Some("https://other.supabase.co"));
    assert_eq!(config.store.api_key, None);
}

#[test]
fn save_then_load_keeps_values() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("taskboard.toml");
    let config = Config::default()
        .with_store_overrides(Some("https://demo.supabase.co".to_string()), Some("k".to_string()));
    config.save(&path)?;

    let text = fs::read_to_string(&path)?;
    assert!(text.contains("[store]"));
    let loaded = Config::load(&path)?;
    assert_eq!(loaded.store.api_key.as_deref(), Some("k"));
    Ok(())
}

#[test]
fn redaction_hides_most_of_the_key() {
    let config = Config::default().with_store_overrides(None, Some("eyJhbGciOi".to_string()));
    assert_eq!(config.store.redacted().api_key.as_deref(), Some("eyJh****"));
}
