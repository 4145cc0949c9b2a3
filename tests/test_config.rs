use herald::config::{CONFIG_ENV, Config};
use herald::pipeline::{self, StageSpec};
use herald::{Client, Error};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert!(cfg.user_agent.starts_with("herald/"));
    assert_eq!(cfg.retry_count, 3);
    assert_eq!(cfg.redirect_count, 3);
    assert_eq!(cfg.connect_timeout().as_secs(), 10);
    assert_eq!(cfg.request_timeout().as_secs(), 30);
    assert!(cfg.auth.is_none());
    assert!(cfg.middlewares.is_none());
}

#[test]
fn test_default_stage_specs_carry_budgets() {
    let cfg = Config {
        retry_count: 5,
        redirect_count: 1,
        ..Config::default()
    };

    assert_eq!(
        cfg.stage_specs(),
        vec![
            StageSpec::with_budget(pipeline::RETRY, 5),
            StageSpec::with_budget(pipeline::REDIRECT, 1),
            StageSpec::new(pipeline::DECODE),
            StageSpec::new(pipeline::AUTHENTICATION),
        ]
    );
}

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
user_agent: fetcher/1.0
retry_count: 2
headers:
  X-Trace: "on"
auth:
  username: alice
  password: secret
middlewares:
  - RetryMiddleWare: 7
  - RedirectMiddleWare
  - DecodeMiddleWare
"#;
    let cfg = Config::from_yaml(yaml).unwrap();

    assert_eq!(cfg.user_agent, "fetcher/1.0");
    assert_eq!(cfg.headers.get("X-Trace").map(String::as_str), Some("on"));
    assert_eq!(cfg.auth.as_ref().unwrap().username, "alice");
    // Unset fields keep their defaults.
    assert_eq!(cfg.redirect_count, 3);

    assert_eq!(
        cfg.stage_specs(),
        vec![
            StageSpec::with_budget(pipeline::RETRY, 7),
            StageSpec::with_budget(pipeline::REDIRECT, 3),
            StageSpec::new(pipeline::DECODE),
        ]
    );
}

#[test]
fn test_config_null_budget_inherits() {
    let cfg = Config::from_yaml("retry_count: 9\nmiddlewares:\n  - RetryMiddleWare: ~\n").unwrap();
    assert_eq!(cfg.stage_specs(), vec![StageSpec::with_budget(pipeline::RETRY, 9)]);
}

#[test]
fn test_config_empty_middlewares_is_terminal_only() {
    let cfg = Config::from_yaml("middlewares: []\n").unwrap();
    let client = Client::new(cfg).unwrap();
    assert!(client.pipeline().stages().is_empty());
}

#[test]
fn test_config_rejects_entry_naming_two_stages() {
    let yaml = "middlewares:\n  - { RetryMiddleWare: 2, RedirectMiddleWare: 5 }\n";
    let err = Config::from_yaml(yaml).unwrap_err();

    assert!(format!("{:#}", err).contains("exactly one stage"));
}

#[test]
fn test_config_invalid_yaml() {
    assert!(Config::from_yaml("retry_count: lots").is_err());
}

#[test]
fn test_unknown_stage_fails_client_construction() {
    let cfg = Config::from_yaml("middlewares:\n  - CacheMiddleWare\n").unwrap();
    let err = Client::new(cfg).unwrap_err();
    assert!(matches!(err, Error::UnknownStage(name) if name == "CacheMiddleWare"));
}

#[test]
fn test_config_load_from_env() {
    // Single test for the variable so parallel tests never race on it.
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.retry_count, 3);

    let path = std::env::temp_dir().join(format!("herald-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "redirect_count: 0\nconnect_timeout_secs: 2\n").unwrap();
    unsafe {
        std::env::set_var(CONFIG_ENV, &path);
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.redirect_count, 0);
    assert_eq!(cfg.connect_timeout().as_secs(), 2);

    unsafe {
        std::env::set_var(CONFIG_ENV, path.with_extension("missing"));
    }
    assert!(Config::load().is_err());

    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.user_agent, cfg2.user_agent);
}
