use portfolio_site::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;

const ARGS: [&str; 1] = ["portfolio-site"];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        for var in [
            "PORTFOLIO_SERVER__PORT",
            "PORTFOLIO_CHAT__API_KEY",
            "PORTFOLIO_CHAT__MODEL",
            "PORTFOLIO_CONTACT__RECIPIENT",
            "PORTFOLIO_RESILIENCE__RATE_LIMIT_ENABLED",
            "CONFIG_FILE",
            "PORT",
            "HOST",
            "RATE_LIMIT_ENABLED",
            "GROQ_API_KEY",
            "LLM_API_KEY",
        ] {
            env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(ARGS).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.static_dir, "static");
    assert_eq!(config.chat.model, "llama-3.3-70b-versatile");
    assert_eq!(config.chat.session_idle_secs, 30 * 60);
    assert!(config.contact.recipient.is_none());
    assert!(config.llm_settings().is_none());
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("PORTFOLIO_SERVER__PORT", "9090");
        env::set_var("PORTFOLIO_CHAT__MODEL", "llama-3.1-8b-instant");
    }

    let config = AppConfig::load_from_args(ARGS).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.chat.model, "llama-3.1-8b-instant");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("PORTFOLIO_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["portfolio-site", "--port", "4000", "--host", "127.0.0.1"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.bind_addr(), "127.0.0.1:4000");

    clear_env_vars();
}

#[test]
#[serial]
fn test_api_key_fallback() {
    clear_env_vars();
    unsafe {
        env::set_var("GROQ_API_KEY", "gsk-test");
    }

    let config = AppConfig::load_from_args(ARGS).expect("Failed to load config");
    let settings = config.llm_settings().expect("key should configure chat");
    assert_eq!(settings.api_key, "gsk-test");
    assert!(!format!("{config:?}").contains("gsk-test"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_blank_api_key_is_unconfigured() {
    clear_env_vars();
    unsafe {
        env::set_var("PORTFOLIO_CHAT__API_KEY", "   ");
    }

    let config = AppConfig::load_from_args(ARGS).expect("Failed to load config");
    assert!(config.llm_settings().is_none());

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    writeln!(
        file,
        r#"
server:
  port: 7070
contact:
  recipient: owner@example.com
resilience:
  request_timeout_secs: 5
"#
    )
    .expect("Failed to write temp config");

    let path = file.path().to_string_lossy().to_string();
    let config = AppConfig::load_from_args(["portfolio-site", "--config", path.as_str()])
        .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.contact.recipient.as_deref(), Some("owner@example.com"));
    assert_eq!(config.request_timeout().as_secs(), 5);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_fails() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["portfolio-site", "--config", "/nonexistent/portfolio.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 6060
    "#;
    let cwd_path = "config.yaml";
    fs::write(cwd_path, config_content).expect("Failed to write ./config.yaml");

    let config = AppConfig::load_from_args(ARGS);

    fs::remove_file(cwd_path).unwrap();

    assert_eq!(config.expect("Failed to load config").server.port, 6060);
}
