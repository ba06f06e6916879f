//! Default configuration values

use super::types::Config;

/// Configuration file name, looked up in the home directory
pub const CONFIG_FILE_NAME: &str = ".grind.toml";

/// Default isolate server endpoint
pub const DEFAULT_ISOLATE_SERVER: &str = "http://localhost:4242";

/// Default isolate binary location
pub const DEFAULT_ISOLATE_PATH: &str = "~/dev/go/bin/isolate";

/// Default dist_test client location
pub const DEFAULT_DIST_TEST_CLIENT_PATH: &str = "~/dev/dist_test/client.py";

/// Default per-task timeout in the generated manifest
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 300;

/// Default bound on a single external tool invocation
pub const DEFAULT_PROCESS_TIMEOUT_SECS: u64 = 3600;

/// Default Java launcher
pub const DEFAULT_JAVA: &str = "java";

/// Default JUnit runner main class
pub const DEFAULT_JUNIT_RUNNER: &str = "org.junit.runner.JUnitCore";

/// Environment variable carrying the isolate server to subprocesses
pub const ISOLATE_SERVER_ENV: &str = "ISOLATE_SERVER";

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# grind configuration

isolate_server = "http://localhost:4242"
isolate_path = "~/dev/go/bin/isolate"
dist_test_client_path = "~/dev/dist_test/client.py"
task_timeout_secs = 300
process_timeout_secs = 3600
java = "java"
junit_runner = "org.junit.runner.JUnitCore"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toml_round_trips() {
        let parsed: Config = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_template_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
