//! Integration tests for config

#[cfg(test)]
mod tests {
    use cmirror_config::*;
    use cmirror_types::ColorChoice;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
jobs = 8
color = "never"

[network]
chunk_timeout = 5
retries = 2

[registry]
download_url = "http://127.0.0.1:8080/{{crate}}/{{version}}/download"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.jobs, 8);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.network.chunk_timeout, 5);
        assert_eq!(config.network.retries, 2);
        // Untouched keys keep their defaults
        assert_eq!(config.network.user_agent, "cargo");
        assert_eq!(
            config.registry.download_url.as_deref(),
            Some("http://127.0.0.1:8080/{crate}/{version}/download")
        );
    }

    #[tokio::test]
    async fn test_invalid_toml_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[general\njobs = ").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            cmirror_errors::Error::Config(cmirror_errors::ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load_or_default(Some(&missing)).await.is_err());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("CMIRROR_COLOR");
        std::env::remove_var("CMIRROR_USER_AGENT");

        std::env::set_var("CMIRROR_COLOR", "always");
        std::env::set_var("CMIRROR_USER_AGENT", "cmirror-test");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.color, ColorChoice::Always);
        assert_eq!(config.network.user_agent, "cmirror-test");

        // Clean up
        std::env::remove_var("CMIRROR_COLOR");
        std::env::remove_var("CMIRROR_USER_AGENT");
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("CMIRROR_COLOR");
        std::env::set_var("CMIRROR_COLOR", "invalid");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(result.is_err());

        // Clean up
        std::env::remove_var("CMIRROR_COLOR");
    }
}
