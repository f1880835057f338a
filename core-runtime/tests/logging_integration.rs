//! Integration tests for the logging setup

use bridge_traits::logging::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_cli_style_configuration() {
    // Only one subscriber per process, so the builder is checked on its own
    let config = LoggingConfig::default()
        .with_verbosity(1)
        .with_format(LogFormat::Pretty)
        .with_console(false);

    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(!config.console);
    assert!(config.filter.is_none());
}

#[test]
fn test_init_rejects_bad_filter_before_installing() {
    let config = LoggingConfig::default().with_filter("core_mirror=loud");
    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Invalid log filter"));
}

#[test]
fn test_token_fields_are_redacted() {
    assert_eq!(redact_if_sensitive("access_token", "ya29.a0Af"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("bearer", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "s3cr3t"), "[REDACTED]");
}

#[test]
fn test_owner_emails_are_masked() {
    let redacted = redact_if_sensitive("owner", "someone@example.com");
    assert!(redacted.starts_with('s'));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_plain_values_pass_through() {
    assert_eq!(redact_if_sensitive("folder_id", "0AFx9"), "0AFx9");
    assert_eq!(redact_if_sensitive("name", "The Expanse"), "The Expanse");
}

#[test]
fn test_default_format_is_compact() {
    assert_eq!(LoggingConfig::default().format, LogFormat::Compact);
}
