//! Telemetry configuration from environment variables.

/// Logging and trace export settings.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `service.name` on spans and the startup log line.
    pub service_name: String,
    pub environment: String,
    /// Collector address, used with the `otlp` feature.
    pub otlp_endpoint: String,
    /// `EnvFilter` directives, e.g. `info,rc_04_report_ingestion=debug`.
    pub log_level: String,
    pub console_output: bool,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "report-collector".to_string(),
            environment: "development".to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Read from the process environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OTEL_SERVICE_NAME`, then `APP_NAME` | `report-collector` |
    /// | `APP_ENV` | `development` |
    /// | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4317` |
    /// | `RC_LOG_LEVEL`, then `RUST_LOG` | `info` |
    /// | `RC_CONSOLE_OUTPUT` | `true` |
    /// | `RC_JSON_LOGS` | `true` inside Kubernetes or Docker |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary variable source.
    ///
    /// Telemetry starts before anything can report a config error, so an
    /// unreadable flag falls back to its default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let first = |keys: &[&str]| keys.iter().copied().find_map(&lookup);
        let in_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: first(&["OTEL_SERVICE_NAME", "APP_NAME"]).unwrap_or(defaults.service_name),
            environment: first(&["APP_ENV"]).unwrap_or(defaults.environment),
            otlp_endpoint: first(&["OTEL_EXPORTER_OTLP_ENDPOINT"]).unwrap_or(defaults.otlp_endpoint),
            log_level: first(&["RC_LOG_LEVEL", "RUST_LOG"]).unwrap_or(defaults.log_level),
            console_output: lookup("RC_CONSOLE_OUTPUT")
                .and_then(|v| flag(&v))
                .unwrap_or(defaults.console_output),
            json_logs: lookup("RC_JSON_LOGS")
                .and_then(|v| flag(&v))
                .unwrap_or(in_container),
        }
    }
}

fn flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
