use config::{Config, ConfigError, Environment, File};
use std::env;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Data directory for the WAL and snapshot files; stands in for a remote graph server URI
    /// since this store is embedded rather than a separate Bolt-speaking service.
    pub graph_uri: String,
    pub graph_user: Option<String>,
    pub graph_password: Option<String>,
    pub graph_database: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub model_name: String,
    pub model_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub scraper_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HealingConfig {
    pub heal_days_threshold: i64,
    pub heal_interval_hours: u64,
    pub heal_parallelism: usize,
}

#[derive(Debug, Clone)]
pub struct JobQueueConfig {
    pub job_broker_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub graph: GraphConfig,
    pub extractor: ExtractorConfig,
    pub scraper: ScraperConfig,
    pub healing: HealingConfig,
    pub jobs: JobQueueConfig,
}

impl AppConfig {
    /// Layers `config/default.toml`, an optional `config/{RUN_MODE}.toml`, then environment
    /// variables, the same three-tier precedence the rest of the pack uses. Key names are the
    /// flat, unprefixed ones from the external interface table (`GRAPH_URI`, `MODEL_NAME`, ...)
    /// except for the HTTP bind address, which is this service's own addition and lives under
    /// `SENTINEL_HTTP_HOST`/`SENTINEL_HTTP_PORT`.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let cfg = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::default())
            .build()?;

        let graph_uri = cfg
            .get_string("graph_uri")
            .unwrap_or_else(|_| "./data/sentinel".to_string());
        let model_name = cfg
            .get_string("model_name")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(AppConfig {
            http: HttpConfig {
                host: cfg
                    .get_string("sentinel_http_host")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: cfg.get_int("sentinel_http_port").unwrap_or(8080) as u16,
            },
            graph: GraphConfig {
                graph_uri,
                graph_user: cfg.get_string("graph_user").ok(),
                graph_password: cfg.get_string("graph_password").ok(),
                graph_database: cfg.get_string("graph_database").ok(),
            },
            extractor: ExtractorConfig {
                model_name,
                model_base_url: cfg.get_string("model_base_url").ok(),
            },
            scraper: ScraperConfig {
                scraper_api_key: cfg.get_string("scraper_api_key").ok(),
            },
            healing: HealingConfig {
                heal_days_threshold: cfg.get_int("heal_days_threshold").unwrap_or(7),
                heal_interval_hours: cfg.get_int("heal_interval_hours").unwrap_or(6) as u64,
                heal_parallelism: cfg.get_int("heal_parallelism").unwrap_or(1) as usize,
            },
            jobs: JobQueueConfig {
                job_broker_url: cfg.get_string("job_broker_url").ok(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_and_files_are_absent() {
        // Guard against leaking state from other tests' env::set_var calls in the same process.
        for key in ["GRAPH_URI", "MODEL_NAME", "HEAL_DAYS_THRESHOLD"] {
            env::remove_var(key);
        }
        let cfg = AppConfig::load().expect("load with no env overrides must still succeed");
        assert_eq!(cfg.healing.heal_days_threshold, 7);
        assert_eq!(cfg.healing.heal_interval_hours, 6);
        assert_eq!(cfg.healing.heal_parallelism, 1);
    }
}
