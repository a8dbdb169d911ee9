use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const LOG_LEVELS: [&str; 6] = ["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl fmt::Display for RustEnvParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected one of: development, production, staging")
    }
}

impl std::error::Error for RustEnvParseError {}

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The upstream inference endpoint that relay requests are forwarded to.
    /// Must be an absolute http(s) URL; there is no default since the address
    /// is deployment specific.
    #[arg(long, env, value_parser = parse_upstream_url)]
    upstream_base_url: Url,

    /// Timeout in seconds for establishing the TCP/TLS connection to the upstream
    #[arg(long, env, default_value_t = 10)]
    pub upstream_connect_timeout_secs: u64,

    /// Timeout in seconds for the upstream to answer with response headers.
    /// The streamed body that follows is not bounded.
    #[arg(long, env, default_value_t = 60)]
    pub upstream_first_byte_timeout_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = parse_log_level,
    )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
        short,
        long,
        env,
        default_value_t = RustEnv::Development,
        value_parser = clap::value_parser!(RustEnv),
    )]
    pub runtime_env: RustEnv,
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn upstream_base_url(&self) -> &Url {
        &self.upstream_base_url
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_connect_timeout_secs)
    }

    pub fn upstream_first_byte_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_first_byte_timeout_secs)
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

fn parse_upstream_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid upstream URL `{value}`: {e}"))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(format!(
                "upstream URL must use http or https, got `{other}`"
            ))
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("upstream URL `{value}` has no host"));
    }

    Ok(url)
}

fn parse_log_level(value: &str) -> Result<LevelFilter, String> {
    if !LOG_LEVELS.contains(&value.to_uppercase().as_str()) {
        return Err(format!("expected one of: {}", LOG_LEVELS.join(", ")));
    }
    value
        .parse::<LevelFilter>()
        .map_err(|e| format!("invalid log level `{value}`: {e}"))
}
