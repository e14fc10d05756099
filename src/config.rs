use std::net::{IpAddr, SocketAddr};

use clap::Args;

use crate::error::{BudgetError, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Local front-end dev servers allowed to call the API when none are configured.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5500",
    "http://127.0.0.1:5500",
    "http://localhost:8080",
];

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[arg(long, env = "BUDGET_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    #[arg(long, env = "BUDGET_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    #[arg(
        long = "allow-origin",
        env = "BUDGET_ALLOWED_ORIGINS",
        value_delimiter = ',',
        help = "Browser origin allowed to call the API; repeat or comma-separate"
    )]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.map(String::from).to_vec(),
        }
    }
}

impl ServerConfig {
    pub fn from_args(args: ServerArgs) -> Result<Self> {
        let ip: IpAddr = args.host.trim().parse()?;

        let mut allowed_origins = Vec::with_capacity(args.allowed_origins.len());
        for raw in &args.allowed_origins {
            let origin = raw.trim().trim_end_matches('/');
            if origin.is_empty() {
                continue;
            }
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(BudgetError::validation(format!(
                    "--allow-origin must start with http:// or https://, got {origin}"
                )));
            }
            allowed_origins.push(origin.to_string());
        }
        if allowed_origins.is_empty() {
            allowed_origins = DEFAULT_ALLOWED_ORIGINS.map(String::from).to_vec();
        }

        Ok(Self {
            addr: SocketAddr::new(ip, args.port),
            allowed_origins,
        })
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}
