use anyhow::Context;
use clap::{Parser, Subcommand};
use jwt_signer::telemetry::{init_tracing, TracingConfig};
use jwt_signer::{Config, KeyStore, SignParams, SigningMode, TokenEngine};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "jwt-signer", version, about = "Sign and verify RSA-backed JWTs")]
struct Cli {
    /// YAML configuration file (defaults to $CONFIG_FILE_PATH/config.yaml)
    #[arg(long, global = true, env = "JWT_SIGNER_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign a token and print it
    Sign {
        #[arg(long)]
        audience: String,
        #[arg(long)]
        subject: String,
        /// Custom claim as key=value; the value is parsed as JSON when possible
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, Value)>,
        /// Extra protected header as key=value
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
        #[arg(long, default_value = "RS256")]
        algorithm: String,
        /// Time to live in milliseconds
        #[arg(long, default_value_t = 900_000)]
        ttl_ms: u64,
        #[arg(long, default_value = "JWT")]
        mode: SigningMode,
    },
    /// Verify a token and print its claims
    Parse {
        token: String,
        #[arg(long, default_value = "JWT")]
        mode: SigningMode,
    },
    /// Load both keys and check the certificate matches the private key
    CheckKeys,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

fn parse_claim(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = parse_header(raw)?;
    let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
    Ok((key, value))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&TracingConfig::default().with_json_output(cli.json_logs));

    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let keys = Arc::new(KeyStore::new(config.jwt).context("failed to initialise key store")?);
    let engine = TokenEngine::new(keys);

    match cli.command {
        Command::Sign {
            audience,
            subject,
            claims,
            headers,
            algorithm,
            ttl_ms,
            mode,
        } => {
            let mut builder = SignParams::builder()
                .audience(audience)
                .subject(subject)
                .algorithm(algorithm)
                .ttl_ms(ttl_ms)
                .mode(mode);
            for (key, value) in claims {
                builder = builder.claim(key, value);
            }
            for (key, value) in headers {
                builder = builder.header(key, value);
            }

            let token = engine
                .signed_token(&builder.build())
                .map_err(|e| anyhow::anyhow!("{} ({})", e, e.code()))?;
            println!("{}", token);
        }
        Command::Parse { token, mode } => {
            let claims = engine
                .parse_token(&token, mode)
                .map_err(|e| anyhow::anyhow!("{} ({})", e, e.code()))?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Command::CheckKeys => {
            engine.keys().verify_key_pair()?;
            info!(thumbprint = %engine.keys().thumbprint()?, "key pair is consistent");
            println!("ok");
        }
    }

    Ok(())
}
