use anyhow::{Context, Result};

use super::{
    config_model::{Auth, Database, DotEnvyConfig, Server},
    stage::Stage,
};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60 * 24;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: required("SERVER_PORT")?
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let auth = Auth {
        secret: required("AUTH_SECRET")?,
        session_ttl_seconds: match std::env::var("SESSION_TTL_SECONDS") {
            Ok(raw) => raw.parse().context("SESSION_TTL_SECONDS is invalid")?,
            Err(_) => DEFAULT_SESSION_TTL_SECONDS,
        },
    };

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        stage: get_stage(),
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is invalid", key))
}
