use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::client::{HttpTransport, ReportClient, Transport};
use crate::config::{ConfigProvider, Layered, ProcessEnv, Settings, StaticConfig};
use crate::error::ReportError;
use crate::formatters;
use crate::request::ReportRequestBuilder;
use crate::timespec::TimeRange;

use super::Args;

pub fn run_with_args(args: &Args) -> Result<()> {
    let config = config_provider(args.env_file.as_deref())?;
    let table = execute(args, &config, Utc::now(), |settings| {
        HttpTransport::new(settings.timeout)
    })?;
    println!("{table}");
    Ok(())
}

/// Runs the whole query for `args` and returns the rendered table.
///
/// The time range is validated before configuration is read, and `connect`
/// is only called once both are known to be good.
///
/// # Errors
/// Any [`ReportError`] raised along the way; nothing is retried.
pub fn execute<T, F>(
    args: &Args,
    config: &dyn ConfigProvider,
    now: DateTime<Utc>,
    connect: F,
) -> Result<String, ReportError>
where
    T: Transport,
    F: FnOnce(&Settings) -> Result<T, ReportError>,
{
    let range = TimeRange::resolve(&args.from, &args.to, now)?;
    info!(from = %range.from, to = %range.to, "resolved time range");

    let settings = Settings::load(config)?;
    debug!(?settings, "configuration loaded");

    let client = ReportClient::new(connect(&settings)?);
    let builder = ReportRequestBuilder::new(&settings.report_url)
        .organization(&settings.org_id)
        .range(range.from, range.to)
        .limit(args.limit);
    let builder = match settings.token_url.as_deref() {
        Some(token_url) => {
            let token = client.access_token(token_url, &settings.credential)?;
            info!("access token obtained");
            builder.bearer_token(token)
        }
        None => builder.credential(&settings.credential),
    };
    let request = builder.build()?;

    let result = client.fetch(&request)?;
    if result.is_empty() {
        warn!("API returned no deployment-status categories");
    } else {
        info!(rows = result.rows.len(), "deployment status received");
    }

    Ok(formatters::table::format(
        &result,
        &range.from_input,
        &range.to_input,
    ))
}

/// Process environment first, then the env file.
fn config_provider(env_file: Option<&Path>) -> Result<Layered> {
    let layered = Layered::new().push(ProcessEnv);
    match env_file {
        Some(path) => {
            let file = StaticConfig::from_env_file(path)
                .with_context(|| format!("loading --env-file {}", path.display()))?;
            Ok(layered.push(file))
        }
        None => {
            let default = Path::new(".env");
            if default.is_file() {
                debug!("reading configuration from ./.env");
                Ok(layered.push(StaticConfig::from_env_file(default)?))
            } else {
                Ok(layered)
            }
        }
    }
}
