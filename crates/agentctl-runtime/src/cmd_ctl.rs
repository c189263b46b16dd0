//! One-shot control commands: `agentctl start|stop|auth`.
//!
//! These go straight through the REST boundary; no session loop is running,
//! so there is no local state to update optimistically. Failures surface as
//! a non-zero exit with context.

use anyhow::Context;

use agentctl_client::api::ApiClient;
use agentctl_client::commands::{AUTH_FAILED_LOG, AUTH_STARTING_LOG, AUTH_SUCCESS_LOG};
use agentctl_client::config::ClientConfig;

fn api(base_url: &str) -> anyhow::Result<ApiClient> {
    let config = ClientConfig::new(base_url).context("invalid backend url")?;
    Ok(ApiClient::new(&config)?)
}

pub async fn cmd_start(base_url: &str) -> anyhow::Result<()> {
    api(base_url)?
        .start()
        .await
        .context("start command failed")?;
    println!("start acknowledged");
    Ok(())
}

pub async fn cmd_stop(base_url: &str) -> anyhow::Result<()> {
    api(base_url)?.stop().await.context("stop command failed")?;
    println!("stop acknowledged");
    Ok(())
}

pub async fn cmd_auth(base_url: &str) -> anyhow::Result<()> {
    let api = api(base_url)?;
    println!("{AUTH_STARTING_LOG}");
    let success = api.auth().await.context("auth command failed")?;
    if success {
        println!("{AUTH_SUCCESS_LOG}");
    } else {
        println!("{AUTH_FAILED_LOG}");
        anyhow::bail!("backend rejected authentication");
    }
    Ok(())
}
