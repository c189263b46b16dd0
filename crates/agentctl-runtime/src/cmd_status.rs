//! `agentctl status` — one-shot snapshot fetch.

use anyhow::Context;

use agentctl_client::api::ApiClient;
use agentctl_client::config::ClientConfig;

pub async fn cmd_status(base_url: &str, json: bool) -> anyhow::Result<()> {
    let config = ClientConfig::new(base_url).context("invalid backend url")?;
    let api = ApiClient::new(&config)?;

    let snapshot = api
        .status()
        .await
        .with_context(|| format!("cannot reach agent at {base_url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("running:       {}", snapshot.is_running);
        println!("activity:      {}", snapshot.current_action);
        println!("authenticated: {}", snapshot.is_authenticated);
    }

    Ok(())
}
