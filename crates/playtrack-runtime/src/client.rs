//! UDS JSON-RPC client for CLI subcommands.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use playtrack_core::PageMeta;

pub(crate) async fn rpc_call(
    socket_path: &str,
    method: &str,
    params: serde_json::Value,
) -> anyhow::Result<serde_json::Value> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to daemon at {socket_path}: {e}"))?;

    let (reader, mut writer) = stream.into_split();

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });
    let mut req = serde_json::to_string(&request)?;
    req.push('\n');
    writer.write_all(req.as_bytes()).await?;
    writer.shutdown().await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response: serde_json::Value = serde_json::from_str(line.trim())?;

    if let Some(error) = response.get("error") {
        anyhow::bail!("RPC error: {error}");
    }

    Ok(response["result"].clone())
}

/// `playtrack status`: one-glance daemon state.
pub async fn cmd_status(socket_path: &str) -> anyhow::Result<()> {
    let status = rpc_call(socket_path, "status", serde_json::json!({})).await?;
    println!("{}", format_status(&status));
    Ok(())
}

/// Pure formatting logic for status output, separated for testability.
pub(crate) fn format_status(status: &serde_json::Value) -> String {
    let tracked = status["trackedGames"].as_u64().unwrap_or(0);
    match status.get("active").filter(|a| !a.is_null()) {
        Some(active) => {
            let slug = active["gameSlug"].as_str().unwrap_or("?");
            let url = active["url"].as_str().unwrap_or("?");
            let since = active["startedAt"].as_str().unwrap_or("?");
            format!(
                "session: {slug} ({url})\n  since: {since}\ntracked games: {tracked}"
            )
        }
        None => format!("session: idle\ntracked games: {tracked}"),
    }
}

/// `playtrack mappings`: the persisted mapping list as JSON.
pub async fn cmd_mappings(socket_path: &str) -> anyhow::Result<()> {
    let mappings = rpc_call(socket_path, "list_mappings", serde_json::json!({})).await?;
    println!("{}", serde_json::to_string_pretty(&mappings)?);
    Ok(())
}

/// `playtrack add-game <url>`: register a game through the daemon.
pub async fn cmd_add_game(
    socket_path: &str,
    url: &str,
    meta: PageMeta,
) -> anyhow::Result<()> {
    let params = serde_json::json!({"url": url, "meta": meta});
    let result = rpc_call(socket_path, "add_game", params).await?;

    if let Some(error) = result.get("error").and_then(|e| e.as_str()) {
        anyhow::bail!("{error}");
    }
    match result.get("slug").and_then(|s| s.as_str()) {
        Some(slug) => {
            println!("registered: {slug} (dwell time on this page now counts as playtime)");
            Ok(())
        }
        None => anyhow::bail!("daemon returned an unexpected response: {result}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_status_idle() {
        let status = serde_json::json!({"active": null, "trackedGames": 0});
        assert_eq!(format_status(&status), "session: idle\ntracked games: 0");
    }

    #[test]
    fn format_status_active_session() {
        let status = serde_json::json!({
            "active": {
                "gameSlug": "abc",
                "url": "https://x.com/game",
                "startedAt": "2026-08-01T09:00:00+00:00",
                "tabId": 4,
            },
            "trackedGames": 3,
        });
        let out = format_status(&status);
        assert!(out.contains("session: abc (https://x.com/game)"));
        assert!(out.contains("since: 2026-08-01T09:00:00+00:00"));
        assert!(out.contains("tracked games: 3"));
    }

    #[test]
    fn format_status_missing_fields_degrades() {
        let status = serde_json::json!({});
        assert_eq!(format_status(&status), "session: idle\ntracked games: 0");
    }
}
