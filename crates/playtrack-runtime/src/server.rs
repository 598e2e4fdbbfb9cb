//! UDS JSON-RPC server: minimal hand-rolled implementation.
//! Connection-per-request, newline-delimited JSON. This is the seam the
//! browser host (and the CLI subcommands) use to reach the coordinator.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use playtrack_core::{
    AddGameRequest, AddGameResponse, GetMappingRequest, TabFocusParams, TrackTimeRequest,
};
use playtrack_session::CoordinatorHandle;

/// Run the UDS JSON-RPC server.
pub async fn run_server(socket_path: &str, handle: CoordinatorHandle) -> anyhow::Result<()> {
    // Create socket directory with mode 0700
    let socket_dir = std::path::Path::new(socket_path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid socket path"))?;

    std::fs::create_dir_all(socket_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    // Check for stale socket
    if std::path::Path::new(socket_path).exists() {
        if tokio::net::UnixStream::connect(socket_path).await.is_err() {
            std::fs::remove_file(socket_path)?;
            tracing::info!("removed stale socket at {socket_path}");
        } else {
            anyhow::bail!("another daemon is already running at {socket_path}");
        }
    }

    let listener = UnixListener::bind(socket_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("UDS server listening on {socket_path}");

    loop {
        let (stream, _) = listener.accept().await?;
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, handle).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    handle: CoordinatorHandle,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let request: serde_json::Value = serde_json::from_str(line.trim())?;
    let method = request["method"].as_str().unwrap_or("");
    let id = request["id"].clone();

    let response = match dispatch(&handle, method, &request["params"]).await {
        Ok(result) => serde_json::json!({
            "jsonrpc": "2.0",
            "result": result,
            "id": id,
        }),
        Err((code, message)) => serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": code, "message": message},
            "id": id,
        }),
    };

    let mut resp = serde_json::to_string(&response)?;
    resp.push('\n');
    writer.write_all(resp.as_bytes()).await?;

    Ok(())
}

/// Route one request to the coordinator and build its result value.
///
/// Errors are JSON-RPC shaped: -32601 unknown method, -32602 bad params,
/// -32000 coordinator gone. Domain failures (registration errors, tracking
/// rejections) are NOT transport errors; they ride in the result body.
pub(crate) async fn dispatch(
    handle: &CoordinatorHandle,
    method: &str,
    params: &serde_json::Value,
) -> Result<serde_json::Value, (i64, String)> {
    match method {
        "tab_focus_changed" => {
            let p: TabFocusParams = parse_params(params)?;
            handle
                .tab_focus_changed(p.tab_id, &p.url)
                .await
                .map_err(closed)?;
            Ok(serde_json::json!({"ok": true}))
        }
        "window_blurred" => {
            handle.window_blurred().await.map_err(closed)?;
            Ok(serde_json::json!({"ok": true}))
        }
        "add_game" => {
            let p: AddGameRequest = parse_params(params)?;
            let response = match handle.register_game(&p.url, p.meta).await.map_err(closed)? {
                Ok(slug) => AddGameResponse::Registered { slug },
                Err(e) => AddGameResponse::Failed {
                    error: e.to_string(),
                },
            };
            Ok(serde_json::to_value(response).unwrap_or_default())
        }
        "get_mapping" => {
            let p: GetMappingRequest = parse_params(params)?;
            let mapping = handle.resolve_mapping(&p.url).await.map_err(closed)?;
            // Unmapped URLs answer with an empty object, not an error.
            Ok(match mapping {
                Some(m) => serde_json::to_value(m).unwrap_or_default(),
                None => serde_json::json!({}),
            })
        }
        "track_time" => {
            let p: TrackTimeRequest = parse_params(params)?;
            let outcome = handle
                .record_external_time(&p.game_slug, p.seconds)
                .await
                .map_err(closed)?;
            Ok(serde_json::to_value(outcome).unwrap_or_default())
        }
        "status" => {
            let session = handle.current_session().await.map_err(closed)?;
            let mappings = handle.list_mappings().await.map_err(closed)?;
            Ok(serde_json::json!({
                "active": session.as_ref().map(session_json),
                "trackedGames": mappings.len(),
            }))
        }
        "list_mappings" => {
            let mappings = handle.list_mappings().await.map_err(closed)?;
            Ok(serde_json::to_value(mappings).unwrap_or_default())
        }
        _ => Err((-32601, "method not found".to_string())),
    }
}

fn parse_params<P: serde::de::DeserializeOwned>(
    params: &serde_json::Value,
) -> Result<P, (i64, String)> {
    serde_json::from_value(params.clone()).map_err(|e| (-32602, format!("invalid params: {e}")))
}

fn closed(e: playtrack_session::CoordinatorClosed) -> (i64, String) {
    (-32000, e.to_string())
}

fn session_json(session: &playtrack_core::ActiveSession) -> serde_json::Value {
    serde_json::json!({
        "tabId": session.tab_id,
        "url": session.url,
        "gameSlug": session.game_slug,
        "startedAt": session.started_at.to_rfc3339(),
        "userId": session.user_id,
        "baseUrl": session.base_url,
    })
}
