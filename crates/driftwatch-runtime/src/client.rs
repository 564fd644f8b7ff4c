//! Thin CLI clients of the daemon's control socket.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Send `method` with no params and return its `result`, or fail with the
/// daemon's error object.
pub(crate) async fn rpc_call(socket_path: &str, method: &str) -> anyhow::Result<serde_json::Value> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to daemon at {socket_path}: {e}"))?;
    let (reader, mut writer) = stream.into_split();

    let mut request = serde_json::to_vec(&serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": {},
        "id": 1,
    }))?;
    request.push(b'\n');
    writer.write_all(&request).await?;
    writer.shutdown().await?;

    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;
    let mut reply: serde_json::Value = serde_json::from_str(line.trim())?;

    if let Some(error) = reply.get("error") {
        anyhow::bail!("daemon rejected {method}: {error}");
    }
    Ok(reply["result"].take())
}

/// `driftwatch status`: pretty JSON status snapshot.
pub async fn cmd_status(socket_path: &str) -> anyhow::Result<()> {
    let status = rpc_call(socket_path, "status").await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// `driftwatch signal`: forward a reconnect to the daemon.
pub async fn cmd_signal(socket_path: &str) -> anyhow::Result<()> {
    rpc_call(socket_path, "reconnect").await?;
    Ok(())
}

/// `driftwatch dismiss`
pub async fn cmd_dismiss(socket_path: &str) -> anyhow::Result<()> {
    rpc_call(socket_path, "dismiss").await?;
    Ok(())
}

/// `driftwatch banner`: single line for a status bar.
///
/// Prints `update available: <version>` while a drift notification is
/// active, nothing otherwise. Daemon unreachable: `--`.
pub async fn cmd_banner(socket_path: &str) -> anyhow::Result<()> {
    let notification = match rpc_call(socket_path, "notification").await {
        Ok(n) => n,
        Err(_) => {
            print!("--");
            return Ok(());
        }
    };

    print!("{}", format_banner(&notification));
    Ok(())
}

/// Pure formatting logic for banner output, separated for testability.
pub(crate) fn format_banner(notification: &serde_json::Value) -> String {
    if notification["active"].as_bool() != Some(true) {
        return String::new();
    }
    match notification["newVersion"].as_str() {
        Some(version) if !version.is_empty() => format!("update available: {version}"),
        _ => "update available".to_string(),
    }
}
