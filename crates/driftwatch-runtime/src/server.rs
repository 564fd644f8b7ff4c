//! Control socket for the daemon.
//!
//! One JSON-RPC request per connection, newline terminated. Methods map
//! straight onto the reconciliation controller; see [`dispatch`].

use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use driftwatch_probe::IdentityProbe;
use driftwatch_reconcile::{ReconciliationController, Scheduler};

const METHOD_NOT_FOUND: i64 = -32601;

/// Accept connections until the listener fails.
pub async fn serve<P, S>(
    listener: UnixListener,
    controller: ReconciliationController<P, S>,
) -> anyhow::Result<()>
where
    P: IdentityProbe + 'static,
    S: Scheduler,
{
    loop {
        let (stream, _) = listener.accept().await?;
        let controller = controller.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &controller).await {
                tracing::debug!(error = %e, "control connection failed");
            }
        });
    }
}

/// Bind the control socket: private directory, owner-only socket.
///
/// A socket file nobody answers on is left over from a crashed daemon and is
/// replaced. A live one means another daemon owns this session.
pub async fn bind_socket(socket_path: &str) -> anyhow::Result<UnixListener> {
    let path = Path::new(socket_path);
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("socket path {socket_path} has no parent directory"))?;
    std::fs::create_dir_all(dir)?;
    restrict(dir, 0o700)?;

    if path.exists() {
        if UnixStream::connect(path).await.is_ok() {
            anyhow::bail!("another daemon is already running at {socket_path}");
        }
        std::fs::remove_file(path)?;
        tracing::info!(socket = socket_path, "removed stale control socket");
    }

    let listener = UnixListener::bind(path)?;
    restrict(path, 0o600)?;
    Ok(listener)
}

#[cfg(unix)]
fn restrict(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

async fn handle_connection<P, S>(
    stream: UnixStream,
    controller: &ReconciliationController<P, S>,
) -> anyhow::Result<()>
where
    P: IdentityProbe + 'static,
    S: Scheduler,
{
    let (reader, mut writer) = stream.into_split();
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;

    let request: serde_json::Value = serde_json::from_str(line.trim())?;
    let method = request["method"].as_str().unwrap_or_default();
    tracing::trace!(method, "control request");

    let mut reply = match dispatch(method, controller)? {
        Some(result) => serde_json::json!({"jsonrpc": "2.0", "result": result}),
        None => serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": METHOD_NOT_FOUND, "message": "method not found"},
        }),
    };
    reply["id"] = request["id"].clone();

    let mut bytes = serde_json::to_vec(&reply)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.shutdown().await?;
    Ok(())
}

/// Execute one RPC method. `Ok(None)` means the method is unknown.
pub(crate) fn dispatch<P, S>(
    method: &str,
    controller: &ReconciliationController<P, S>,
) -> anyhow::Result<Option<serde_json::Value>>
where
    P: IdentityProbe + 'static,
    S: Scheduler,
{
    let result = match method {
        "reconnect" => {
            controller.on_reconnect_signal();
            serde_json::json!({"accepted": true})
        }
        "notification" => serde_json::to_value(controller.notification())?,
        "dismiss" => serde_json::to_value(controller.dismiss())?,
        "status" => serde_json::to_value(controller.snapshot())?,
        _ => return Ok(None),
    };
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use driftwatch_core::{DriftConfig, Identity};
    use driftwatch_probe::ProbeError;
    use driftwatch_reconcile::TokioScheduler;

    /// Always answers with the same identity and counts calls.
    struct StaticProbe {
        identity: Identity,
        calls: AtomicUsize,
    }

    impl IdentityProbe for StaticProbe {
        async fn probe(&self) -> Result<Identity, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.identity.clone())
        }
    }

    fn controller(
        version: &str,
    ) -> (
        Arc<StaticProbe>,
        ReconciliationController<Arc<StaticProbe>, TokioScheduler>,
    ) {
        let probe = Arc::new(StaticProbe {
            identity: Identity::new(version, "abc-123"),
            calls: AtomicUsize::new(0),
        });
        let ctrl = ReconciliationController::new(
            Arc::clone(&probe),
            TokioScheduler::current(),
            DriftConfig::default(),
        );
        (probe, ctrl)
    }

    #[tokio::test]
    async fn unknown_method_is_none() {
        let (_probe, ctrl) = controller("1.0.0");
        assert!(dispatch("list_panes", &ctrl).expect("dispatch").is_none());
    }

    #[tokio::test]
    async fn notification_starts_inactive() {
        let (_probe, ctrl) = controller("1.0.0");
        let value = dispatch("notification", &ctrl)
            .expect("dispatch")
            .expect("known method");
        assert_eq!(value, serde_json::json!({"active": false, "newVersion": null}));
    }

    #[tokio::test]
    async fn status_reports_unset_baseline_before_start() {
        let (_probe, ctrl) = controller("1.0.0");
        let value = dispatch("status", &ctrl)
            .expect("dispatch")
            .expect("known method");
        assert_eq!(value["baseline"]["state"], "unset");
        assert_eq!(value["capture"]["phase"], "idle");
        assert_eq!(value["torn_down"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_method_schedules_reconcile() {
        let (probe, ctrl) = controller("1.0.0");
        let value = dispatch("reconnect", &ctrl)
            .expect("dispatch")
            .expect("known method");
        assert_eq!(value["accepted"], true);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
        let status = dispatch("status", &ctrl).expect("dispatch").expect("known");
        assert_eq!(status["baseline"]["identity"]["version"], "1.0.0");
    }

    #[tokio::test]
    async fn dismiss_returns_cleared_state() {
        let (_probe, ctrl) = controller("1.0.0");
        let value = dispatch("dismiss", &ctrl)
            .expect("dispatch")
            .expect("known method");
        assert_eq!(value["active"], false);
    }

    #[tokio::test]
    async fn server_round_trip_over_socket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("dw").join("driftwatch.sock");
        let socket = socket.to_str().expect("utf-8 path").to_string();

        let (_probe, ctrl) = controller("1.0.0");
        let listener = bind_socket(&socket).await.expect("bind");
        let server = tokio::spawn(serve(listener, ctrl));

        let result = crate::client::rpc_call(&socket, "notification")
            .await
            .expect("rpc call");
        assert_eq!(result["active"], false);

        let err = crate::client::rpc_call(&socket, "bogus").await.unwrap_err();
        assert!(err.to_string().contains("method not found"), "got {err}");

        server.abort();
    }

    #[tokio::test]
    async fn second_server_on_live_socket_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("driftwatch.sock");
        let socket = socket.to_str().expect("utf-8 path").to_string();

        let _listener = bind_socket(&socket).await.expect("first bind");
        let err = bind_socket(&socket).await.unwrap_err();
        assert!(err.to_string().contains("already running"), "got {err}");
    }

    #[tokio::test]
    async fn stale_socket_is_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("driftwatch.sock");
        let socket = socket.to_str().expect("utf-8 path").to_string();

        drop(bind_socket(&socket).await.expect("first bind"));
        assert!(std::path::Path::new(&socket).exists());
        bind_socket(&socket).await.expect("rebind over stale socket");
    }
}
