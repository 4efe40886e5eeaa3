use anyhow::Context as _;
use testingx_core::Context;
use testingx_database::{provision_debuggable, PostgresTestParams};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(host_port: &str) -> anyhow::Result<()> {
    let params = PostgresTestParams::from_env()?;

    // Ctrl-C while the server is still starting aborts the wait
    let cancel = CancellationToken::new();
    let ctx = Context::background().with_cancellation(cancel.clone());
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let instance = match provision_debuggable(&ctx, params, Some(host_port)).await {
        Ok(instance) => instance,
        Err(e) => {
            watcher.abort();
            if let Err(cleanup) = e.cleanup().await {
                if !cleanup.is_not_found() {
                    tracing::warn!(error = %cleanup, "Failed to remove container");
                }
            }
            return Err(e).context("could not start debuggable postgres");
        }
    };

    println!("{}", instance.database_url());
    info!(
        container = %instance.resource().id(),
        expires_in_secs = testingx_database::DEBUG_EXPIRATION_SECS,
        "Postgres is up; press Ctrl-C to stop"
    );

    cancel.cancelled().await;

    instance
        .cleanup()
        .await
        .or_else(|e| if e.is_not_found() { Ok(()) } else { Err(e) })
        .context("failed to remove postgres container")?;
    println!("Removed {}", instance.resource().name());
    Ok(())
}
