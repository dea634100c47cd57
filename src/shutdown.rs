use anyhow::Context;
use tokio::signal::unix::{SignalKind, signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Resolves on Ctrl+C or SIGTERM, whichever comes first.
pub async fn wait_for_signal() -> Result<ShutdownSignal, anyhow::Error> {
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to wait for Ctrl+C signal")?;
            Ok(ShutdownSignal::Interrupt)
        }
        _ = terminate.recv() => Ok(ShutdownSignal::Terminate),
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_sigterm_is_a_shutdown_signal() {
        let waiter = tokio::spawn(wait_for_signal());
        // Let the handler register before the signal arrives.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let status = Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let received = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(received, ShutdownSignal::Terminate);
    }
}
