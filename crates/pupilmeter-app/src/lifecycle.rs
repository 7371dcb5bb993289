//! 라이프사이클 관리.
//!
//! 종료 신호 전파, 시그널 핸들링.

use tokio::sync::watch;
use tracing::{info, warn};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM)
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match (
                signal(SignalKind::interrupt()),
                signal(SignalKind::terminate()),
            ) {
                (Ok(mut sigint), Ok(mut sigterm)) => {
                    tokio::select! {
                        _ = sigint.recv() => info!("SIGINT 수신"),
                        _ = sigterm.recv() => info!("SIGTERM 수신"),
                    }
                }
                _ => {
                    warn!("시그널 핸들러 등록 실패, Ctrl+C만 대기");
                    Self::wait_ctrl_c().await;
                }
            }
        }

        #[cfg(not(unix))]
        Self::wait_ctrl_c().await;

        self.shutdown();
    }

    /// 등록에 실패하면 신호 없이 계속 대기
    async fn wait_ctrl_c() {
        Self::wait_or_park(tokio::signal::ctrl_c()).await;
    }

    async fn wait_or_park<F>(signal: F)
    where
        F: std::future::Future<Output = std::io::Result<()>>,
    {
        match signal.await {
            Ok(()) => info!("Ctrl+C 수신"),
            Err(e) => {
                warn!("Ctrl+C 핸들러 등록 실패: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_creation() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        assert!(!*rx.borrow());
        assert!(!lm.is_shutting_down());
    }

    #[tokio::test]
    async fn shutdown_reaches_subscribers() {
        let lm = LifecycleManager::new();
        let mut rx = lm.subscribe();
        lm.shutdown();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(lm.is_shutting_down());
    }

    #[tokio::test]
    async fn failed_signal_registration_does_not_shut_down() {
        let failed = async { Err(std::io::Error::other("등록 불가")) };
        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            LifecycleManager::wait_or_park(failed),
        )
        .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn received_signal_returns() {
        LifecycleManager::wait_or_park(async { Ok(()) }).await;
    }
}
