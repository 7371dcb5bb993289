//! 캡처 워커.
//!
//! 소비자가 프레임을 요청하면 소스에서 한 장을 잡아 큐에 넣는다.
//! 창이 사라지면 `Disconnected`로 전환하고 재시도 간격마다 다시 연결한다.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use pupilmeter_core::config::CaptureConfig;
use pupilmeter_core::models::capture::CaptureState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, info, warn};

use crate::capture::FrameSource;

/// 프레임 요청 신호
///
/// 소비자가 세우고 워커가 잡기 직전에 가져간다.
#[derive(Debug, Default)]
pub struct CaptureSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl CaptureSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 프레임 요청
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// 대기 중인 요청을 가져간다 (있었으면 `true`)
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    /// 처리하지 못한 요청을 다시 세운다
    pub fn restore(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// 요청이 올 때까지 최대 `timeout` 대기하고 가져간다.
    pub async fn take_within(&self, timeout: Duration) -> bool {
        if self.take() {
            return true;
        }
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
        self.take()
    }
}

/// 캡처된 프레임
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: DynamicImage,
    /// 연결 이후 누적 프레임 번호
    pub frame_number: u64,
    pub fps: u32,
    pub captured_at: DateTime<Utc>,
}

/// 워커 동작 설정
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub request_timeout: Duration,
    pub retry_wait: Duration,
    pub fps: u32,
    pub queue_capacity: usize,
}

impl From<&CaptureConfig> for CaptureSettings {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            retry_wait: config.retry_wait(),
            fps: config.fps,
            queue_capacity: config.queue_capacity.max(1),
        }
    }
}

/// 소비자 쪽 핸들
pub struct CaptureHandle {
    signal: Arc<CaptureSignal>,
    frames: mpsc::Receiver<CapturedFrame>,
    status: watch::Receiver<CaptureState>,
    target: watch::Sender<String>,
}

impl CaptureHandle {
    /// 다음 프레임 요청
    pub fn request_frame(&self) {
        self.signal.request();
    }

    /// 큐에서 프레임 수신 (워커 종료 시 `None`)
    pub async fn next_frame(&mut self) -> Option<CapturedFrame> {
        self.frames.recv().await
    }

    pub fn try_next_frame(&mut self) -> Option<CapturedFrame> {
        self.frames.try_recv().ok()
    }

    pub fn status(&self) -> CaptureState {
        *self.status.borrow()
    }

    /// 상태 변경 수신기
    pub fn subscribe_status(&self) -> watch::Receiver<CaptureState> {
        self.status.clone()
    }

    /// 캡처 대상 변경 (다음 루프에서 다시 연결)
    pub fn set_target(&self, target: impl Into<String>) {
        self.target.send_replace(target.into());
    }
}

/// 캡처 워커
pub struct CaptureWorker<S: FrameSource> {
    source: S,
    settings: CaptureSettings,
    signal: Arc<CaptureSignal>,
    frame_tx: mpsc::Sender<CapturedFrame>,
    status_tx: watch::Sender<CaptureState>,
    target_rx: watch::Receiver<String>,
}

impl<S: FrameSource + 'static> CaptureWorker<S> {
    /// 워커와 소비자 핸들 생성
    pub fn new(
        source: S,
        target: impl Into<String>,
        settings: CaptureSettings,
    ) -> (Self, CaptureHandle) {
        let signal = Arc::new(CaptureSignal::new());
        let (frame_tx, frames) = mpsc::channel(settings.queue_capacity.max(1));
        let (status_tx, status) = watch::channel(CaptureState::Connecting);
        let (target, target_rx) = watch::channel(target.into());

        let worker = Self {
            source,
            settings,
            signal: signal.clone(),
            frame_tx,
            status_tx,
            target_rx,
        };
        let handle = CaptureHandle {
            signal,
            frames,
            status,
            target,
        };
        (worker, handle)
    }

    /// 종료 신호까지 캡처 루프 실행
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "캡처 워커 시작: 대상={}, 요청 대기={}ms, 재시도={}ms",
            self.target_rx.borrow().as_str(),
            self.settings.request_timeout.as_millis(),
            self.settings.retry_wait.as_millis()
        );

        let mut frame_number: u64 = 0;
        let mut hooked_target: Option<String> = None;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let target = self.target_rx.borrow().clone();
            let status = *self.status_tx.borrow();
            if status != CaptureState::Connected
                || !self.source.is_hooked()
                || hooked_target.as_deref() != Some(target.as_str())
            {
                // 재시도 중에는 Disconnected 유지
                if status != CaptureState::Disconnected {
                    self.set_status(CaptureState::Connecting);
                }
                match self.connect(&target) {
                    Ok(()) => {
                        frame_number += 1;
                        hooked_target = Some(target);
                        self.set_status(CaptureState::Connected);
                    }
                    Err(e) => {
                        debug!("캡처 대상 연결 실패 ({target}): {e}");
                        self.source.unhook();
                        hooked_target = None;
                        self.set_status(CaptureState::Disconnected);
                        tokio::select! {
                            _ = tokio::time::sleep(self.settings.retry_wait) => {}
                            _ = shutdown_rx.changed() => break,
                        }
                        continue;
                    }
                }
            }

            let requested = tokio::select! {
                requested = self.signal.take_within(self.settings.request_timeout) => requested,
                _ = shutdown_rx.changed() => break,
            };
            if !requested {
                continue;
            }

            match self.source.grab() {
                Ok(image) => {
                    frame_number += 1;
                    let frame = CapturedFrame {
                        image,
                        frame_number,
                        fps: self.settings.fps,
                        captured_at: Utc::now(),
                    };
                    match self.frame_tx.try_send(frame) {
                        Ok(()) => {}
                        Err(TrySendError::Full(frame)) => {
                            warn!("프레임 큐 가득 참, 프레임 {} 버림", frame.frame_number);
                        }
                        Err(TrySendError::Closed(_)) => {
                            info!("프레임 수신자 종료");
                            break;
                        }
                    }

                    let depth = self.frame_tx.max_capacity() - self.frame_tx.capacity();
                    if depth > 1 {
                        warn!("프레임 큐 적체: {depth}개 대기 중");
                    }
                }
                Err(e) => {
                    // 재연결 후 첫 캡처가 이 요청을 처리
                    warn!("프레임 캡처 실패: {e}");
                    self.signal.restore();
                    self.set_status(CaptureState::Disconnected);
                }
            }
        }

        self.source.unhook();
        self.set_status(CaptureState::Disconnected);
        info!("캡처 워커 종료 (누적 프레임 {frame_number})");
    }

    /// 대상에 연결하고 첫 프레임으로 소스를 확인
    fn connect(&mut self, target: &str) -> Result<(), pupilmeter_core::error::CoreError> {
        self.source.hook(target)?;
        self.source.grab()?;
        Ok(())
    }

    fn set_status(&self, state: CaptureState) {
        let previous = self.status_tx.send_replace(state);
        if previous != state {
            match state {
                CaptureState::Disconnected => warn!("캡처 상태: {previous} → {state}"),
                _ => info!("캡처 상태: {previous} → {state}"),
            }
        }
    }
}
