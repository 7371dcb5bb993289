//! 캡처 실행.
//!
//! 캡처 워커를 띄우고 프레임을 요청해 받아 온다.
//! 상태 전환은 로그로 남기고, 필요하면 프레임을 PNG로 저장한다.

use anyhow::{Context, Result};
use pupilmeter_core::models::capture::CaptureState;
use pupilmeter_vision::capture::FrameSource;
use pupilmeter_vision::capture_worker::{CaptureSettings, CaptureWorker, CapturedFrame};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 캡처 실행 옵션
#[derive(Debug, Clone)]
pub struct CaptureRun {
    pub target: String,
    pub frames: u64,
    pub snapshot_dir: Option<PathBuf>,
    pub settings: CaptureSettings,
}

/// 요청한 프레임 수를 받을 때까지 캡처. 받은 프레임 수 반환.
///
/// 종료 신호가 오면 중간에 멈춘다.
pub async fn run_capture<S: FrameSource + 'static>(
    source: S,
    run: CaptureRun,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<u64> {
    if let Some(dir) = &run.snapshot_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("스냅샷 디렉토리 생성 실패: {}", dir.display()))?;
    }

    let (worker, mut handle) = CaptureWorker::new(source, run.target.clone(), run.settings);
    let (worker_shutdown_tx, worker_shutdown_rx) = watch::channel(false);
    let worker_task = tokio::spawn(worker.run(worker_shutdown_rx));

    let mut status_rx = handle.subscribe_status();
    let status_task = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let state = *status_rx.borrow_and_update();
            if state == CaptureState::Disconnected {
                info!("캡처 대상 대기 중 (창을 찾을 수 없음)");
            }
        }
    });

    let mut received = 0u64;
    while received < run.frames {
        handle.request_frame();
        let frame = tokio::select! {
            frame = handle.next_frame() => frame,
            _ = shutdown_rx.changed() => {
                info!("캡처 중단 요청");
                break;
            }
        };
        let Some(frame) = frame else {
            warn!("캡처 워커가 먼저 종료됨");
            break;
        };

        received += 1;
        if let Some(dir) = &run.snapshot_dir {
            let path = save_snapshot(dir, &frame)?;
            debug!("스냅샷 저장: {}", path.display());
        }
        info!(
            "프레임 {} 수신 ({}x{}, {}fps)",
            frame.frame_number,
            frame.image.width(),
            frame.image.height(),
            frame.fps
        );
    }

    worker_shutdown_tx.send_replace(true);
    worker_task.await.context("캡처 워커 태스크 실패")?;
    status_task.abort();

    Ok(received)
}

fn save_snapshot(dir: &Path, frame: &CapturedFrame) -> Result<PathBuf> {
    let path = dir.join(format!(
        "frame_{:06}_{}.png",
        frame.frame_number,
        frame.captured_at.format("%H%M%S%3f")
    ));
    frame
        .image
        .save(&path)
        .with_context(|| format!("스냅샷 저장 실패: {}", path.display()))?;
    Ok(path)
}
