//! # pupilmeter-app
//!
//! pupilmeter CLI 진입점.
//! 설정 로드, 로깅 초기화, 추정기와 저장소 조립, 명령 실행.

mod capture_runner;
mod lifecycle;
mod replay;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pupilmeter_core::config::AppConfig;
use pupilmeter_core::config_manager::{project_dirs, ConfigManager};
use pupilmeter_core::models::dilation::TableShape;
use pupilmeter_core::models::eye::{EyeId, RoiDescriptor};
use pupilmeter_core::models::pupil::FrameShape;
use pupilmeter_core::ports::table_store::DilationTableStore;
use pupilmeter_storage::table_csv::{export_csv, import_csv};
use pupilmeter_storage::table_file::PngTableStore;
use pupilmeter_vision::capture::XcapWindowSource;
use pupilmeter_vision::capture_worker::CaptureSettings;
use pupilmeter_vision::dilation::DilationEstimator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::capture_runner::{run_capture, CaptureRun};
use crate::lifecycle::LifecycleManager;

/// 타원 기반 동공 확장 추정기
#[derive(Parser, Debug)]
#[command(name = "pupilmeter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 테이블 파일 디렉토리 (기본: 플랫폼 데이터 디렉토리)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 관측 CSV를 재생하고 프레임별 확장도 출력
    Replay {
        #[arg(long)]
        eye: EyeId,
        /// `width,height,center_x,center_y,frame_height,frame_width` 행 CSV
        #[arg(long)]
        input: PathBuf,
        /// ROI 덮어쓰기 (`rotation,x,y`)
        #[arg(long)]
        roi: Option<RoiDescriptor>,
    },
    /// 보정 초기화 (테이블 파일 삭제)
    Reset {
        #[arg(long)]
        eye: EyeId,
    },
    /// 테이블을 점검용 CSV로 덤프
    Export {
        #[arg(long)]
        eye: EyeId,
        #[arg(long)]
        frame_width: u32,
        #[arg(long)]
        frame_height: u32,
        #[arg(long)]
        output: PathBuf,
    },
    /// CSV에서 테이블 복원
    Import {
        #[arg(long)]
        eye: EyeId,
        #[arg(long)]
        frame_width: u32,
        #[arg(long)]
        frame_height: u32,
        #[arg(long)]
        input: PathBuf,
    },
    /// 눈 카메라 창에서 프레임 캡처
    Capture {
        #[arg(long)]
        eye: EyeId,
        /// 받을 프레임 수
        #[arg(long, default_value = "1")]
        frames: u64,
        /// 프레임 PNG 저장 디렉토리
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
}

/// 테이블 디렉토리 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/com.pupilmeter.pupilmeter/`
/// - Windows: `%APPDATA%\pupilmeter\pupilmeter\data\`
/// - Linux: `~/.local/share/pupilmeter/`
fn resolve_data_dir(data_dir: Option<&Path>) -> PathBuf {
    data_dir
        .map(Path::to_path_buf)
        .or_else(|| project_dirs().map(|p| p.data_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_config(path: Option<&Path>) -> Result<ConfigManager> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path.to_path_buf()),
        None => ConfigManager::new(),
    }
    .map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    info!("설정 파일: {}", manager.config_path().display());
    Ok(manager)
}

fn table_store(config: &AppConfig, data_dir: &Path, eye: EyeId) -> PngTableStore {
    PngTableStore::in_dir(data_dir, config.dilation.table_file(eye))
}

fn table_shape(frame_width: u32, frame_height: u32) -> TableShape {
    TableShape::for_frame(FrameShape::new(frame_height, frame_width))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "pupilmeter={},pupilmeter_app={},pupilmeter_core={},pupilmeter_vision={},pupilmeter_storage={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(args.config.as_deref())?.into_config();
    let data_dir = resolve_data_dir(args.data_dir.as_deref());
    info!("테이블 디렉토리: {}", data_dir.display());

    match args.command {
        Command::Replay { eye, input, roi } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("입력 파일 읽기 실패: {}", input.display()))?;
            let rows = replay::parse_rows(&content)?;

            let mut estimator =
                DilationEstimator::new(eye, table_store(&config, &data_dir, eye))
                    .with_save_interval(config.dilation.save_interval());
            estimator.configure_roi(roi.unwrap_or_else(|| config.dilation.roi(eye)));

            let frame_interval = Duration::from_secs_f64(1.0 / config.capture.fps as f64);
            let outputs = replay::replay(
                &mut estimator,
                &rows,
                config.dilation.sample_windows(),
                frame_interval,
            );
            estimator.flush();

            for value in outputs {
                println!("{value:.6}");
            }
        }
        Command::Reset { eye } => {
            let mut estimator = DilationEstimator::new(eye, table_store(&config, &data_dir, eye));
            estimator.reset();
            println!("{eye} 보정 초기화 완료");
        }
        Command::Export {
            eye,
            frame_width,
            frame_height,
            output,
        } => {
            let store = table_store(&config, &data_dir, eye);
            let table = store
                .load(table_shape(frame_width, frame_height))
                .map_err(|e| anyhow!("테이블 로드 실패: {e}"))?
                .ok_or_else(|| anyhow!("저장된 테이블 없음: {}", store.describe()))?;
            let rows = export_csv(&table, &output)
                .map_err(|e| anyhow!("CSV 저장 실패: {e}"))?;
            println!("{rows}개 셀을 {}에 저장", output.display());
        }
        Command::Import {
            eye,
            frame_width,
            frame_height,
            input,
        } => {
            let table = import_csv(table_shape(frame_width, frame_height), &input)
                .map_err(|e| anyhow!("CSV 로드 실패: {e}"))?;
            let mut store = table_store(&config, &data_dir, eye);
            store
                .save(&table)
                .map_err(|e| anyhow!("테이블 저장 실패: {e}"))?;
            println!("{} 복원 완료", store.describe());
        }
        Command::Capture {
            eye,
            frames,
            snapshot_dir,
        } => {
            let lifecycle = Arc::new(LifecycleManager::new());
            let signal_lifecycle = lifecycle.clone();
            tokio::spawn(async move { signal_lifecycle.wait_for_signal().await });

            let run = CaptureRun {
                target: config.capture.source(eye).to_string(),
                frames,
                snapshot_dir,
                settings: CaptureSettings::from(&config.capture),
            };
            let source = XcapWindowSource::new(config.capture.border);
            let received = run_capture(source, run, lifecycle.subscribe()).await?;
            if lifecycle.is_shutting_down() {
                println!("중단됨: {received}/{frames}개 프레임 수신");
            } else {
                println!("{received}개 프레임 수신");
            }
        }
    }

    Ok(())
}
