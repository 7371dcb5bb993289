//! 애플리케이션 설정 구조체.
//!
//! 동공 확장 추정 파라미터, 테이블 파일 위치, 캡처 소스 설정을 정의한다.
//! `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::models::eye::{EyeId, RoiDescriptor};
use crate::models::pupil::SampleWindows;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 동공 확장 추정 설정
    #[serde(default)]
    pub dilation: DilationConfig,
    /// 캡처 소스 설정
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.dilation.save_interval_secs == 0 {
            return Err(CoreError::Validation {
                field: "dilation.save_interval_secs".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        if self.capture.fps == 0 {
            return Err(CoreError::Validation {
                field: "capture.fps".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        if self.capture.queue_capacity == 0 {
            return Err(CoreError::Validation {
                field: "capture.queue_capacity".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        if self.dilation.left_file == self.dilation.right_file {
            return Err(CoreError::Validation {
                field: "dilation.right_file".to_string(),
                message: "왼쪽/오른쪽 테이블 파일이 같음".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================
// 동공 확장 설정
// ============================================================

/// 동공 확장 추정 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DilationConfig {
    /// 깜빡임 이상치 판정용 이력 길이
    #[serde(default = "default_filter_samples")]
    pub filter_samples: usize,
    /// 출력 평균 이력 길이 (0 = 평균 생략)
    #[serde(default)]
    pub output_samples: usize,
    /// 테이블 저장 최소 간격 (초)
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,
    /// 왼쪽 눈 테이블 파일 이름 (데이터 디렉토리 기준)
    #[serde(default = "default_left_file")]
    pub left_file: String,
    /// 오른쪽 눈 테이블 파일 이름
    #[serde(default = "default_right_file")]
    pub right_file: String,
    /// 왼쪽 눈 ROI
    #[serde(default)]
    pub left_roi: RoiDescriptor,
    /// 오른쪽 눈 ROI
    #[serde(default)]
    pub right_roi: RoiDescriptor,
}

impl Default for DilationConfig {
    fn default() -> Self {
        Self {
            filter_samples: default_filter_samples(),
            output_samples: 0,
            save_interval_secs: default_save_interval_secs(),
            left_file: default_left_file(),
            right_file: default_right_file(),
            left_roi: RoiDescriptor::default(),
            right_roi: RoiDescriptor::default(),
        }
    }
}

impl DilationConfig {
    /// 눈별 테이블 파일 이름
    pub fn table_file(&self, eye: EyeId) -> &str {
        match eye {
            EyeId::Left => &self.left_file,
            EyeId::Right => &self.right_file,
        }
    }

    /// 눈별 ROI
    pub fn roi(&self, eye: EyeId) -> RoiDescriptor {
        match eye {
            EyeId::Left => self.left_roi,
            EyeId::Right => self.right_roi,
        }
    }

    pub fn sample_windows(&self) -> SampleWindows {
        SampleWindows::new(self.filter_samples, self.output_samples)
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }
}

fn default_filter_samples() -> usize {
    400
}

fn default_save_interval_secs() -> u64 {
    15
}

fn default_left_file() -> String {
    EyeId::Left.default_table_file().to_string()
}

fn default_right_file() -> String {
    EyeId::Right.default_table_file().to_string()
}

// ============================================================
// 캡처 설정
// ============================================================

/// 캡처 이미지에서 잘라낼 창 테두리 (px)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderInsets {
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub bottom: u32,
}

/// 캡처 소스 설정: 다른 앱이 그리는 눈 카메라 창을 캡처
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 왼쪽 눈 창 제목
    #[serde(default = "default_left_source")]
    pub left_source: String,
    /// 오른쪽 눈 창 제목
    #[serde(default = "default_right_source")]
    pub right_source: String,
    /// 캡처 요청 대기 주기 (밀리초): 취소 신호 확인 간격
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 창 후킹 실패 후 재시도 대기 (밀리초)
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,
    /// 보고할 프레임 레이트
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// 프레임 큐 용량
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// 잘라낼 창 테두리
    #[serde(default)]
    pub border: BorderInsets,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            left_source: default_left_source(),
            right_source: default_right_source(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_wait_ms: default_retry_wait_ms(),
            fps: default_fps(),
            queue_capacity: default_queue_capacity(),
            border: BorderInsets::default(),
        }
    }
}

impl CaptureConfig {
    /// 눈별 캡처 대상 창 제목
    pub fn source(&self, eye: EyeId) -> &str {
        match eye {
            EyeId::Left => &self.left_source,
            EyeId::Right => &self.right_source,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }
}

fn default_left_source() -> String {
    "draw Image1".to_string()
}

fn default_right_source() -> String {
    "draw Image2".to_string()
}

fn default_request_timeout_ms() -> u64 {
    20
}

fn default_retry_wait_ms() -> u64 {
    100
}

fn default_fps() -> u32 {
    120
}

fn default_queue_capacity() -> usize {
    4
}
