//! 동공 타원 관측과 프레임 크기.

use serde::{Deserialize, Serialize};

/// 타원 피팅으로 검출된 동공
///
/// 중심 좌표가 음수이면 이번 프레임에서 동공을 찾지 못한 것으로 본다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PupilEllipse {
    /// 타원 폭 (px)
    pub width: f64,
    /// 타원 높이 (px)
    pub height: f64,
    /// 중심 x (ROI 크롭 프레임 기준)
    pub center_x: f64,
    /// 중심 y (ROI 크롭 프레임 기준)
    pub center_y: f64,
}

impl PupilEllipse {
    pub fn new(width: f64, height: f64, center_x: f64, center_y: f64) -> Self {
        Self {
            width,
            height,
            center_x,
            center_y,
        }
    }

    /// 검출 실패 여부
    pub fn is_undetected(&self) -> bool {
        self.center_x < 0.0 || self.center_y < 0.0
    }

    /// 타원 면적 = π × (w/2) × (h/2)
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * (self.width / 2.0) * (self.height / 2.0)
    }
}

/// ROI 크롭된 흑백 프레임 크기
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameShape {
    /// 프레임 높이 (행 수)
    pub height: u32,
    /// 프레임 폭 (열 수)
    pub width: u32,
}

impl FrameShape {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}

/// 이력 버퍼 길이
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleWindows {
    /// 이상치(깜빡임) 판정용 원시 면적 이력 길이
    pub filter_samples: usize,
    /// 출력 평균용 이력 길이 (0이면 평균 생략)
    pub output_samples: usize,
}

impl SampleWindows {
    pub fn new(filter_samples: usize, output_samples: usize) -> Self {
        Self {
            filter_samples,
            output_samples,
        }
    }
}
