//! 고정 길이 샘플 이력.
//!
//! 용량에 도달하면 가장 오래된 샘플을 버린다.

use std::collections::VecDeque;

/// 슬라이딩 윈도우 샘플 버퍼
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    samples: VecDeque<f64>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 샘플 추가. 용량이 0이면 아무 것도 저장하지 않는다.
    ///
    /// 용량은 호출마다 달라질 수 있으며, 줄어들면 오래된 샘플부터 버린다.
    pub fn push(&mut self, value: f64, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while self.samples.len() >= capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// 산술 평균 (비어 있으면 None)
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// 선형 보간 백분위수 (`q`: 0~100).
    ///
    /// 비어 있거나 유한하지 않은 샘플이 있으면 None.
    pub fn percentile(&self, q: f64) -> Option<f64> {
        if self.samples.is_empty() || self.samples.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = rank - lo as f64;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
    }
}
