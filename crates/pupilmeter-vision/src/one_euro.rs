//! One Euro 적응형 저역 통과 필터.
//!
//! 변화가 느릴 때는 강하게, 빠를 때는 약하게 평활한다.
//! 첫 샘플로 상태를 초기화하므로 첫 출력은 입력과 같다.

use std::time::Instant;

/// N채널 One Euro 필터
#[derive(Debug, Clone)]
pub struct OneEuroFilter<const N: usize> {
    min_cutoff: f64,
    beta: f64,
    d_cutoff: f64,
    state: Option<FilterState<N>>,
}

#[derive(Debug, Clone)]
struct FilterState<const N: usize> {
    x_prev: [f64; N],
    dx_prev: [f64; N],
    t_prev: Instant,
}

/// 샘플 간격과 차단 주파수로 평활 계수 계산
fn smoothing_factor(t_e: f64, cutoff: f64) -> f64 {
    let r = 2.0 * std::f64::consts::PI * cutoff * t_e;
    r / (r + 1.0)
}

fn exponential_smoothing(a: f64, x: f64, x_prev: f64) -> f64 {
    a * x + (1.0 - a) * x_prev
}

impl<const N: usize> OneEuroFilter<N> {
    /// 새 필터 생성 (미분 차단 주파수 1.0)
    pub fn new(min_cutoff: f64, beta: f64) -> Self {
        Self::with_d_cutoff(min_cutoff, beta, 1.0)
    }

    pub fn with_d_cutoff(min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            state: None,
        }
    }

    /// 필터 상태 초기화 (다음 샘플로 다시 시작)
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// 샘플 하나를 필터링.
    ///
    /// 유한하지 않은 입력이나 시간 간격 0이면 이전 출력을 그대로 반환한다.
    pub fn filter(&mut self, x: [f64; N], now: Instant) -> [f64; N] {
        if self.state.is_none() {
            if x.iter().all(|v| v.is_finite()) {
                self.state = Some(FilterState {
                    x_prev: x,
                    dx_prev: [0.0; N],
                    t_prev: now,
                });
            }
            return x;
        }
        let Some(state) = self.state.as_mut() else {
            return x;
        };

        if x.iter().any(|v| !v.is_finite()) {
            return state.x_prev;
        }

        let t_e = now.saturating_duration_since(state.t_prev).as_secs_f64();
        if t_e <= 0.0 {
            return state.x_prev;
        }

        let a_d = smoothing_factor(t_e, self.d_cutoff);
        let mut x_hat = [0.0; N];
        for i in 0..N {
            let dx = (x[i] - state.x_prev[i]) / t_e;
            let dx_hat = exponential_smoothing(a_d, dx, state.dx_prev[i]);
            let cutoff = self.min_cutoff + self.beta * dx_hat.abs();
            let a = smoothing_factor(t_e, cutoff);
            x_hat[i] = exponential_smoothing(a, x[i], state.x_prev[i]);
            state.dx_prev[i] = dx_hat;
        }

        state.x_prev = x_hat;
        state.t_prev = now;
        x_hat
    }
}
