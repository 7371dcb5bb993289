//! 캡처 소스 상태 모델.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 캡처 소스 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    /// 대상 창 후킹 시도 중
    Connecting,
    /// 후킹 완료, 프레임 제공 가능
    Connected,
    /// 대상 창 없음 또는 캡처 실패 (재시도 대기)
    Disconnected,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Connecting => write!(f, "Connecting"),
            CaptureState::Connected => write!(f, "Connected"),
            CaptureState::Disconnected => write!(f, "Disconnected"),
        }
    }
}
