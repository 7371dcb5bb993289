//! 눈 식별자와 ROI 서술자.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 눈 식별자: 눈마다 별도의 확장 테이블 파일을 사용한다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeId {
    /// 왼쪽 눈
    Left,
    /// 오른쪽 눈
    Right,
}

impl EyeId {
    /// 기본 테이블 파일 이름
    pub fn default_table_file(self) -> &'static str {
        match self {
            EyeId::Left => "EBPD_LEFT.png",
            EyeId::Right => "EBPD_RIGHT.png",
        }
    }

    /// 캡처 소스 인덱스 (왼쪽 0, 오른쪽 1)
    pub fn index(self) -> usize {
        match self {
            EyeId::Left => 0,
            EyeId::Right => 1,
        }
    }
}

impl fmt::Display for EyeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeId::Left => write!(f, "left"),
            EyeId::Right => write!(f, "right"),
        }
    }
}

impl std::str::FromStr for EyeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(EyeId::Left),
            "right" | "r" => Ok(EyeId::Right),
            other => Err(format!("알 수 없는 눈 식별자: {other}")),
        }
    }
}

/// ROI 서술자: 눈 카메라 프레임의 크롭 영역 (회전, x 오프셋, y 오프셋)
///
/// 테이블은 자신이 만들어진 ROI와 현재 ROI가 같을 때만 유효하다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoiDescriptor {
    /// 회전 (도)
    pub rotation: i32,
    /// 크롭 x 오프셋
    pub x: i32,
    /// 크롭 y 오프셋
    pub y: i32,
}

impl RoiDescriptor {
    pub fn new(rotation: i32, x: i32, y: i32) -> Self {
        Self { rotation, x, y }
    }

    /// 테이블 예약 열 저장 순서 (회전, x, y)
    pub fn to_array(self) -> [i32; 3] {
        [self.rotation, self.x, self.y]
    }

    pub fn from_array(values: [i32; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

impl std::str::FromStr for RoiDescriptor {
    type Err = String;

    /// `"회전,x,y"` 형식 파싱
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("ROI 형식은 rotation,x,y 이어야 함: {s}"));
        }
        let mut values = [0i32; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|e| format!("ROI 값 파싱 실패 ({part}): {e}"))?;
        }
        Ok(Self::from_array(values))
    }
}
