//! pupilmeter 핵심 에러 타입.
//!
//! 어댑터 crate는 외부 에러를 `map_err`로 `CoreError`에 매핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 테이블 포맷, 캡처 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Window", "DilationTable")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 이미지 인코딩/디코딩 실패
    #[error("이미지 에러: {0}")]
    Image(String),

    /// 저장된 확장 테이블 형식 불일치 (크기, 채널, 비트 깊이)
    #[error("테이블 형식 오류: {0}")]
    TableFormat(String),

    /// 캡처 소스 에러 (창 미발견, 캡처 실패)
    #[error("캡처 에러: {0}")]
    Capture(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}
