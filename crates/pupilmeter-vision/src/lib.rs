//! # pupilmeter-vision
//!
//! 눈 추적 파이프라인의 처리 단계.
//! 타원 피팅 결과로 동공 확장도를 추정하는 추정기와 평활 필터,
//! 다른 앱이 그리는 눈 카메라 창을 캡처하는 캡처 소스를 담당한다.

pub mod capture;
pub mod capture_worker;
pub mod dilation;
pub mod history;
pub mod one_euro;
