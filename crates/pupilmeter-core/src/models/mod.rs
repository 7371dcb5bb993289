//! pupilmeter 도메인 모델.
//!
//! 추정기, 저장소, 캡처 어댑터가 공유하는 데이터 구조체를 정의한다.

pub mod capture;
pub mod dilation;
pub mod eye;
pub mod pupil;
