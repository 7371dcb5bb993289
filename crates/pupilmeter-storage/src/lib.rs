//! # pupilmeter-storage
//!
//! 확장 테이블 저장소 어댑터.
//! 32비트 테이블을 16비트 3채널 PNG로 패킹하는 코덱, 파일 기반 저장소,
//! 데이터 점검용 CSV 덤프/로드를 제공한다.

pub mod table_csv;
pub mod table_file;
pub mod table_image;
