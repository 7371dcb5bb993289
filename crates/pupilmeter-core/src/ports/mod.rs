//! 포트 인터페이스 (trait).
//!
//! 추정기는 이 trait들에만 의존하며,
//! 구체 구현은 `pupilmeter-storage` 등 어댑터 crate가 제공한다.

pub mod table_store;
