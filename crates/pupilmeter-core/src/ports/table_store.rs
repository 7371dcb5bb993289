//! 확장 테이블 저장소 포트.
//!
//! 구현: `pupilmeter-storage` crate (16비트 PNG 파일)

use crate::error::CoreError;
use crate::models::dilation::{DilationTable, TableShape};

/// 눈 하나의 확장 테이블 영속화
///
/// 추정기는 저장 형식을 모른다. PNG 외의 형식으로 교체해도
/// 이 trait만 구현하면 된다.
pub trait DilationTableStore: Send {
    /// 저장된 테이블 로드.
    ///
    /// 파일이 없으면 `Ok(None)`, 크기 불일치나 손상이면 `Err`.
    fn load(&self, shape: TableShape) -> Result<Option<DilationTable>, CoreError>;

    /// 테이블 저장 (기존 내용 덮어쓰기)
    fn save(&mut self, table: &DilationTable) -> Result<(), CoreError>;

    /// 저장된 테이블 삭제 (없으면 아무 것도 하지 않음)
    fn remove(&mut self) -> Result<(), CoreError>;

    /// 로그용 저장 위치 설명
    fn describe(&self) -> String;
}

/// 메모리 저장소: 영속화 없이 실행하거나 테스트할 때 사용
#[derive(Debug, Default, Clone)]
pub struct MemoryTableStore {
    table: Option<DilationTable>,
    save_count: usize,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 미리 저장된 테이블로 시작
    pub fn with_table(table: DilationTable) -> Self {
        Self {
            table: Some(table),
            save_count: 0,
        }
    }

    /// 지금까지 `save` 호출 횟수
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// 마지막으로 저장된 테이블
    pub fn stored(&self) -> Option<&DilationTable> {
        self.table.as_ref()
    }
}

impl DilationTableStore for MemoryTableStore {
    fn load(&self, shape: TableShape) -> Result<Option<DilationTable>, CoreError> {
        match &self.table {
            None => Ok(None),
            Some(t) if t.shape() == shape => Ok(Some(t.clone())),
            Some(t) => Err(CoreError::TableFormat(format!(
                "크기 불일치: 저장 {}x{}, 요청 {}x{}",
                t.shape().rows,
                t.shape().cols,
                shape.rows,
                shape.cols
            ))),
        }
    }

    fn save(&mut self, table: &DilationTable) -> Result<(), CoreError> {
        self.table = Some(table.clone());
        self.save_count += 1;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), CoreError> {
        self.table = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl<S: DilationTableStore + ?Sized> DilationTableStore for Box<S> {
    fn load(&self, shape: TableShape) -> Result<Option<DilationTable>, CoreError> {
        (**self).load(shape)
    }

    fn save(&mut self, table: &DilationTable) -> Result<(), CoreError> {
        (**self).save(table)
    }

    fn remove(&mut self) -> Result<(), CoreError> {
        (**self).remove()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip_and_count() {
        let shape = TableShape::new(4, 5);
        let mut store = MemoryTableStore::new();
        assert!(store.load(shape).unwrap().is_none());

        let mut table = DilationTable::new(shape);
        table.set(1, 2, 99);
        store.save(&table).unwrap();

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load(shape).unwrap(), Some(table));
    }

    #[test]
    fn memory_store_rejects_other_shape() {
        let store = MemoryTableStore::with_table(DilationTable::new(TableShape::new(4, 5)));
        assert!(store.load(TableShape::new(4, 6)).is_err());
    }

    #[test]
    fn memory_store_remove() {
        let shape = TableShape::new(2, 2);
        let mut store = MemoryTableStore::with_table(DilationTable::new(shape));
        store.remove().unwrap();
        assert!(store.load(shape).unwrap().is_none());
    }
}
