//! 동공 확장 테이블 모델.
//!
//! 프레임 픽셀마다 관측된 최소 동공 면적을 `u32`로 보관하는 2차원 격자.
//! 폭이 프레임보다 1열 넓으며, 마지막 예약 열의 0~3행에
//! 전역 최대 면적과 ROI 서술자(회전, x, y)를 저장한다.

use crate::error::CoreError;
use crate::models::eye::RoiDescriptor;
use crate::models::pupil::FrameShape;

/// 예약 열에서 전역 최대값이 저장되는 행
const GLOBAL_MAX_ROW: u32 = 0;

/// 예약 열에서 ROI(회전, x, y)가 시작되는 행
const ROI_FIRST_ROW: u32 = 1;

/// 테이블 크기 (행, 열)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    /// 행 수 = 프레임 높이
    pub rows: u32,
    /// 열 수 = 프레임 폭 + 1
    pub cols: u32,
}

impl TableShape {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// 프레임 크기에 대응하는 테이블 크기 (예약 열 1개 추가)
    pub fn for_frame(frame: FrameShape) -> Self {
        Self::new(frame.height, frame.width.saturating_add(1))
    }

    /// 셀 개수
    pub fn len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 예약 열 인덱스
    pub fn reserved_col(&self) -> u32 {
        self.cols.saturating_sub(1)
    }
}

/// 동공 확장 테이블
///
/// 셀 값 0은 "관측 전"을 뜻한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DilationTable {
    shape: TableShape,
    cells: Vec<u32>,
}

impl DilationTable {
    /// 모든 셀이 0인 새 테이블
    pub fn new(shape: TableShape) -> Self {
        Self {
            shape,
            cells: vec![0; shape.len()],
        }
    }

    /// 행 우선 셀 벡터로 테이블 생성
    pub fn from_cells(shape: TableShape, cells: Vec<u32>) -> Result<Self, CoreError> {
        if cells.len() != shape.len() {
            return Err(CoreError::TableFormat(format!(
                "셀 개수 불일치: {}x{} 테이블에 {}개",
                shape.rows,
                shape.cols,
                cells.len()
            )));
        }
        Ok(Self { shape, cells })
    }

    pub fn shape(&self) -> TableShape {
        self.shape
    }

    /// 행 우선 셀 슬라이스
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.shape.rows && col < self.shape.cols)
            .then(|| row as usize * self.shape.cols as usize + col as usize)
    }

    /// 셀 값 (범위 밖이면 0)
    pub fn get(&self, row: u32, col: u32) -> u32 {
        self.index(row, col).map(|i| self.cells[i]).unwrap_or(0)
    }

    /// 셀 값 설정 (범위 밖이면 무시)
    pub fn set(&mut self, row: u32, col: u32, value: u32) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = value;
        }
    }

    /// 예약 열에 저장된 전역 최대 면적
    pub fn global_max(&self) -> u32 {
        self.get(GLOBAL_MAX_ROW, self.shape.reserved_col())
    }

    /// 예약 열에 저장된 ROI 서술자 (행이 없으면 0)
    pub fn roi(&self) -> RoiDescriptor {
        let col = self.shape.reserved_col();
        let mut values = [0i32; 3];
        for (offset, slot) in values.iter_mut().enumerate() {
            *slot = self.get(ROI_FIRST_ROW + offset as u32, col) as i32;
        }
        RoiDescriptor::from_array(values)
    }

    /// 전역 최대 면적과 ROI를 예약 열에 기록
    ///
    /// 음수 ROI 값은 비트 그대로 `u32`로 저장된다.
    pub fn write_metadata(&mut self, global_max: u32, roi: RoiDescriptor) {
        let col = self.shape.reserved_col();
        self.set(GLOBAL_MAX_ROW, col, global_max);
        for (offset, value) in roi.to_array().into_iter().enumerate() {
            self.set(ROI_FIRST_ROW + offset as u32, col, value as u32);
        }
    }

    /// 0이 아닌 셀 순회 (행, 열, 값)
    pub fn nonzero(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let cols = self.shape.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(move |(i, &v)| ((i as u32) / cols, (i as u32) % cols, v))
    }
}
