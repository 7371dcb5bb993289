//! 확장 테이블 ↔ 16비트 PNG 코덱.
//!
//! 32비트 셀을 16비트 채널 두 개로 나눠 담는다.
//! 기존 파일과 호환되도록 BGR 순서를 따른다:
//! 파란 채널 = 하위 16비트, 초록 채널 = 상위 16비트, 빨간 채널 = 0.

use image::{DynamicImage, ImageBuffer, Rgb};
use pupilmeter_core::error::CoreError;
use pupilmeter_core::models::dilation::{DilationTable, TableShape};

/// 16비트 RGB 이미지 버퍼
pub type TableImage = ImageBuffer<Rgb<u16>, Vec<u16>>;

const LOW_MASK: u32 = 0xFFFF;

/// 셀 하나를 픽셀로 패킹
#[inline]
fn pack_cell(value: u32) -> Rgb<u16> {
    Rgb([0, (value >> 16) as u16, (value & LOW_MASK) as u16])
}

/// 픽셀 하나를 셀 값으로 복원
#[inline]
fn unpack_cell(pixel: &Rgb<u16>) -> u32 {
    ((pixel[1] as u32) << 16) | pixel[2] as u32
}

/// 테이블을 이미지로 인코딩 (폭 = 열 수, 높이 = 행 수)
pub fn encode_table(table: &DilationTable) -> TableImage {
    let shape = table.shape();
    ImageBuffer::from_fn(shape.cols, shape.rows, |x, y| pack_cell(table.get(y, x)))
}

/// 이미지를 테이블로 디코딩
///
/// 16비트 RGB가 아니면 손상된 파일로 본다.
pub fn decode_table(image: &DynamicImage) -> Result<DilationTable, CoreError> {
    let buffer = match image {
        DynamicImage::ImageRgb16(buffer) => buffer,
        other => {
            return Err(CoreError::TableFormat(format!(
                "16비트 RGB 이미지가 아님: {:?}",
                other.color()
            )))
        }
    };

    let shape = TableShape::new(buffer.height(), buffer.width());
    let cells = buffer.pixels().map(unpack_cell).collect();
    DilationTable::from_cells(shape, cells)
}
