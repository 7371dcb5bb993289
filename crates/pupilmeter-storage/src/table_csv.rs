//! 데이터 점검용 CSV 덤프/로드.
//!
//! 헤더 `x,y,eyedilation` 다음에 0이 아닌 셀을 한 줄씩 기록한다.
//! 예약 열(전역 최대값, ROI)도 일반 셀과 똑같이 기록된다.

use pupilmeter_core::error::CoreError;
use pupilmeter_core::models::dilation::{DilationTable, TableShape};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::debug;

const HEADER: &str = "x,y,eyedilation";

/// 테이블을 CSV 문자열로 변환
pub fn to_csv(table: &DilationTable) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1);
    out.push_str(HEADER);
    out.push('\n');
    for (row, col, value) in table.nonzero() {
        let _ = writeln!(out, "{col},{row},{value}");
    }
    out
}

/// CSV 문자열을 주어진 크기의 테이블로 변환
pub fn from_csv(shape: TableShape, content: &str) -> Result<DilationTable, CoreError> {
    let mut table = DilationTable::new(shape);

    // 첫 줄은 헤더
    for (line_no, line) in content.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [x, y, value] = fields.as_slice() else {
            return Err(CoreError::TableFormat(format!(
                "{}번째 줄: 필드 3개 필요, {}개 발견",
                line_no + 1,
                fields.len()
            )));
        };

        let parse = |field: &str| {
            field.parse::<u32>().map_err(|e| {
                CoreError::TableFormat(format!("{}번째 줄: 숫자 파싱 실패 ({field}): {e}", line_no + 1))
            })
        };
        let (col, row, value) = (parse(*x)?, parse(*y)?, parse(*value)?);

        if row >= shape.rows || col >= shape.cols {
            return Err(CoreError::TableFormat(format!(
                "{}번째 줄: 좌표 ({col}, {row})가 {}x{} 테이블 밖",
                line_no + 1,
                shape.rows,
                shape.cols
            )));
        }
        table.set(row, col, value);
    }

    Ok(table)
}

/// 테이블을 CSV 파일로 저장
pub fn export_csv(table: &DilationTable, path: &Path) -> Result<usize, CoreError> {
    let content = to_csv(table);
    fs::write(path, &content)?;
    let rows = content.lines().count().saturating_sub(1);
    debug!("CSV 덤프: {} ({}행)", path.display(), rows);
    Ok(rows)
}

/// CSV 파일에서 테이블 로드
pub fn import_csv(shape: TableShape, path: &Path) -> Result<DilationTable, CoreError> {
    let content = fs::read_to_string(path)?;
    from_csv(shape, &content)
}
