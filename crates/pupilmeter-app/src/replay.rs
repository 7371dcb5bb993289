//! 관측 기록 리플레이.
//!
//! 타원 피팅 결과 CSV를 한 줄씩 추정기에 넣어 확장도를 계산한다.
//! 행 형식: `width,height,center_x,center_y,frame_height,frame_width`
//! (`#` 주석과 숫자가 아닌 첫 줄 헤더는 건너뜀)

use anyhow::{bail, Context, Result};
use pupilmeter_core::models::pupil::{FrameShape, PupilEllipse, SampleWindows};
use pupilmeter_core::ports::table_store::DilationTableStore;
use pupilmeter_vision::dilation::DilationEstimator;
use std::time::{Duration, Instant};
use tracing::debug;

/// 관측 한 건
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayRow {
    pub ellipse: PupilEllipse,
    pub frame: FrameShape,
}

/// CSV 내용 파싱
pub fn parse_rows(content: &str) -> Result<Vec<ReplayRow>> {
    let mut rows = Vec::new();
    let mut header_checked = false;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if !header_checked {
            header_checked = true;
            if fields.first().is_some_and(|f| f.parse::<f64>().is_err()) {
                continue;
            }
        }

        if fields.len() != 6 {
            bail!("{}번째 줄: 필드 6개 필요, {}개 발견", line_no + 1, fields.len());
        }

        let mut numbers = [0f64; 4];
        for (slot, field) in numbers.iter_mut().zip(&fields[..4]) {
            *slot = field
                .parse()
                .with_context(|| format!("{}번째 줄: 숫자 파싱 실패 ({field})", line_no + 1))?;
        }
        let frame_height: u32 = fields[4]
            .parse()
            .with_context(|| format!("{}번째 줄: 프레임 높이 파싱 실패", line_no + 1))?;
        let frame_width: u32 = fields[5]
            .parse()
            .with_context(|| format!("{}번째 줄: 프레임 폭 파싱 실패", line_no + 1))?;

        let [width, height, center_x, center_y] = numbers;
        rows.push(ReplayRow {
            ellipse: PupilEllipse::new(width, height, center_x, center_y),
            frame: FrameShape::new(frame_height, frame_width),
        });
    }

    Ok(rows)
}

/// 관측을 프레임 간격 시계로 재생하고 확장도 목록 반환
pub fn replay<S: DilationTableStore>(
    estimator: &mut DilationEstimator<S>,
    rows: &[ReplayRow],
    windows: SampleWindows,
    frame_interval: Duration,
) -> Vec<f64> {
    let mut now = Instant::now();
    let mut outputs = Vec::with_capacity(rows.len());
    for row in rows {
        outputs.push(estimator.estimate_at(&row.ellipse, row.frame, windows, now));
        // 시계 끝에 닿으면 마지막 시각 유지
        now = now.checked_add(frame_interval).unwrap_or(now);
    }

    debug!("[{}] 리플레이 {}건 완료", estimator.eye(), outputs.len());
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pupilmeter_core::models::eye::EyeId;
    use pupilmeter_core::ports::table_store::MemoryTableStore;

    const SAMPLE: &str = "\
# left eye recording
width,height,center_x,center_y,frame_height,frame_width
20,18,40.5,30.2,120,160
22,20,40.5,30.2,120,160
0,0,-1,-1,120,160
";

    #[test]
    fn parses_rows_skipping_header_and_comments() {
        let rows = parse_rows(SAMPLE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].ellipse, PupilEllipse::new(20.0, 18.0, 40.5, 30.2));
        assert_eq!(rows[0].frame, FrameShape::new(120, 160));
        assert!(rows[2].ellipse.is_undetected());
    }

    #[test]
    fn header_is_optional() {
        let rows = parse_rows("20,18,1,1,10,10\n").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn malformed_row_is_rejected() {
        assert!(parse_rows("20,18,1,1,10\n").is_err());
        assert!(parse_rows("20,18,1,1,10,x\n").is_err());
        assert!(parse_rows("20,18,1,1,10,10\n20,abc,1,1,10,10\n").is_err());
    }

    #[test]
    fn replay_produces_one_output_per_row() {
        let rows = parse_rows(SAMPLE).unwrap();
        let mut estimator = DilationEstimator::new(EyeId::Left, MemoryTableStore::new());
        let outputs = replay(
            &mut estimator,
            &rows,
            SampleWindows::new(400, 0),
            Duration::from_millis(8),
        );

        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0], 0.5);
        assert!(outputs.iter().all(|v| (0.0..=1.0).contains(v)));
        // 검출 실패 행은 직전 값 반복
        assert_eq!(outputs[2], outputs[1]);
    }

    #[test]
    fn oversized_frame_interval_keeps_last_instant() {
        let rows = parse_rows(SAMPLE).unwrap();
        let mut estimator = DilationEstimator::new(EyeId::Left, MemoryTableStore::new());
        let outputs = replay(&mut estimator, &rows, SampleWindows::new(400, 0), Duration::MAX);

        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
