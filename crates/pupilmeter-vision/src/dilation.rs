//! 타원 기반 동공 확장 추정기.
//!
//! 프레임마다 검출된 동공 타원 면적을 픽셀별 최소 면적 테이블과
//! 전역 최대 면적으로 정규화하여 0~1 확장도를 만든다.
//!
//! - 픽셀 테이블: 동공 중심 픽셀에서 본 가장 작은 면적 (매 프레임 +5000 드리프트)
//! - 전역 최대: 가장 큰 면적 (매 프레임 -5 감쇠)
//! - 깜빡임 이상치는 전역 최대로 대체
//! - 테이블은 변경이 있을 때 저장 간격마다 한 번 영속화
//!
//! `estimate`는 에러를 반환하지 않는다. 최악의 경우 이전 값이나 0.5를 돌려준다.

use pupilmeter_core::models::dilation::{DilationTable, TableShape};
use pupilmeter_core::models::eye::{EyeId, RoiDescriptor};
use pupilmeter_core::models::pupil::{FrameShape, PupilEllipse, SampleWindows};
use pupilmeter_core::ports::table_store::DilationTableStore;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::history::SampleWindow;
use crate::one_euro::OneEuroFilter;

/// 기본 테이블 저장 간격
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(15);

/// 픽셀 최소값이 갱신되지 않을 때 매 프레임 더하는 드리프트 (px²)
const CELL_DRIFT: u32 = 5000;

/// 전역 최대값 감쇠/갱신 보정 (px²)
const GLOBAL_MAX_DRIFT: u32 = 5;

/// 깜빡임 판정 백분위수
const OUTLIER_PERCENTILE: f64 = 99.0;

/// 정규화 불가 시 중립 확장도
const NEUTRAL_DILATION: f64 = 0.5;

/// 출력 평활 필터 파라미터
const FILTER_MIN_CUTOFF: f64 = 0.00001;
const FILTER_BETA: f64 = 0.05;

/// 마지막 `estimate` 호출이 테이블에 한 일
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// 호출 전 상태 (아직 관측 없음)
    None,
    /// 검출 실패 또는 잘못된 프레임: 상태 변경 없음
    Skipped,
    /// 해당 픽셀 첫 관측: 면적만 기록, 이전 출력 재사용
    FirstAtCell,
    /// 기존 값 갱신 후 확장도 계산
    Updated,
}

/// 눈 하나의 동공 확장 추정기
///
/// 눈마다 인스턴스를 하나씩 만들어 호출자가 소유한다.
pub struct DilationEstimator<S: DilationTableStore> {
    eye: EyeId,
    store: S,
    table: Option<DilationTable>,
    /// 가장 큰(가장 닫힌) 동공 면적 추정값
    global_max: u32,
    /// 다음 호출부터 적용할 ROI
    active_roi: RoiDescriptor,
    /// 현재 테이블이 만들어진 ROI
    table_roi: RoiDescriptor,
    prev_output: f64,
    area_window: SampleWindow,
    output_window: SampleWindow,
    last_save: Option<Instant>,
    save_interval: Duration,
    filter: OneEuroFilter<2>,
    last_observation: Observation,
}

impl<S: DilationTableStore> DilationEstimator<S> {
    /// 새 추정기 생성. 테이블은 첫 호출 때 로드된다.
    pub fn new(eye: EyeId, store: S) -> Self {
        Self {
            eye,
            store,
            table: None,
            global_max: 0,
            active_roi: RoiDescriptor::default(),
            table_roi: RoiDescriptor::default(),
            prev_output: NEUTRAL_DILATION,
            area_window: SampleWindow::new(),
            output_window: SampleWindow::new(),
            last_save: None,
            save_interval: DEFAULT_SAVE_INTERVAL,
            filter: OneEuroFilter::new(FILTER_MIN_CUTOFF, FILTER_BETA),
            last_observation: Observation::None,
        }
    }

    /// 테이블 저장 간격 변경
    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn eye(&self) -> EyeId {
        self.eye
    }

    /// 현재 ROI 설정. 다음 호출에서 테이블 ROI와 다르면 테이블을 새로 만든다.
    pub fn configure_roi(&mut self, roi: RoiDescriptor) {
        if roi != self.active_roi {
            debug!("[{}] ROI 변경: {:?} → {:?}", self.eye, self.active_roi, roi);
        }
        self.active_roi = roi;
    }

    pub fn roi(&self) -> RoiDescriptor {
        self.active_roi
    }

    /// 보정 초기화: 테이블과 이력을 비우고 저장 파일을 삭제한다
    pub fn reset(&mut self) {
        self.table = None;
        self.global_max = 0;
        self.area_window.clear();
        self.output_window.clear();
        if let Err(e) = self.store.remove() {
            warn!("[{}] 테이블 삭제 실패 ({}): {e}", self.eye, self.store.describe());
        }
        info!("[{}] 동공 확장 보정 초기화", self.eye);
    }

    /// 저장 간격과 무관하게 현재 테이블 즉시 저장 (종료 시 사용)
    ///
    /// 주기 저장 시계는 건드리지 않는다.
    pub fn flush(&mut self) {
        if self.table.is_some() {
            self.persist();
        }
    }

    pub fn table(&self) -> Option<&DilationTable> {
        self.table.as_ref()
    }

    pub fn global_max(&self) -> u32 {
        self.global_max
    }

    /// 마지막으로 반환한 확장도
    pub fn previous_output(&self) -> f64 {
        self.prev_output
    }

    pub fn last_observation(&self) -> Observation {
        self.last_observation
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 현재 시각 기준 확장도 추정
    pub fn estimate(
        &mut self,
        ellipse: &PupilEllipse,
        frame: FrameShape,
        windows: SampleWindows,
    ) -> f64 {
        self.estimate_at(ellipse, frame, windows, Instant::now())
    }

    /// 주어진 시각 기준 확장도 추정 (0~1)
    pub fn estimate_at(
        &mut self,
        ellipse: &PupilEllipse,
        frame: FrameShape,
        windows: SampleWindows,
        now: Instant,
    ) -> f64 {
        if frame.is_empty() {
            warn!("[{}] 빈 프레임 크기: {:?}", self.eye, frame);
            self.last_observation = Observation::Skipped;
            return self.prev_output;
        }

        self.ensure_table(frame);
        let last_save = *self.last_save.get_or_insert(now);

        if ellipse.is_undetected() {
            self.last_observation = Observation::Skipped;
            return self.prev_output;
        }

        let area = self.suppress_outlier(ellipse.area(), windows.filter_samples);
        let (row, col, in_bounds) = nearest_cell(ellipse, frame);

        let Some(table) = self.table.as_mut() else {
            self.last_observation = Observation::Skipped;
            return self.prev_output;
        };

        let previous = table.get(row, col);
        let stored = if in_bounds { previous } else { 0 };
        let first_at_cell = stored == 0;
        let cell = if first_at_cell || area < stored as f64 {
            to_cell(area)
        } else {
            stored.saturating_add(CELL_DRIFT).max(1)
        };
        table.set(row, col, cell);
        let changed = cell != previous;

        self.update_global_max(area);

        let dilation = if first_at_cell {
            self.last_observation = Observation::FirstAtCell;
            self.prev_output
        } else {
            self.last_observation = Observation::Updated;
            let raw = normalize(area, cell as f64, self.global_max as f64);
            self.average_output(raw, windows.output_samples)
        };
        let dilation = dilation.clamp(0.0, 1.0);

        if changed && now.saturating_duration_since(last_save) >= self.save_interval {
            self.persist();
            self.last_save = Some(now);
        }

        let [a, b] = self.filter.filter([dilation, dilation], now);
        let output = ((a + b) / 2.0).clamp(0.0, 1.0);
        self.prev_output = output;
        output
    }

    /// 테이블 준비: 없으면 로드, 크기나 ROI가 바뀌었으면 새로 생성
    fn ensure_table(&mut self, frame: FrameShape) {
        let shape = TableShape::for_frame(frame);
        match self.table.as_ref().map(DilationTable::shape) {
            None => self.load_or_create(shape),
            Some(current) if current != shape => {
                info!(
                    "[{}] 프레임 크기 변경 ({}x{} → {}x{}), 테이블 재생성",
                    self.eye, current.rows, current.cols, shape.rows, shape.cols
                );
                self.create_table(shape);
            }
            Some(_) if self.table_roi != self.active_roi => {
                info!("[{}] ROI 변경, 테이블 재생성", self.eye);
                self.create_table(shape);
            }
            Some(_) => {}
        }
    }

    fn load_or_create(&mut self, shape: TableShape) {
        match self.store.load(shape) {
            Ok(Some(table)) if table.roi() != self.active_roi => {
                info!(
                    "[{}] 저장된 ROI {:?}가 현재 ROI {:?}와 다름, 테이블 재생성",
                    self.eye,
                    table.roi(),
                    self.active_roi
                );
                self.create_table(shape);
            }
            Ok(Some(table)) => {
                info!(
                    "[{}] 동공 확장 테이블 로드: {}",
                    self.eye,
                    self.store.describe()
                );
                self.global_max = table.global_max();
                self.table_roi = table.roi();
                self.table = Some(table);
            }
            Ok(None) => self.create_table(shape),
            Err(e) => {
                warn!(
                    "[{}] 테이블 파일 사용 불가 ({}): {e}",
                    self.eye,
                    self.store.describe()
                );
                self.create_table(shape);
            }
        }
    }

    fn create_table(&mut self, shape: TableShape) {
        info!(
            "[{}] 동공 확장 테이블 초기화 ({}x{})",
            self.eye, shape.rows, shape.cols
        );
        self.table = Some(DilationTable::new(shape));
        self.global_max = 0;
        self.table_roi = self.active_roi;
    }

    /// 이력 99번째 백분위수 이상이면 깜빡임으로 보고 전역 최대로 대체
    fn suppress_outlier(&mut self, area: f64, capacity: usize) -> f64 {
        if capacity == 0 {
            return area;
        }
        self.area_window.push(area, capacity);

        match self.area_window.percentile(OUTLIER_PERCENTILE) {
            Some(threshold) if self.global_max > 0 && area >= threshold => {
                debug!(
                    "[{}] 깜빡임 추정: 면적 {area:.1} ≥ {threshold:.1}, 전역 최대 {} 사용",
                    self.eye, self.global_max
                );
                self.global_max as f64
            }
            _ => area,
        }
    }

    fn update_global_max(&mut self, area: f64) {
        self.global_max = if self.global_max == 0 {
            to_cell(area)
        } else if area > self.global_max as f64 {
            to_cell(area - GLOBAL_MAX_DRIFT as f64)
        } else {
            self.global_max.saturating_sub(GLOBAL_MAX_DRIFT).max(1)
        };
    }

    fn average_output(&mut self, raw: f64, capacity: usize) -> f64 {
        if capacity == 0 {
            return raw;
        }
        self.output_window.push(raw, capacity);
        self.output_window.mean().unwrap_or(raw)
    }

    fn persist(&mut self) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        table.write_metadata(self.global_max, self.active_roi);
        match self.store.save(table) {
            Ok(()) => debug!("[{}] 테이블 저장: {}", self.eye, self.store.describe()),
            Err(e) => warn!(
                "[{}] 테이블 저장 실패 ({}): {e}",
                self.eye,
                self.store.describe()
            ),
        }
    }
}

/// 면적을 테이블 셀 값으로 변환 (소수점 버림, 범위 포화)
fn to_cell(area: f64) -> u32 {
    area as u32
}

/// 동공 중심에 가장 가까운 셀 (행, 열, 범위 안 여부)
fn nearest_cell(ellipse: &PupilEllipse, frame: FrameShape) -> (u32, u32, bool) {
    let x = ellipse.center_x.trunc();
    let y = ellipse.center_y.trunc();
    let max_x = (frame.width - 1) as f64;
    let max_y = (frame.height - 1) as f64;

    let in_bounds = x.is_finite() && y.is_finite() && x <= max_x && y <= max_y;
    let col = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 } as u32;
    let row = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 } as u32;
    (row, col, in_bounds)
}

/// `1 - (면적 - 픽셀 최소)/(전역 최대 - 픽셀 최소)`, 정규화 불가 시 0.5
fn normalize(area: f64, cell_min: f64, global_max: f64) -> f64 {
    if !area.is_finite() || !cell_min.is_finite() || !global_max.is_finite() {
        return NEUTRAL_DILATION;
    }
    let span = global_max - cell_min;
    if span == 0.0 {
        return NEUTRAL_DILATION;
    }
    1.0 - (area - cell_min) / span
}

#[cfg(test)]
mod tests {
    use super::*;
    use pupilmeter_core::ports::table_store::MemoryTableStore;

    const FRAME: FrameShape = FrameShape {
        height: 120,
        width: 160,
    };

    fn windows() -> SampleWindows {
        SampleWindows::new(400, 0)
    }

    fn estimator() -> DilationEstimator<MemoryTableStore> {
        DilationEstimator::new(EyeId::Left, MemoryTableStore::new())
    }

    fn pupil(size: f64, x: f64, y: f64) -> PupilEllipse {
        PupilEllipse::new(size, size, x, y)
    }

    fn secs(t0: Instant, s: u64) -> Instant {
        t0 + Duration::from_secs(s)
    }

    #[test]
    fn first_observation_returns_neutral_and_records_area() {
        let mut est = estimator();
        let ellipse = pupil(30.0, 40.0, 50.0);

        let out = est.estimate_at(&ellipse, FRAME, windows(), Instant::now());

        assert_eq!(out, 0.5);
        assert_eq!(est.last_observation(), Observation::FirstAtCell);
        let table = est.table().unwrap();
        assert_eq!(table.get(50, 40), ellipse.area() as u32);
        assert_eq!(est.global_max(), ellipse.area() as u32);
    }

    #[test]
    fn undetected_pupil_repeats_last_output_without_mutation() {
        let mut est = estimator();
        let t0 = Instant::now();
        est.estimate_at(&pupil(30.0, 40.0, 50.0), FRAME, windows(), t0);
        let last = est.estimate_at(&pupil(26.0, 40.0, 50.0), FRAME, windows(), secs(t0, 1));
        let snapshot = est.table().cloned();
        let gm = est.global_max();

        for i in 0..5 {
            let out = est.estimate_at(&pupil(30.0, -1.0, 50.0), FRAME, windows(), secs(t0, 2 + i));
            assert_eq!(out, last);
            let out = est.estimate_at(&pupil(30.0, 10.0, -3.5), FRAME, windows(), secs(t0, 2 + i));
            assert_eq!(out, last);
        }

        assert_eq!(est.table().cloned(), snapshot);
        assert_eq!(est.global_max(), gm);
        assert_eq!(est.last_observation(), Observation::Skipped);
    }

    #[test]
    fn outputs_stay_in_unit_range() {
        let mut est = estimator();
        let t0 = Instant::now();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % 10_000) as f64 / 10_000.0
        };

        for i in 0..2_000u64 {
            let size = 5.0 + next() * 60.0;
            let x = next() * 200.0 - 20.0;
            let y = next() * 160.0 - 20.0;
            let out = est.estimate_at(
                &PupilEllipse::new(size, size * (0.5 + next()), x, y),
                FRAME,
                SampleWindows::new(50, 3),
                t0 + Duration::from_millis(8 * i),
            );
            assert!((0.0..=1.0).contains(&out), "out of range: {out}");
        }
    }

    #[test]
    fn smaller_pupil_at_same_cell_becomes_new_minimum() {
        let mut est = estimator();
        let t0 = Instant::now();
        let big = pupil(40.0, 10.0, 10.0);
        let small = pupil(20.0, 10.0, 10.0);

        est.estimate_at(&big, FRAME, SampleWindows::new(0, 0), t0);
        est.estimate_at(&small, FRAME, SampleWindows::new(0, 0), secs(t0, 1));

        assert_eq!(est.last_observation(), Observation::Updated);
        assert_eq!(est.table().unwrap().get(10, 10), small.area() as u32);
    }

    #[test]
    fn larger_pupil_drifts_cell_upward() {
        let mut est = estimator();
        let t0 = Instant::now();
        let small = pupil(20.0, 10.0, 10.0);
        est.estimate_at(&small, FRAME, SampleWindows::new(0, 0), t0);
        est.estimate_at(&pupil(40.0, 10.0, 10.0), FRAME, SampleWindows::new(0, 0), secs(t0, 1));

        assert_eq!(
            est.table().unwrap().get(10, 10),
            small.area() as u32 + CELL_DRIFT
        );
    }

    #[test]
    fn global_max_tracks_and_decays() {
        let mut est = estimator();
        let t0 = Instant::now();
        let first = pupil(20.0, 1.0, 1.0);
        est.estimate_at(&first, FRAME, SampleWindows::new(0, 0), t0);
        assert_eq!(est.global_max(), first.area() as u32);

        let bigger = pupil(50.0, 2.0, 2.0);
        est.estimate_at(&bigger, FRAME, SampleWindows::new(0, 0), secs(t0, 1));
        assert_eq!(est.global_max(), (bigger.area() - 5.0) as u32);

        let before = est.global_max();
        est.estimate_at(&first, FRAME, SampleWindows::new(0, 0), secs(t0, 2));
        assert_eq!(est.global_max(), before - 5);
    }

    #[test]
    fn blink_outlier_is_replaced_by_global_max() {
        let mut est = estimator();
        let t0 = Instant::now();
        let filter_samples = 10;
        let win = SampleWindows::new(filter_samples, 0);

        // 정상 면적을 조금씩 줄여 가며 관측 (마지막 샘플이 최대가 되지 않도록)
        for i in 0..filter_samples {
            let size = 30.0 - i as f64 * 0.1;
            est.estimate_at(&pupil(size, 20.0, 20.0), FRAME, win, secs(t0, i as u64));
        }
        let gm_before = est.global_max();
        assert!(gm_before > 0);

        let blink = pupil(300.0, 90.0, 60.0);
        est.estimate_at(&blink, FRAME, win, secs(t0, 100));

        assert_eq!(est.last_observation(), Observation::FirstAtCell);
        assert_eq!(est.table().unwrap().get(60, 90), gm_before);
        assert_ne!(est.table().unwrap().get(60, 90), blink.area() as u32);
    }

    #[test]
    fn out_of_bounds_center_is_clamped_and_treated_as_new() {
        let mut est = estimator();
        let t0 = Instant::now();
        let edge = pupil(20.0, 159.0, 119.0);
        est.estimate_at(&edge, FRAME, SampleWindows::new(0, 0), t0);

        let outside = pupil(24.0, 500.0, 900.0);
        est.estimate_at(&outside, FRAME, SampleWindows::new(0, 0), secs(t0, 1));

        assert_eq!(est.last_observation(), Observation::FirstAtCell);
        assert_eq!(est.table().unwrap().get(119, 159), outside.area() as u32);
    }

    #[test]
    fn save_cadence_is_rate_limited() {
        let mut est = estimator();
        let t0 = Instant::now();
        let w = SampleWindows::new(0, 0);

        est.estimate_at(&pupil(20.0, 1.0, 1.0), FRAME, w, t0);
        assert_eq!(est.store().save_count(), 0);

        est.estimate_at(&pupil(22.0, 2.0, 2.0), FRAME, w, secs(t0, 15));
        assert_eq!(est.store().save_count(), 1);

        est.estimate_at(&pupil(24.0, 3.0, 3.0), FRAME, w, secs(t0, 16));
        assert_eq!(est.store().save_count(), 1);

        est.estimate_at(&pupil(26.0, 4.0, 4.0), FRAME, w, secs(t0, 31));
        assert_eq!(est.store().save_count(), 2);

        let stored = est.store().stored().unwrap();
        assert_eq!(stored.global_max(), est.global_max());
        assert_eq!(stored.roi(), RoiDescriptor::default());
    }

    #[test]
    fn saved_table_is_reloaded_by_next_instance() {
        let mut est = estimator().with_save_interval(Duration::ZERO);
        let t0 = Instant::now();
        est.estimate_at(&pupil(20.0, 5.0, 6.0), FRAME, SampleWindows::new(0, 0), t0);
        est.estimate_at(&pupil(18.0, 5.0, 6.0), FRAME, SampleWindows::new(0, 0), secs(t0, 1));

        let saved = est.store().stored().cloned().unwrap();
        let gm = est.global_max();

        let mut next = DilationEstimator::new(EyeId::Left, MemoryTableStore::with_table(saved));
        next.estimate_at(&pupil(19.0, 5.0, 6.0), FRAME, SampleWindows::new(0, 0), t0);
        assert_eq!(next.last_observation(), Observation::Updated);
        // 로드된 전역 최대값에서 감쇠가 이어진다
        assert_eq!(next.global_max(), gm - 5);
    }

    #[test]
    fn roi_change_against_saved_table_starts_fresh() {
        let mut est = estimator().with_save_interval(Duration::ZERO);
        let t0 = Instant::now();
        let p = pupil(20.0, 30.0, 30.0);
        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), t0);
        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), secs(t0, 1));
        let saved = est.store().stored().cloned().unwrap();

        let mut next = DilationEstimator::new(EyeId::Left, MemoryTableStore::with_table(saved));
        next.configure_roi(RoiDescriptor::new(0, 8, 8));
        next.estimate_at(&p, FRAME, SampleWindows::new(0, 0), t0);

        assert_eq!(next.last_observation(), Observation::FirstAtCell);
        assert_eq!(next.table().unwrap().nonzero().count(), 1);
    }

    #[test]
    fn roi_change_on_live_instance_starts_fresh() {
        let mut est = estimator();
        let t0 = Instant::now();
        let p = pupil(20.0, 30.0, 30.0);
        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), t0);

        est.configure_roi(RoiDescriptor::new(90, 0, 0));
        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), secs(t0, 1));
        assert_eq!(est.last_observation(), Observation::FirstAtCell);
    }

    #[test]
    fn frame_size_change_starts_fresh() {
        let mut est = estimator();
        let t0 = Instant::now();
        let p = pupil(20.0, 30.0, 30.0);
        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), t0);
        est.estimate_at(&p, FrameShape::new(100, 100), SampleWindows::new(0, 0), secs(t0, 1));

        assert_eq!(est.last_observation(), Observation::FirstAtCell);
        assert_eq!(est.table().unwrap().shape(), TableShape::new(100, 101));
    }

    #[test]
    fn reset_removes_saved_table_and_restarts() {
        let mut est = estimator().with_save_interval(Duration::ZERO);
        let t0 = Instant::now();
        let p = pupil(20.0, 30.0, 30.0);
        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), t0);
        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), secs(t0, 1));
        assert!(est.store().stored().is_some());

        est.reset();
        assert!(est.store().stored().is_none());
        assert!(est.table().is_none());

        est.estimate_at(&p, FRAME, SampleWindows::new(0, 0), secs(t0, 2));
        assert_eq!(est.last_observation(), Observation::FirstAtCell);
    }

    #[test]
    fn flush_saves_immediately() {
        let mut est = estimator();
        est.flush();
        assert_eq!(est.store().save_count(), 0);

        est.estimate_at(&pupil(20.0, 3.0, 4.0), FRAME, SampleWindows::new(0, 0), Instant::now());
        est.flush();
        assert_eq!(est.store().save_count(), 1);
        assert_eq!(est.store().stored().unwrap().get(4, 3), pupil(20.0, 3.0, 4.0).area() as u32);
    }

    #[test]
    fn flush_keeps_periodic_save_schedule() {
        let mut est = estimator();
        let t0 = Instant::now();
        est.estimate_at(&pupil(20.0, 3.0, 4.0), FRAME, SampleWindows::new(0, 0), t0);
        est.flush();
        assert_eq!(est.store().save_count(), 1);

        // 호출자 시계로 15초 뒤 변경은 주기 저장
        est.estimate_at(&pupil(16.0, 3.0, 4.0), FRAME, SampleWindows::new(0, 0), secs(t0, 15));
        assert_eq!(est.store().save_count(), 2);
    }

    #[test]
    fn normalize_formula_and_fallbacks() {
        assert_eq!(normalize(100.0, 100.0, 300.0), 1.0);
        assert_eq!(normalize(300.0, 100.0, 300.0), 0.0);
        assert!((normalize(200.0, 100.0, 300.0) - 0.5).abs() < 1e-12);
        assert_eq!(normalize(200.0, 100.0, 100.0), NEUTRAL_DILATION);
        assert_eq!(normalize(f64::NAN, 100.0, 300.0), NEUTRAL_DILATION);
        assert_eq!(normalize(200.0, f64::INFINITY, 300.0), NEUTRAL_DILATION);
    }

    #[test]
    fn output_average_uses_window_mean() {
        let mut est = estimator();
        assert_eq!(est.average_output(1.0, 0), 1.0);
        assert_eq!(est.average_output(1.0, 2), 1.0);
        assert_eq!(est.average_output(0.0, 2), 0.5);
        assert_eq!(est.average_output(0.0, 2), 0.0);
    }

    #[test]
    fn nearest_cell_truncates_and_clamps() {
        let e = PupilEllipse::new(1.0, 1.0, 10.9, 3.2);
        assert_eq!(nearest_cell(&e, FRAME), (3, 10, true));

        let e = PupilEllipse::new(1.0, 1.0, 160.0, 3.0);
        assert_eq!(nearest_cell(&e, FRAME), (3, 159, false));

        let e = PupilEllipse::new(1.0, 1.0, f64::NAN, 3.0);
        assert_eq!(nearest_cell(&e, FRAME), (3, 0, false));
    }
}
