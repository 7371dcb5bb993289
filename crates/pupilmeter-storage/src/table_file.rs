//! PNG 파일 기반 확장 테이블 저장소.
//!
//! `DilationTableStore` 포트 구현. 눈마다 고정된 파일 하나를 사용한다.

use image::ImageFormat;
use pupilmeter_core::error::CoreError;
use pupilmeter_core::models::dilation::{DilationTable, TableShape};
use pupilmeter_core::ports::table_store::DilationTableStore;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::table_image::{decode_table, encode_table};

/// PNG 확장 테이블 저장소
#[derive(Debug, Clone)]
pub struct PngTableStore {
    path: PathBuf,
}

impl PngTableStore {
    /// 파일 경로로 저장소 생성 (파일은 첫 저장 시 만들어진다)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 데이터 디렉토리와 파일 이름으로 생성
    pub fn in_dir(data_dir: &Path, file_name: &str) -> Self {
        Self::new(data_dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 저장 중 중단돼도 기존 파일이 깨지지 않도록 쓰는 임시 경로
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DilationTableStore for PngTableStore {
    fn load(&self, shape: TableShape) -> Result<Option<DilationTable>, CoreError> {
        if !self.path.is_file() {
            info!("테이블 파일 없음: {}", self.path.display());
            return Ok(None);
        }

        let image = image::open(&self.path).map_err(|e| {
            CoreError::Image(format!("테이블 파일 읽기 실패: {}: {e}", self.path.display()))
        })?;
        let table = decode_table(&image)?;

        if table.shape() != shape {
            return Err(CoreError::TableFormat(format!(
                "크기 불일치: 파일 {}x{}, 프레임 {}x{}",
                table.shape().rows,
                table.shape().cols,
                shape.rows,
                shape.cols
            )));
        }

        debug!(
            "테이블 로드: {} ({}x{})",
            self.path.display(),
            shape.rows,
            shape.cols
        );
        Ok(Some(table))
    }

    fn save(&mut self, table: &DilationTable) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        encode_table(table)
            .save_with_format(&temp_path, ImageFormat::Png)
            .map_err(|e| {
                CoreError::Image(format!("테이블 파일 저장 실패: {}: {e}", temp_path.display()))
            })?;
        fs::rename(&temp_path, &self.path)?;

        debug!("테이블 저장: {}", self.path.display());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), CoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("테이블 파일 삭제: {}", self.path.display());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
