//! 설정 파일 관리.
//!
//! 플랫폼 설정 디렉토리의 JSON 파일에서 설정을 로드한다.
//! 파일이 없으면 기본 설정으로 만들어 둔다.

use crate::config::AppConfig;
use crate::error::CoreError;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 설정 파일 이름
const CONFIG_FILE_NAME: &str = "config.json";

/// 플랫폼별 프로젝트 디렉토리 (설정, 테이블 데이터 공용)
///
/// # 플랫폼별 설정 경로:
/// - macOS: `~/Library/Application Support/com.pupilmeter.pupilmeter/`
/// - Windows: `%APPDATA%\pupilmeter\pupilmeter\config\`
/// - Linux: `~/.config/pupilmeter/`
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pupilmeter", "pupilmeter")
}

/// 로드된 설정과 그 파일 경로
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AppConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    /// 플랫폼 기본 경로에서 로드
    pub fn new() -> Result<Self, CoreError> {
        Self::with_path(Self::default_path()?)
    }

    /// 지정된 경로에서 로드 (없으면 기본 설정 파일 생성)
    pub fn with_path(config_path: PathBuf) -> Result<Self, CoreError> {
        let config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            let config = AppConfig::default_config();
            Self::write_default(&config_path, &config)?;
            info!("기본 설정 파일 생성: {}", config_path.display());
            config
        };
        config.validate()?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// 플랫폼 기본 설정 파일 경로
    pub fn default_path() -> Result<PathBuf, CoreError> {
        project_dirs()
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .ok_or_else(|| CoreError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))
    }

    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// 설정 파일 경로
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn read(path: &Path) -> Result<AppConfig, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })?;
        debug!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    fn write_default(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::Config(format!("설정 디렉토리 생성 실패: {}: {}", parent.display(), e))
            })?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
        })
    }
}
