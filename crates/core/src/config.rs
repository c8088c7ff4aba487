//! 설정 관리 — foodscan.toml 파싱 및 런타임 설정
//!
//! [`FoodscanConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`FOODSCAN_LOOKUP_BASE_URL=...` 형식)
//! 2. 설정 파일 (`foodscan.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), foodscan_core::error::FoodscanError> {
//! use foodscan_core::config::FoodscanConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FoodscanConfig::load("foodscan.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FoodscanConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FoodscanError};
use crate::types::Symbology;

/// Foodscan 통합 설정
///
/// `foodscan.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodscanConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 제품 조회 클라이언트 설정
    #[serde(default)]
    pub lookup: LookupConfig,
    /// 스캔 코디네이터 설정
    #[serde(default)]
    pub scanner: ScannerConfig,
}

impl FoodscanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FoodscanError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FoodscanError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FoodscanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FoodscanError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FoodscanError> {
        toml::from_str(toml_str).map_err(|e| {
            FoodscanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FOODSCAN_{SECTION}_{FIELD}`
    /// 예: `FOODSCAN_LOOKUP_BASE_URL=https://example.org/api/v0`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FOODSCAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FOODSCAN_GENERAL_LOG_FORMAT");
        override_string(
            &mut self.general.metrics_bind,
            "FOODSCAN_GENERAL_METRICS_BIND",
        );

        // Lookup
        override_string(&mut self.lookup.base_url, "FOODSCAN_LOOKUP_BASE_URL");
        override_u64(&mut self.lookup.timeout_secs, "FOODSCAN_LOOKUP_TIMEOUT_SECS");
        override_string(&mut self.lookup.user_agent, "FOODSCAN_LOOKUP_USER_AGENT");

        // Scanner
        override_u64(&mut self.scanner.cooldown_ms, "FOODSCAN_SCANNER_COOLDOWN_MS");
        override_usize(
            &mut self.scanner.barcode_channel_capacity,
            "FOODSCAN_SCANNER_BARCODE_CHANNEL_CAPACITY",
        );
        override_usize(
            &mut self.scanner.result_channel_capacity,
            "FOODSCAN_SCANNER_RESULT_CHANNEL_CAPACITY",
        );
        override_csv(&mut self.scanner.symbologies, "FOODSCAN_SCANNER_SYMBOLOGIES");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FoodscanError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.lookup.validate()?;
        self.scanner.validate()?;
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// Prometheus 메트릭 수신 주소 (빈 문자열 = 비활성화)
    pub metrics_bind: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            metrics_bind: String::new(),
        }
    }
}

/// 설정 상한값 상수
const MAX_TIMEOUT_SECS: u64 = 120;
const MAX_COOLDOWN_MS: u64 = 60_000;
const MAX_CHANNEL_CAPACITY: usize = 4096;

/// 제품 조회 클라이언트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// 제품 데이터베이스 기본 엔드포인트
    pub base_url: String,
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// User-Agent 헤더
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org/api/v0".to_owned(),
            timeout_secs: 15,
            user_agent: concat!("foodscan/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl LookupConfig {
    /// 조회 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "lookup.base_url".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "lookup.base_url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            });
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "lookup.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            });
        }
        Ok(())
    }
}

/// 스캔 코디네이터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 조회 완료 후 재승인까지의 쿨다운 (밀리초)
    pub cooldown_ms: u64,
    /// 바코드 이벤트 채널 용량
    pub barcode_channel_capacity: usize,
    /// 스캔 결과 채널 용량
    pub result_channel_capacity: usize,
    /// 승인하는 심볼로지 목록
    pub symbologies: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            barcode_channel_capacity: 64,
            result_channel_capacity: 64,
            symbologies: Symbology::all()
                .iter()
                .map(|s| s.as_str().to_owned())
                .collect(),
        }
    }
}

impl ScannerConfig {
    /// 스캐너 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cooldown_ms > MAX_COOLDOWN_MS {
            return Err(ConfigError::InvalidValue {
                field: "scanner.cooldown_ms".to_owned(),
                reason: format!("must be 0-{MAX_COOLDOWN_MS}"),
            });
        }
        if self.barcode_channel_capacity == 0
            || self.barcode_channel_capacity > MAX_CHANNEL_CAPACITY
        {
            return Err(ConfigError::InvalidValue {
                field: "scanner.barcode_channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            });
        }
        if self.result_channel_capacity == 0 || self.result_channel_capacity > MAX_CHANNEL_CAPACITY
        {
            return Err(ConfigError::InvalidValue {
                field: "scanner.result_channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            });
        }
        if self.symbologies.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scanner.symbologies".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        for raw in &self.symbologies {
            Symbology::from_str(raw)?;
        }
        Ok(())
    }

    /// 설정된 심볼로지 목록을 파싱하여 반환합니다.
    ///
    /// `validate()`를 통과한 설정에서만 호출하세요.
    pub fn parsed_symbologies(&self) -> Vec<Symbology> {
        self.symbologies
            .iter()
            .filter_map(|raw| Symbology::from_str(raw).ok())
            .collect()
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

fn override_u64(target: &mut u64, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = key, value = %value, "ignoring non-numeric env override"),
        }
    }
}

fn override_usize(target: &mut usize, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = key, value = %value, "ignoring non-numeric env override"),
        }
    }
}

fn override_csv(target: &mut Vec<String>, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = value
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
