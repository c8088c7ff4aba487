//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 카메라에서 코디네이터로, 코디네이터에서 다운스트림 소비자로의
//! 모든 통신은 이벤트 기반 메시지 패싱으로 수행됩니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::{Product, Symbology};

// --- 모듈명 상수 ---

/// 카메라 세션 모듈명
pub const MODULE_CAMERA: &str = "camera";
/// 스캔 코디네이터 모듈명
pub const MODULE_COORDINATOR: &str = "scan-coordinator";
/// 제품 조회 클라이언트 모듈명
pub const MODULE_LOOKUP: &str = "lookup-client";

// --- 이벤트 타입 상수 ---

/// 바코드 탐지 이벤트 타입
pub const EVENT_TYPE_BARCODE: &str = "barcode";
/// 스캔 결과 이벤트 타입
pub const EVENT_TYPE_SCAN_RESULT: &str = "scan_result";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
///
/// 각 이벤트의 발생 시각, 생성 모듈, 추적 ID를 담고 있어
/// 하나의 스캔이 탐지에서 조회 완료까지 어떻게 흘렀는지 추적할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명 (예: "camera", "scan-coordinator")
    pub source_module: String,
    /// 추적 ID — 같은 스캔 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    ///
    /// 새로운 스캔 흐름의 시작점(바코드 탐지)에서 사용합니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 카메라가 탐지한 바코드 이벤트
///
/// 캡처 세션의 바코드 디코더가 코드를 인식할 때마다 생성되어
/// 코디네이터의 수신 채널로 전달됩니다. 승인 정책에 의해
/// 버려질 수 있으며, 버려지는 것은 에러가 아닙니다.
#[derive(Debug, Clone)]
pub struct BarcodeEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 디코딩된 바코드 문자열
    pub barcode: String,
    /// 탐지된 심볼로지
    pub symbology: Symbology,
}

impl BarcodeEvent {
    /// 새로운 trace를 시작하는 바코드 이벤트를 생성합니다.
    pub fn new(barcode: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_CAMERA),
            barcode: barcode.into(),
            symbology,
        }
    }
}

impl Event for BarcodeEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_BARCODE
    }
}

impl fmt::Display for BarcodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BarcodeEvent[{}] barcode={} symbology={}",
            &self.id[..8.min(self.id.len())],
            self.barcode,
            self.symbology,
        )
    }
}

/// 스캔 결과
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// 제품을 찾음
    Found(Product),
    /// 데이터베이스에 제품이 없음
    NotFound,
    /// 조회 실패 (사용자 메시지)
    Failed(String),
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(product) => write!(f, "found({})", product.id),
            Self::NotFound => write!(f, "not_found"),
            Self::Failed(msg) => write!(f, "failed({msg})"),
        }
    }
}

/// 완료된 조회의 결과 이벤트
///
/// 코디네이터가 조회 완료 시 다운스트림 소비자(예: 스캔 히스토리)에
/// 전달합니다. trace_id는 원본 [`BarcodeEvent`]와 동일합니다.
#[derive(Debug, Clone)]
pub struct ScanResultEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 조회한 바코드
    pub barcode: String,
    /// 조회 결과
    pub outcome: ScanOutcome,
}

impl ScanResultEvent {
    /// 기존 trace에 연결된 스캔 결과 이벤트를 생성합니다.
    pub fn with_trace(
        barcode: impl Into<String>,
        outcome: ScanOutcome,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_COORDINATOR, trace_id),
            barcode: barcode.into(),
            outcome,
        }
    }
}

impl Event for ScanResultEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_SCAN_RESULT
    }
}

impl fmt::Display for ScanResultEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScanResultEvent[{}] barcode={} outcome={}",
            &self.id[..8.min(self.id.len())],
            self.barcode,
            self.outcome,
        )
    }
}

/// SystemTime을 사람이 읽을 수 있는 형태로 변환합니다.
fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}
