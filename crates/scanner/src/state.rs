//! 게시되는 스캔 상태 — UI 계층이 관찰하는 상태 구조체
//!
//! 코디네이터는 [`ScanState`]를 `tokio::sync::watch` 채널로 게시합니다.
//! UI 계층은 특정 반응형 런타임에 결합되지 않고 수신 채널만 구독하면 됩니다.

use std::fmt;

use serde::Serialize;

use foodscan_core::types::Product;

/// 대기 상태 안내 문구
pub const IDLE_PROMPT: &str = "Position barcode within frame";

/// 코디네이터 상태 기계의 현재 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// 생성됨, 아직 시작하지 않음
    Uninitialized,
    /// 카메라 권한 요청 중
    AwaitingAuthorization,
    /// 권한이 거부/제한됨 (세션 내 종료 상태)
    AuthorizationDenied,
    /// 캡처 세션 구성 중 (구성 실패 시 여기 머무름, 자동 재시도 없음)
    Configuring,
    /// 바코드 승인 가능
    Ready,
    /// 조회 진행 중
    LookupInFlight,
    /// 조회 성공, 쿨다운 대기
    ResultReady,
    /// 조회 실패, 쿨다운 대기
    LookupFailed,
    /// 정리 완료됨
    Stopped,
}

impl ScanPhase {
    /// 단계 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::AwaitingAuthorization => "awaiting_authorization",
            Self::AuthorizationDenied => "authorization_denied",
            Self::Configuring => "configuring",
            Self::Ready => "ready",
            Self::LookupInFlight => "lookup_in_flight",
            Self::ResultReady => "result_ready",
            Self::LookupFailed => "lookup_failed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI 계층에 게시되는 관찰 가능한 스캔 상태
///
/// 코디네이터가 단독으로 변이하며, 스캔 세션당 하나의 인스턴스가
/// watch 채널을 통해 게시됩니다. 승인 정책의 내부 필드(마지막 승인
/// 바코드, 승인 가능 플래그)는 여기 포함되지 않습니다.
#[derive(Debug, Clone, Serialize)]
pub struct ScanState {
    /// 상태 기계의 현재 단계
    pub phase: ScanPhase,
    /// 사람이 읽을 수 있는 상태 메시지
    pub status_message: String,
    /// 에러 메시지 (빈 문자열 = 에러 없음)
    pub error_message: String,
    /// 마지막 성공 조회의 제품
    pub product: Option<Product>,
    /// 조회 진행 중 여부
    pub is_loading: bool,
    /// 카메라 권한 보유 여부
    pub is_camera_authorized: bool,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            phase: ScanPhase::Uninitialized,
            status_message: IDLE_PROMPT.to_owned(),
            error_message: String::new(),
            product: None,
            is_loading: false,
            is_camera_authorized: false,
        }
    }
}

impl ScanState {
    /// 에러가 게시되어 있는지 반환합니다.
    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}
