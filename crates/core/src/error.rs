//! 에러 타입 — 도메인별 에러 정의
//!
//! 조회([`LookupError`])와 카메라([`CameraError`]) 에러는 코디네이터 경계에서
//! 잡혀 사용자 메시지로 변환되어 게시됩니다. 자동 재시도는 없습니다.

/// Foodscan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FoodscanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 제품 조회 에러
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// 카메라 세션 에러
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 채널 수신 실패
    #[error("channel receive failed: {0}")]
    ChannelRecv(String),

    /// 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중인 모듈을 다시 시작함
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 모듈을 정지함
    #[error("pipeline not running")]
    NotRunning,
}

/// 제품 조회 에러
///
/// 조회 URL 생성부터 응답 디코딩까지의 실패를 분류합니다.
/// 코디네이터는 [`user_message`](LookupError::user_message)를
/// `ScanState.error_message`에 게시합니다.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// 바코드를 유효한 조회 URL로 인코딩할 수 없음
    #[error("invalid lookup request for barcode '{barcode}'")]
    InvalidRequest {
        /// 문제가 된 바코드
        barcode: String,
    },

    /// 네트워크/전송 계층 실패 또는 non-2xx HTTP 상태
    #[error("transport failure: {reason}")]
    Transport {
        /// 실패 사유 (DNS, 타임아웃, 연결 등)
        reason: String,
        /// HTTP 상태 코드 (전송 자체가 실패한 경우 None)
        status: Option<u16>,
    },

    /// 데이터베이스에 해당 바코드의 제품이 없음 (envelope status=0)
    #[error("product not found for barcode '{barcode}'")]
    NotFound {
        /// 조회한 바코드
        barcode: String,
    },

    /// envelope status는 "found"이지만 제품 레코드가 비어 있음
    #[error("empty payload for barcode '{barcode}'")]
    EmptyPayload {
        /// 조회한 바코드
        barcode: String,
    },

    /// 응답이 유효한 JSON이 아니거나 스키마와 불일치
    #[error("failed to decode product response: {reason}")]
    Decode {
        /// 디코딩 실패 사유
        reason: String,
    },
}

impl LookupError {
    /// UI에 게시할 사용자 메시지를 반환합니다.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest { .. } => "Invalid URL".to_owned(),
            Self::Transport { reason, status } => match status {
                Some(code) => format!("Server returned {code}"),
                None => format!("Network error: {reason}"),
            },
            Self::NotFound { barcode } => {
                format!("Product with barcode {barcode} not found in database")
            }
            Self::EmptyPayload { .. } => "Product not found in database".to_owned(),
            Self::Decode { .. } => "Failed to parse product data".to_owned(),
        }
    }
}

/// 카메라 세션 에러
///
/// 권한 요청과 캡처 세션 구성 단계의 실패를 분류합니다.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CameraError {
    /// 사용자가 카메라 접근을 거부함
    #[error("camera access denied")]
    AuthorizationDenied,

    /// 카메라 접근이 정책으로 제한됨
    #[error("camera access restricted")]
    AuthorizationRestricted,

    /// 캡처 디바이스를 찾을 수 없거나 열 수 없음
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// 바코드 메타데이터 출력을 세션에 연결하지 못함
    #[error("failed to attach barcode output: {0}")]
    OutputAttach(String),
}

impl CameraError {
    /// UI에 게시할 사용자 메시지를 반환합니다.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthorizationDenied => {
                "Camera access denied. Please enable camera access in Settings".to_owned()
            }
            Self::AuthorizationRestricted => "Camera access is restricted".to_owned(),
            Self::DeviceUnavailable(_) => "No camera detected".to_owned(),
            Self::OutputAttach(reason) => format!("Failed to setup camera: {reason}"),
        }
    }
}
