//! Foodscan 스캔 코디네이터 크레이트
//!
//! 카메라 세션 생명주기, 바코드 승인 정책, 제품 조회 흐름을 하나의
//! 상태 기계로 묶어 관리합니다.
//!
//! # Module Structure
//!
//! - [`state`]: 게시되는 스캔 상태 (`ScanState`, `ScanPhase`)
//! - [`camera`]: 카메라 세션 추상화 (`CameraSession` trait, `MockCameraSession`)
//! - [`coordinator`]: 메인 오케스트레이터 (`ScanCoordinator`, `ScanCoordinatorBuilder`)
//!
//! # Architecture
//!
//! ```text
//! CameraSession --mpsc--> ScanCoordinator
//!                             |
//!                        admission policy
//!                             |
//!                        ProductLookup.fetch_product()
//!                             |
//!                        ScanState --watch--> UI
//!                        ScanResultEvent --mpsc--> downstream
//! ```

pub mod camera;
pub mod coordinator;
pub mod state;

// --- Public API Re-exports ---

// Coordinator (main orchestrator)
pub use coordinator::{ScanCoordinator, ScanCoordinatorBuilder};

// Published state
pub use state::{IDLE_PROMPT, ScanPhase, ScanState};

// Camera abstraction
pub use camera::{CameraSession, MockCameraSession};
