//! Foodscan 공통 크레이트 — 도메인 타입, 이벤트, 에러, 설정, 생명주기 trait
//!
//! 바코드 스캔에서 제품 조회까지의 흐름에 참여하는 모든 모듈이
//! 공유하는 기반 타입을 정의합니다.
//!
//! # Architecture
//! ```text
//! CameraSession ──BarcodeEvent/mpsc──> ScanCoordinator
//!                                           |
//!                                      ProductLookup.fetch_product()
//!                                           |
//!                                      ScanState ──watch──> UI
//!                                      ScanResultEvent ──mpsc──> downstream
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CameraError, ConfigError, FoodscanError, LookupError, PipelineError};

// 설정
pub use config::FoodscanConfig;

// 이벤트
pub use event::{BarcodeEvent, Event, EventMetadata, ScanOutcome, ScanResultEvent};

// 생명주기 trait
pub use pipeline::{HealthStatus, Pipeline};

// 도메인 타입
pub use types::{Ingredient, Nutriments, Product, Symbology};
