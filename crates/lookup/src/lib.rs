//! Foodscan 제품 조회 클라이언트
//!
//! 바코드로 공개 식품 데이터베이스를 조회하고 응답 envelope을
//! 타입화된 [`Product`](foodscan_core::types::Product) 레코드로 디코딩합니다.
//!
//! # Module Structure
//!
//! - [`client`]: 조회 trait과 HTTP 구현 (`ProductLookup`, `HttpLookupClient`, `MockLookupClient`)
//! - [`response`]: 응답 envelope 디코딩 (`LookupEnvelope`)
//!
//! # Architecture
//!
//! ```text
//! ScanCoordinator
//!       |
//!       ▼
//! ┌───────────────┐
//! │ ProductLookup │ (trait)
//! └───────────────┘
//!     │        │
//!     ▼        ▼
//! ┌──────┐  ┌──────┐
//! │ Http │  │ Mock │
//! └──┬───┘  └──────┘
//!    │
//!    ▼
//! GET {base_url}/product/{barcode}.json
//! ```
//!
//! 캐싱과 자동 재시도는 하지 않습니다. 모든 실패는
//! [`LookupError`](foodscan_core::error::LookupError)로 분류되어 보고됩니다.

pub mod client;
pub mod response;

// --- Public API Re-exports ---

pub use client::{HttpLookupClient, MockLookupClient, ProductLookup};
pub use response::LookupEnvelope;
