//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `foodscan_`
//! - 모듈명: `scanner_`, `lookup_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(foodscan_core::metrics::SCANNER_SCANS_ACCEPTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (found, not_found, failed)
pub const LABEL_OUTCOME: &str = "outcome";

/// 거부 사유 레이블 키 (in_flight, cooldown, duplicate)
pub const LABEL_REASON: &str = "reason";

// ─── Scan Coordinator 메트릭 ───────────────────────────────────────

/// 스캐너: 승인된 바코드 이벤트 수 (counter)
pub const SCANNER_SCANS_ACCEPTED_TOTAL: &str = "foodscan_scanner_scans_accepted_total";

/// 스캐너: 승인 정책으로 버려진 바코드 이벤트 수 (counter, label: reason)
pub const SCANNER_SCANS_DROPPED_TOTAL: &str = "foodscan_scanner_scans_dropped_total";

/// 스캐너: 완료된 조회 수 (counter, label: outcome)
pub const SCANNER_LOOKUPS_COMPLETED_TOTAL: &str = "foodscan_scanner_lookups_completed_total";

// ─── Lookup Client 메트릭 ──────────────────────────────────────────

/// 조회: 발행된 HTTP 요청 수 (counter)
pub const LOOKUP_REQUESTS_TOTAL: &str = "foodscan_lookup_requests_total";

/// 조회: 실패한 요청 수 (counter)
pub const LOOKUP_FAILURES_TOTAL: &str = "foodscan_lookup_failures_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 익스포터 설치 직후 한 번 호출하세요. 설명은 Prometheus의
/// `# HELP` 줄에 노출됩니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        SCANNER_SCANS_ACCEPTED_TOTAL,
        "Barcode events admitted by the scan coordinator"
    );
    describe_counter!(
        SCANNER_SCANS_DROPPED_TOTAL,
        "Barcode events dropped by the admission policy"
    );
    describe_counter!(
        SCANNER_LOOKUPS_COMPLETED_TOTAL,
        "Completed product lookups by outcome"
    );
    describe_counter!(
        LOOKUP_REQUESTS_TOTAL,
        "Product lookup HTTP requests issued"
    );
    describe_counter!(LOOKUP_FAILURES_TOTAL, "Product lookup requests that failed");
}
