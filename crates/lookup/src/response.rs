//! 응답 envelope 디코딩
//!
//! 제품 데이터베이스는 실제 제품 레코드를 상태 플래그와 함께
//! 바깥 JSON 객체로 감싸서 반환합니다:
//! `{ status: 0|1, product?: {...}, status_verbose?: "..." }`

use serde::Deserialize;
use tracing::debug;

use foodscan_core::error::LookupError;
use foodscan_core::types::Product;

/// 조회 응답 envelope
///
/// `status == 0`은 "not found"를 의미합니다. `status_verbose`는
/// 서버가 보내는 부가 설명으로, 진단 로그에만 사용합니다.
#[derive(Debug, Deserialize)]
pub struct LookupEnvelope {
    /// 조회 상태 플래그 (0 = not found, 1 = found)
    pub status: i64,
    /// 내장된 제품 레코드
    #[serde(default)]
    pub product: Option<Product>,
    /// 서버의 상세 상태 메시지
    #[serde(rename = "status_verbose", default)]
    pub status_verbose: Option<String>,
}

impl LookupEnvelope {
    /// envelope을 제품 레코드로 변환합니다.
    ///
    /// # Errors
    ///
    /// - `LookupError::NotFound`: status가 "not found"를 나타냄
    /// - `LookupError::EmptyPayload`: status는 "found"이지만 제품 레코드가 없음
    pub fn into_product(self, barcode: &str) -> Result<Product, LookupError> {
        if self.status == 0 {
            debug!(
                barcode = barcode,
                status_verbose = self.status_verbose.as_deref().unwrap_or("none"),
                "product not found in database"
            );
            return Err(LookupError::NotFound {
                barcode: barcode.to_owned(),
            });
        }

        self.product.ok_or_else(|| LookupError::EmptyPayload {
            barcode: barcode.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_envelope_yields_product() {
        let envelope: LookupEnvelope = serde_json::from_str(
            r#"{"status": 1, "product": {"code": "111", "product_name": "Test", "nutriments": {}}}"#,
        )
        .unwrap();
        let product = envelope.into_product("111").unwrap();
        assert_eq!(product.id, "111");
        assert_eq!(product.name, "Test");
    }

    #[test]
    fn not_found_envelope_carries_barcode() {
        let envelope: LookupEnvelope = serde_json::from_str(
            r#"{"status": 0, "status_verbose": "product not found"}"#,
        )
        .unwrap();
        let err = envelope.into_product("1234567890123").unwrap_err();
        assert!(matches!(
            err,
            LookupError::NotFound { ref barcode } if barcode == "1234567890123"
        ));
    }

    #[test]
    fn found_without_product_is_empty_payload() {
        let envelope: LookupEnvelope = serde_json::from_str(r#"{"status": 1}"#).unwrap();
        let err = envelope.into_product("222").unwrap_err();
        assert!(matches!(err, LookupError::EmptyPayload { .. }));
    }

    #[test]
    fn envelope_rejects_missing_status() {
        let result = serde_json::from_str::<LookupEnvelope>(r#"{"product": null}"#);
        assert!(result.is_err());
    }
}
