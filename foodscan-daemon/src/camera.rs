//! 표준 입력 기반 카메라 세션
//!
//! 하드웨어 카메라가 없는 환경(서버, CI)에서 코디네이터를 구동하기 위한
//! 세션 구현입니다. 표준 입력의 각 줄을 디코딩된 바코드로 취급합니다.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use foodscan_core::error::CameraError;
use foodscan_core::event::BarcodeEvent;
use foodscan_core::types::Symbology;
use foodscan_scanner::CameraSession;

/// 표준 입력을 읽어 바코드 이벤트를 생산하는 세션
///
/// 권한 요청은 항상 성공합니다. `configure_and_start`는 독자 태스크를
/// 스폰하여 줄 단위로 읽고, 설정된 심볼로지에 해당하는 코드만 채널로
/// 전달합니다. 입력이 닫히면 태스크가 종료되고 채널도 닫힙니다.
pub struct StdinCameraSession {
    running: AtomicBool,
    reader: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StdinCameraSession {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            reader: Mutex::new(None),
        }
    }
}

impl Default for StdinCameraSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSession for StdinCameraSession {
    async fn request_authorization(&self) -> Result<(), CameraError> {
        Ok(())
    }

    async fn configure_and_start(
        &self,
        symbologies: &[Symbology],
        events: mpsc::Sender<BarcodeEvent>,
    ) -> Result<(), CameraError> {
        if symbologies.is_empty() {
            return Err(CameraError::OutputAttach(
                "no symbologies configured".to_owned(),
            ));
        }

        let allowed = symbologies.to_vec();
        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let code = line.trim();
                        if code.is_empty() {
                            continue;
                        }
                        let symbology = infer_symbology(code);
                        if !allowed.contains(&symbology) {
                            debug!(barcode = %code, symbology = %symbology, "symbology not configured, skipping");
                            continue;
                        }
                        if events.send(BarcodeEvent::new(code, symbology)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed, barcode input ended");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read barcode line");
                        break;
                    }
                }
            }
        });

        *self.reader.lock().expect("reader lock poisoned") = Some(handle);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        if let Some(handle) = self.reader.lock().expect("reader lock poisoned").take() {
            handle.abort();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// 코드 형태에서 심볼로지를 추정합니다.
///
/// 숫자 8자리는 EAN-8, 13자리는 EAN-13, 그 외는 Code128로 취급합니다.
fn infer_symbology(code: &str) -> Symbology {
    if code.chars().all(|c| c.is_ascii_digit()) {
        match code.len() {
            8 => Symbology::Ean8,
            13 => Symbology::Ean13,
            _ => Symbology::Code128,
        }
    } else {
        Symbology::Code128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_ean13_from_thirteen_digits() {
        assert_eq!(infer_symbology("4006381333931"), Symbology::Ean13);
    }

    #[test]
    fn infers_ean8_from_eight_digits() {
        assert_eq!(infer_symbology("96385074"), Symbology::Ean8);
    }

    #[test]
    fn infers_code128_otherwise() {
        assert_eq!(infer_symbology("ABC-1234"), Symbology::Code128);
        assert_eq!(infer_symbology("123456"), Symbology::Code128);
    }

    #[tokio::test]
    async fn rejects_empty_symbology_list() {
        let session = StdinCameraSession::new();
        let (tx, _rx) = mpsc::channel(4);
        let err = session.configure_and_start(&[], tx).await.unwrap_err();
        assert!(matches!(err, CameraError::OutputAttach(_)));
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let session = StdinCameraSession::new();
        session.stop().await;
        session.stop().await;
        assert!(!session.is_running());
    }
}
