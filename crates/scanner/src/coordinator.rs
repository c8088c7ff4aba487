//! 스캔 코디네이터 -- 카메라 생명주기/바코드 승인/조회 흐름 전체 관리
//!
//! [`ScanCoordinator`]는 core의 [`Pipeline`] trait을 구현하여
//! `foodscan-daemon`에서 다른 모듈과 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! BarcodeEvent ──mpsc──> ScanCoordinator (소유 태스크)
//!                            |
//!                       승인 정책 (단일 조회 / 중복 제거 / 쿨다운)
//!                            |
//!                       ProductLookup.fetch_product() (스폰된 태스크)
//!                            |
//!                       ScanState ──watch──> UI
//!                       ScanResultEvent ──mpsc──> downstream
//! ```
//!
//! # 승인 정책
//!
//! 바코드 이벤트는 다음 세 조건을 모두 만족할 때만 승인됩니다:
//! 진행 중인 조회가 없고, 쿨다운이 지나 승인 모드이며, 직전에 승인된
//! 바코드와 다른 코드일 것. 거부된 이벤트는 조용히 버려집니다
//! (큐잉 없음, 에러 없음).
//!
//! 쿨다운은 승인 모드만 복원하며 "마지막 승인 바코드"는 지우지 않습니다.
//! 같은 코드를 다시 스캔하려면 다른 코드를 먼저 스캔하거나
//! [`reset_scan_state`](ScanCoordinator::reset_scan_state)를 호출해야 합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::counter;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use foodscan_core::config::ScannerConfig;
use foodscan_core::error::{FoodscanError, LookupError, PipelineError};
use foodscan_core::event::{BarcodeEvent, ScanOutcome, ScanResultEvent};
use foodscan_core::metrics::{
    LABEL_OUTCOME, LABEL_REASON, SCANNER_LOOKUPS_COMPLETED_TOTAL, SCANNER_SCANS_ACCEPTED_TOTAL,
    SCANNER_SCANS_DROPPED_TOTAL,
};
use foodscan_core::pipeline::{HealthStatus, Pipeline};
use foodscan_core::types::Product;
use foodscan_lookup::ProductLookup;

use crate::camera::CameraSession;
use crate::state::{IDLE_PROMPT, ScanPhase, ScanState};

/// 코디네이터 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lifecycle {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// UI에서 들어오는 제어 명령
#[derive(Debug)]
enum CoordinatorCommand {
    /// 스캔 상태 초기화 (카메라는 계속 실행)
    ResetScanState,
}

/// 소유 태스크로 전달되는 내부 신호
enum LoopSignal {
    /// 스폰된 조회 태스크가 완료됨
    LookupFinished {
        barcode: String,
        trace_id: String,
        result: Result<Product, LookupError>,
    },
    /// 조회 완료 후 쿨다운이 경과함
    CooldownElapsed,
}

/// 스캔 코디네이터 -- 카메라 세션, 바코드 승인, 제품 조회의 전체 흐름을 관리합니다.
///
/// 게시 상태의 모든 변이는 `start()`가 스폰하는 단일 소유 태스크에서
/// 수행됩니다. 카메라 생산 태스크와 조회 태스크는 채널을 통해서만
/// 소유 태스크와 통신하므로 락이 필요하지 않습니다.
///
/// # 사용 예시
/// ```ignore
/// use foodscan_scanner::{ScanCoordinator, ScanCoordinatorBuilder};
///
/// let (mut coordinator, result_rx) = ScanCoordinatorBuilder::new()
///     .config(config)
///     .camera(camera)
///     .lookup(lookup)
///     .build()?;
///
/// let mut state_rx = coordinator.subscribe();
/// coordinator.start().await?;
/// ```
pub struct ScanCoordinator<C: CameraSession, L: ProductLookup> {
    /// 스캐너 설정
    config: ScannerConfig,
    /// 현재 생명주기 상태
    lifecycle: Lifecycle,
    /// 카메라 세션 (코디네이터가 단독 소유)
    camera: Arc<C>,
    /// 제품 조회 클라이언트 (조회 태스크와 공유)
    lookup: Arc<L>,
    /// 게시 상태 채널
    state_tx: watch::Sender<ScanState>,
    /// 제어 명령 전송 채널
    command_tx: mpsc::Sender<CoordinatorCommand>,
    /// 제어 명령 수신 채널 (start()에서 소비)
    command_rx: Option<mpsc::Receiver<CoordinatorCommand>>,
    /// 스캔 결과 전송 채널
    result_tx: mpsc::Sender<ScanResultEvent>,
    /// 백그라운드 태스크 핸들
    tasks: Vec<tokio::task::JoinHandle<()>>,
    /// 승인된 바코드 카운터
    scans_accepted: Arc<AtomicU64>,
    /// 승인 거부된 바코드 카운터
    scans_dropped: Arc<AtomicU64>,
    /// 성공한 조회 카운터
    lookups_succeeded: Arc<AtomicU64>,
    /// 실패한 조회 카운터
    lookups_failed: Arc<AtomicU64>,
}

impl<C: CameraSession, L: ProductLookup> ScanCoordinator<C, L> {
    /// 현재 생명주기 상태명을 반환합니다.
    pub fn lifecycle_name(&self) -> &str {
        match self.lifecycle {
            Lifecycle::Initialized => "initialized",
            Lifecycle::Running => "running",
            Lifecycle::Stopped => "stopped",
        }
    }

    /// 게시 상태를 구독합니다.
    ///
    /// UI 계층은 반환된 watch 수신자로 상태 변경을 관찰합니다.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// 현재 상태 기계 단계를 반환합니다.
    pub fn phase(&self) -> ScanPhase {
        self.state_tx.borrow().phase
    }

    /// 스캔 상태를 초기화합니다.
    ///
    /// 로딩/승인/마지막 바코드/상태 메시지/에러를 초기값으로 되돌리되
    /// 카메라 세션은 계속 실행합니다. UI가 결과 상세 화면을 닫을 때
    /// 호출합니다.
    ///
    /// # Errors
    ///
    /// 코디네이터가 실행 중이 아니면 `PipelineError::ChannelSend`를 반환합니다.
    pub fn reset_scan_state(&self) -> Result<(), FoodscanError> {
        self.command_tx
            .try_send(CoordinatorCommand::ResetScanState)
            .map_err(|e| PipelineError::ChannelSend(e.to_string()).into())
    }

    /// 승인된 바코드 수를 반환합니다.
    pub fn scans_accepted(&self) -> u64 {
        self.scans_accepted.load(Ordering::Relaxed)
    }

    /// 승인 정책으로 버려진 바코드 수를 반환합니다.
    pub fn scans_dropped(&self) -> u64 {
        self.scans_dropped.load(Ordering::Relaxed)
    }

    /// 성공한 조회 수를 반환합니다.
    pub fn lookups_succeeded(&self) -> u64 {
        self.lookups_succeeded.load(Ordering::Relaxed)
    }

    /// 실패한 조회 수를 반환합니다.
    pub fn lookups_failed(&self) -> u64 {
        self.lookups_failed.load(Ordering::Relaxed)
    }

    /// 게시 상태를 변이하고 구독자에게 알립니다.
    fn publish(&self, f: impl FnOnce(&mut ScanState)) {
        self.state_tx.send_modify(f);
    }
}

impl<C: CameraSession, L: ProductLookup> Pipeline for ScanCoordinator<C, L> {
    async fn start(&mut self) -> Result<(), FoodscanError> {
        if self.lifecycle == Lifecycle::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!("starting scan coordinator");

        let command_rx = self.command_rx.take().ok_or(FoodscanError::Pipeline(
            PipelineError::InitFailed(
                "command receiver not available (was it consumed by a previous start? rebuild the coordinator to restart)"
                    .to_owned(),
            ),
        ))?;

        // 1. 카메라 권한 요청
        self.publish(|s| s.phase = ScanPhase::AwaitingAuthorization);
        let authorized = match self.camera.request_authorization().await {
            Ok(()) => {
                info!("camera access authorized");
                self.publish(|s| s.is_camera_authorized = true);
                true
            }
            Err(e) => {
                // 권한 거부는 게시되는 에러이지 start() 실패가 아님
                warn!(error = %e, "camera authorization failed");
                self.publish(|s| {
                    s.phase = ScanPhase::AuthorizationDenied;
                    s.is_camera_authorized = false;
                    s.error_message = e.user_message();
                });
                false
            }
        };

        // 2. 캡처 세션 구성 및 시작
        let (barcode_tx, barcode_rx) = mpsc::channel(self.config.barcode_channel_capacity);
        if authorized {
            self.publish(|s| {
                s.phase = ScanPhase::Configuring;
                s.status_message = "Setting up camera...".to_owned();
            });

            let symbologies = self.config.parsed_symbologies();
            match self.camera.configure_and_start(&symbologies, barcode_tx).await {
                Ok(()) => {
                    info!(symbologies = symbologies.len(), "camera session running");
                    self.publish(|s| {
                        s.phase = ScanPhase::Ready;
                        s.status_message = IDLE_PROMPT.to_owned();
                    });
                }
                Err(e) => {
                    // 구성 실패는 Configuring에 머무르며 자동 재시도하지 않음
                    error!(error = %e, "camera setup failed");
                    self.publish(|s| {
                        s.error_message = e.user_message();
                        s.status_message = "Camera setup failed".to_owned();
                    });
                }
            }
        }

        // 3. 소유 태스크 스폰 -- 이후 게시 상태 변이는 전부 이 태스크에서 수행
        let (signal_tx, signal_rx) = mpsc::channel(16);
        let event_loop = EventLoop {
            lookup: Arc::clone(&self.lookup),
            state_tx: self.state_tx.clone(),
            result_tx: self.result_tx.clone(),
            barcode_rx,
            command_rx,
            signal_tx,
            signal_rx,
            cooldown: Duration::from_millis(self.config.cooldown_ms),
            in_flight: false,
            can_scan: true,
            last_barcode: None,
            scans_accepted: Arc::clone(&self.scans_accepted),
            scans_dropped: Arc::clone(&self.scans_dropped),
            lookups_succeeded: Arc::clone(&self.lookups_succeeded),
            lookups_failed: Arc::clone(&self.lookups_failed),
        };
        self.tasks.push(tokio::spawn(event_loop.run()));

        self.lifecycle = Lifecycle::Running;
        info!("scan coordinator started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), FoodscanError> {
        if self.lifecycle != Lifecycle::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping scan coordinator");

        if self.camera.is_running() {
            self.camera.stop().await;
        }

        for task in self.tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }

        // 진행 중이던 조회의 완료 신호는 signal 채널이 닫혀 있으므로
        // 조용히 버려짐 -- 정리 이후 상태 변이는 일어나지 않음
        self.publish(|s| {
            let authorized = s.is_camera_authorized;
            *s = ScanState::default();
            s.is_camera_authorized = authorized;
            s.phase = ScanPhase::Stopped;
        });

        self.lifecycle = Lifecycle::Stopped;
        info!("scan coordinator stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.lifecycle {
            Lifecycle::Running => {
                if self.camera.is_running() {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded("camera session not running".to_owned())
                }
            }
            Lifecycle::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            Lifecycle::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 소유 태스크의 이벤트 루프
///
/// 승인 정책의 내부 필드(`in_flight`, `can_scan`, `last_barcode`)는
/// 이 구조체가 단독 소유하므로 동기화가 필요 없습니다.
struct EventLoop<L: ProductLookup> {
    lookup: Arc<L>,
    state_tx: watch::Sender<ScanState>,
    result_tx: mpsc::Sender<ScanResultEvent>,
    barcode_rx: mpsc::Receiver<BarcodeEvent>,
    command_rx: mpsc::Receiver<CoordinatorCommand>,
    signal_tx: mpsc::Sender<LoopSignal>,
    signal_rx: mpsc::Receiver<LoopSignal>,
    cooldown: Duration,
    in_flight: bool,
    can_scan: bool,
    last_barcode: Option<String>,
    scans_accepted: Arc<AtomicU64>,
    scans_dropped: Arc<AtomicU64>,
    lookups_succeeded: Arc<AtomicU64>,
    lookups_failed: Arc<AtomicU64>,
}

impl<L: ProductLookup> EventLoop<L> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.barcode_rx.recv() => {
                    self.handle_barcode(event);
                }
                Some(signal) = self.signal_rx.recv() => {
                    self.handle_signal(signal);
                }
                Some(command) = self.command_rx.recv() => {
                    self.handle_command(command);
                }
                else => {
                    info!("coordinator channels closed, stopping event loop");
                    break;
                }
            }
        }
    }

    /// 바코드 이벤트에 승인 정책을 적용합니다.
    ///
    /// 거부는 에러가 아닌 예상된 제어 흐름이므로 debug 레벨로만 기록합니다.
    fn handle_barcode(&mut self, event: BarcodeEvent) {
        let reason = if self.in_flight {
            Some("in_flight")
        } else if !self.can_scan {
            Some("cooldown")
        } else if self.last_barcode.as_deref() == Some(event.barcode.as_str()) {
            Some("duplicate")
        } else {
            None
        };

        if let Some(reason) = reason {
            debug!(barcode = %event.barcode, reason = reason, "barcode dropped");
            self.scans_dropped.fetch_add(1, Ordering::Relaxed);
            counter!(SCANNER_SCANS_DROPPED_TOTAL, LABEL_REASON => reason).increment(1);
            return;
        }

        // 조회 시작 전에 승인을 닫고 마지막 바코드를 기록 --
        // 같은 코드의 연속 탐지가 중복 조회를 만들지 못하게 함
        self.in_flight = true;
        self.can_scan = false;
        self.last_barcode = Some(event.barcode.clone());
        self.scans_accepted.fetch_add(1, Ordering::Relaxed);
        counter!(SCANNER_SCANS_ACCEPTED_TOTAL).increment(1);

        debug!(barcode = %event.barcode, symbology = %event.symbology, "barcode admitted");
        let barcode = event.barcode;
        self.state_tx.send_modify(|s| {
            s.phase = ScanPhase::LookupInFlight;
            s.is_loading = true;
            s.error_message.clear();
            s.status_message = format!("Looking up product: {barcode}");
        });

        let lookup = Arc::clone(&self.lookup);
        let signal_tx = self.signal_tx.clone();
        let trace_id = event.metadata.trace_id;
        tokio::spawn(async move {
            let result = lookup.fetch_product(&barcode).await;
            // 코디네이터가 이미 정리되었다면 전송이 실패하며 그대로 no-op
            let _ = signal_tx
                .send(LoopSignal::LookupFinished {
                    barcode,
                    trace_id,
                    result,
                })
                .await;
        });
    }

    fn handle_signal(&mut self, signal: LoopSignal) {
        match signal {
            LoopSignal::LookupFinished {
                barcode,
                trace_id,
                result,
            } => self.handle_lookup_finished(barcode, trace_id, result),
            LoopSignal::CooldownElapsed => {
                self.can_scan = true;
                self.state_tx.send_modify(|s| {
                    if matches!(s.phase, ScanPhase::ResultReady | ScanPhase::LookupFailed) {
                        s.phase = ScanPhase::Ready;
                    }
                });
            }
        }
    }

    fn handle_lookup_finished(
        &mut self,
        barcode: String,
        trace_id: String,
        result: Result<Product, LookupError>,
    ) {
        if !self.in_flight {
            // reset 이후 도착한 완료 신호
            debug!(barcode = %barcode, "stale lookup completion dropped");
            return;
        }
        self.in_flight = false;

        let outcome = match result {
            Ok(product) => {
                info!(barcode = %barcode, product = %product, "lookup succeeded");
                self.lookups_succeeded.fetch_add(1, Ordering::Relaxed);
                counter!(SCANNER_LOOKUPS_COMPLETED_TOTAL, LABEL_OUTCOME => "found").increment(1);

                let name = product.name.clone();
                let published = product.clone();
                self.state_tx.send_modify(move |s| {
                    s.phase = ScanPhase::ResultReady;
                    s.is_loading = false;
                    s.product = Some(published);
                    s.error_message.clear();
                    s.status_message = format!("Found: {name}");
                });
                ScanOutcome::Found(product)
            }
            Err(e) => {
                warn!(barcode = %barcode, error = %e, "lookup failed");
                self.lookups_failed.fetch_add(1, Ordering::Relaxed);

                let message = e.user_message();
                let published = message.clone();
                self.state_tx.send_modify(move |s| {
                    s.phase = ScanPhase::LookupFailed;
                    s.is_loading = false;
                    s.error_message = published;
                    s.status_message = IDLE_PROMPT.to_owned();
                });

                match e {
                    LookupError::NotFound { .. } => {
                        counter!(SCANNER_LOOKUPS_COMPLETED_TOTAL, LABEL_OUTCOME => "not_found")
                            .increment(1);
                        ScanOutcome::NotFound
                    }
                    _ => {
                        counter!(SCANNER_LOOKUPS_COMPLETED_TOTAL, LABEL_OUTCOME => "failed")
                            .increment(1);
                        ScanOutcome::Failed(message)
                    }
                }
            }
        };

        let result_event = ScanResultEvent::with_trace(barcode, outcome, trace_id);
        if let Err(e) = self.result_tx.try_send(result_event) {
            warn!(error = %e, "scan result channel full, dropping event");
        }

        // 고정 쿨다운 후 승인 재개 -- 코디네이터가 정리되면 전송 실패로 no-op
        let signal_tx = self.signal_tx.clone();
        let cooldown = self.cooldown;
        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            let _ = signal_tx.send(LoopSignal::CooldownElapsed).await;
        });
    }

    fn handle_command(&mut self, command: CoordinatorCommand) {
        match command {
            CoordinatorCommand::ResetScanState => {
                info!("scan state reset");
                self.in_flight = false;
                self.can_scan = true;
                self.last_barcode = None;
                self.state_tx.send_modify(|s| {
                    s.is_loading = false;
                    s.error_message.clear();
                    s.status_message = IDLE_PROMPT.to_owned();
                    if matches!(
                        s.phase,
                        ScanPhase::LookupInFlight | ScanPhase::ResultReady | ScanPhase::LookupFailed
                    ) {
                        s.phase = ScanPhase::Ready;
                    }
                });
            }
        }
    }
}

/// 스캔 코디네이터 빌더
///
/// 코디네이터를 구성하고 필요한 채널을 생성합니다.
pub struct ScanCoordinatorBuilder<C: CameraSession, L: ProductLookup> {
    config: ScannerConfig,
    camera: Option<Arc<C>>,
    lookup: Option<Arc<L>>,
    result_tx: Option<mpsc::Sender<ScanResultEvent>>,
}

impl<C: CameraSession, L: ProductLookup> ScanCoordinatorBuilder<C, L> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
            camera: None,
            lookup: None,
            result_tx: None,
        }
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// 카메라 세션을 설정합니다.
    pub fn camera(mut self, camera: Arc<C>) -> Self {
        self.camera = Some(camera);
        self
    }

    /// 제품 조회 클라이언트를 설정합니다.
    pub fn lookup(mut self, lookup: Arc<L>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// 외부 스캔 결과 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn result_sender(mut self, tx: mpsc::Sender<ScanResultEvent>) -> Self {
        self.result_tx = Some(tx);
        self
    }

    /// 코디네이터를 빌드합니다.
    ///
    /// # Returns
    /// - `ScanCoordinator`: 코디네이터 인스턴스
    /// - `Option<mpsc::Receiver<ScanResultEvent>>`: 스캔 결과 수신 채널
    ///   (외부 result_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<
        (
            ScanCoordinator<C, L>,
            Option<mpsc::Receiver<ScanResultEvent>>,
        ),
        FoodscanError,
    > {
        self.config.validate()?;

        let camera = self.camera.ok_or(FoodscanError::Pipeline(
            PipelineError::InitFailed("camera session must be provided".to_owned()),
        ))?;
        let lookup = self.lookup.ok_or(FoodscanError::Pipeline(
            PipelineError::InitFailed("lookup client must be provided".to_owned()),
        ))?;

        let (result_tx, result_rx) = if let Some(tx) = self.result_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.result_channel_capacity);
            (tx, Some(rx))
        };

        let (command_tx, command_rx) = mpsc::channel(16);
        let (state_tx, _state_rx) = watch::channel(ScanState::default());

        let coordinator = ScanCoordinator {
            config: self.config,
            lifecycle: Lifecycle::Initialized,
            camera,
            lookup,
            state_tx,
            command_tx,
            command_rx: Some(command_rx),
            result_tx,
            tasks: Vec::new(),
            scans_accepted: Arc::new(AtomicU64::new(0)),
            scans_dropped: Arc::new(AtomicU64::new(0)),
            lookups_succeeded: Arc::new(AtomicU64::new(0)),
            lookups_failed: Arc::new(AtomicU64::new(0)),
        };

        Ok((coordinator, result_rx))
    }
}

impl<C: CameraSession, L: ProductLookup> Default for ScanCoordinatorBuilder<C, L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::MockCameraSession;
    use foodscan_core::error::CameraError;
    use foodscan_core::types::{Nutriments, Symbology};
    use foodscan_lookup::MockLookupClient;

    fn sample_product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_owned(),
            name: name.to_owned(),
            brands: None,
            ingredients: None,
            nutriments: Nutriments::default(),
            image_url: None,
            nutrition_grade: None,
        }
    }

    fn build_coordinator(
        camera: MockCameraSession,
        lookup: MockLookupClient,
    ) -> (
        ScanCoordinator<MockCameraSession, MockLookupClient>,
        Arc<MockCameraSession>,
        Arc<MockLookupClient>,
        mpsc::Receiver<ScanResultEvent>,
    ) {
        let camera = Arc::new(camera);
        let lookup = Arc::new(lookup);
        let (coordinator, result_rx) = ScanCoordinatorBuilder::new()
            .camera(Arc::clone(&camera))
            .lookup(Arc::clone(&lookup))
            .build()
            .unwrap();
        (coordinator, camera, lookup, result_rx.unwrap())
    }

    /// 소유 태스크와 스폰된 조회/쿨다운 태스크가 처리를 끝낼 때까지
    /// 짧게 대기합니다 (일시정지된 시계에서는 즉시 진행됨).
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[test]
    fn builder_creates_coordinator() {
        let (coordinator, _, _, _) =
            build_coordinator(MockCameraSession::new(), MockLookupClient::new());
        assert_eq!(coordinator.lifecycle_name(), "initialized");
        assert_eq!(coordinator.phase(), ScanPhase::Uninitialized);
    }

    #[test]
    fn builder_with_external_result_sender() {
        let (tx, _rx) = mpsc::channel(8);
        let (_coordinator, result_rx) = ScanCoordinatorBuilder::new()
            .camera(Arc::new(MockCameraSession::new()))
            .lookup(Arc::new(MockLookupClient::new()))
            .result_sender(tx)
            .build()
            .unwrap();
        assert!(result_rx.is_none());
    }

    #[test]
    fn builder_rejects_missing_camera() {
        let result = ScanCoordinatorBuilder::<MockCameraSession, MockLookupClient>::new()
            .lookup(Arc::new(MockLookupClient::new()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = ScanCoordinatorBuilder::new()
            .camera(Arc::new(MockCameraSession::new()))
            .lookup(Arc::new(MockLookupClient::new()))
            .config(ScannerConfig {
                barcode_channel_capacity: 0, // invalid
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn start_stop_lifecycle() {
        let (mut coordinator, camera, _, _) =
            build_coordinator(MockCameraSession::new(), MockLookupClient::new());

        coordinator.start().await.unwrap();
        assert_eq!(coordinator.lifecycle_name(), "running");
        assert_eq!(coordinator.phase(), ScanPhase::Ready);
        assert!(camera.is_running());
        assert!(coordinator.health_check().await.is_healthy());

        // Double start should fail
        assert!(coordinator.start().await.is_err());

        coordinator.stop().await.unwrap();
        assert_eq!(coordinator.lifecycle_name(), "stopped");
        assert_eq!(coordinator.phase(), ScanPhase::Stopped);
        assert!(!camera.is_running());
        assert_eq!(camera.stop_calls(), 1);

        // Double stop should fail
        assert!(coordinator.stop().await.is_err());

        // Restart after stop should fail (command receiver consumed)
        let err = coordinator.start().await;
        assert!(err.is_err());
        let err_msg = format!("{err:?}");
        assert!(err_msg.contains("command receiver not available"));
    }

    #[tokio::test]
    async fn start_passes_configured_symbologies_to_camera() {
        let (mut coordinator, camera, _, _) =
            build_coordinator(MockCameraSession::new(), MockLookupClient::new());
        coordinator.start().await.unwrap();
        assert_eq!(camera.configured_symbologies(), Symbology::all().to_vec());
        coordinator.stop().await.unwrap();
    }

    #[tokio::test]
    async fn denied_authorization_publishes_error() {
        let camera =
            MockCameraSession::new().with_authorization_error(CameraError::AuthorizationDenied);
        let (mut coordinator, camera, _, _) =
            build_coordinator(camera, MockLookupClient::new());

        // 권한 거부는 start() 실패가 아니라 게시되는 에러
        coordinator.start().await.unwrap();

        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::AuthorizationDenied);
        assert!(!state.is_camera_authorized);
        assert!(state.error_message.contains("denied"));
        assert!(!camera.is_running());
        assert!(coordinator.health_check().await.is_degraded());

        coordinator.stop().await.unwrap();
    }

    #[tokio::test]
    async fn restricted_authorization_publishes_error() {
        let camera = MockCameraSession::new()
            .with_authorization_error(CameraError::AuthorizationRestricted);
        let (mut coordinator, _, _, _) = build_coordinator(camera, MockLookupClient::new());

        coordinator.start().await.unwrap();
        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::AuthorizationDenied);
        assert_eq!(state.error_message, "Camera access is restricted");

        coordinator.stop().await.unwrap();
    }

    #[tokio::test]
    async fn configure_failure_stays_in_configuring() {
        let camera = MockCameraSession::new()
            .with_configure_error(CameraError::DeviceUnavailable("no device".to_owned()));
        let (mut coordinator, _, _, _) = build_coordinator(camera, MockLookupClient::new());

        coordinator.start().await.unwrap();

        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::Configuring);
        assert!(state.is_camera_authorized);
        assert_eq!(state.error_message, "No camera detected");
        assert_eq!(state.status_message, "Camera setup failed");
        assert!(coordinator.health_check().await.is_degraded());

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn found_product_publishes_result_ready_then_ready() {
        let lookup = MockLookupClient::new();
        lookup.push_response(Ok(sample_product("111", "Test")));
        let (mut coordinator, camera, _, mut result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("111", Symbology::Ean13).await;
        settle().await;

        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::ResultReady);
        assert!(!state.is_loading);
        assert!(!state.has_error());
        assert_eq!(state.status_message, "Found: Test");
        let product = state.product.unwrap();
        assert_eq!(product.id, "111");
        assert_eq!(product.name, "Test");

        let event = result_rx.recv().await.unwrap();
        assert_eq!(event.barcode, "111");
        assert!(matches!(event.outcome, ScanOutcome::Found(ref p) if p.id == "111"));

        // 쿨다운 경과 후 Ready로 복귀
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(coordinator.phase(), ScanPhase::Ready);
        assert_eq!(coordinator.lookups_succeeded(), 1);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_publishes_error_and_idle_prompt() {
        let lookup = MockLookupClient::new();
        lookup.push_response(Err(LookupError::NotFound {
            barcode: "1234567890123".to_owned(),
        }));
        let (mut coordinator, camera, _, mut result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("1234567890123", Symbology::Ean13).await;
        settle().await;

        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::LookupFailed);
        assert!(state.error_message.contains("1234567890123"));
        assert_eq!(state.status_message, IDLE_PROMPT);
        assert!(!state.is_loading);
        assert!(state.product.is_none());

        let event = result_rx.recv().await.unwrap();
        assert!(matches!(event.outcome, ScanOutcome::NotFound));
        assert_eq!(coordinator.lookups_failed(), 1);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_publishes_failed_outcome() {
        let lookup = MockLookupClient::new();
        lookup.push_response(Err(LookupError::Transport {
            reason: "connection reset".to_owned(),
            status: None,
        }));
        let (mut coordinator, camera, _, mut result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("111", Symbology::Ean13).await;
        settle().await;

        let state = coordinator.subscribe().borrow().clone();
        assert!(state.error_message.contains("connection reset"));

        let event = result_rx.recv().await.unwrap();
        assert!(matches!(event.outcome, ScanOutcome::Failed(_)));

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn admission_sequence_accepts_two_of_aaab() {
        // [A, A, A, B]에서 정확히 두 번의 조회 (A 한 번, B 한 번)
        let lookup = MockLookupClient::new();
        lookup.push_response(Ok(sample_product("A", "First")));
        lookup.push_response(Ok(sample_product("B", "Second")));
        let (mut coordinator, camera, lookup, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Code128).await;
        settle().await;
        // 쿨다운 경과 후에도 같은 코드는 재승인되지 않음
        tokio::time::sleep(Duration::from_millis(1100)).await;
        camera.emit("A", Symbology::Code128).await;
        settle().await;
        camera.emit("A", Symbology::Code128).await;
        settle().await;
        camera.emit("B", Symbology::Code128).await;
        settle().await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(lookup.call_count(), 2);
        assert_eq!(lookup.requested_barcodes(), vec!["A", "B"]);
        assert_eq!(coordinator.scans_accepted(), 2);
        assert_eq!(coordinator.scans_dropped(), 2);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn single_flight_drops_event_during_lookup() {
        let lookup = MockLookupClient::new().with_delay(Duration::from_millis(500));
        lookup.push_response(Ok(sample_product("A", "First")));
        lookup.push_response(Ok(sample_product("B", "Second")));
        let (mut coordinator, camera, lookup, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        assert_eq!(coordinator.phase(), ScanPhase::LookupInFlight);

        // A의 조회가 진행 중인 동안 B는 버려짐
        camera.emit("B", Symbology::Ean13).await;
        settle().await;
        assert_eq!(lookup.call_count(), 1);
        assert_eq!(coordinator.scans_dropped(), 1);

        // A 완료 + 쿨다운 경과 후 B는 승인됨
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(coordinator.phase(), ScanPhase::ResultReady);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        camera.emit("B", Symbology::Ean13).await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(lookup.call_count(), 2);
        assert_eq!(lookup.requested_barcodes(), vec!["A", "B"]);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_blocks_new_barcode_until_elapsed() {
        let lookup = MockLookupClient::new();
        lookup.push_response(Ok(sample_product("A", "First")));
        lookup.push_response(Ok(sample_product("B", "Second")));
        let (mut coordinator, camera, lookup, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        assert_eq!(lookup.call_count(), 1);

        // 조회는 끝났지만 쿨다운(1초)이 지나지 않음 -- 새 코드도 거부
        tokio::time::sleep(Duration::from_millis(300)).await;
        camera.emit("B", Symbology::Ean13).await;
        settle().await;
        assert_eq!(lookup.call_count(), 1);
        assert_eq!(coordinator.scans_dropped(), 1);

        // 쿨다운 경과 후에는 승인
        tokio::time::sleep(Duration::from_millis(800)).await;
        camera.emit("B", Symbology::Ean13).await;
        settle().await;
        assert_eq!(lookup.call_count(), 2);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn same_barcode_not_readmitted_after_cooldown() {
        // 쿨다운은 승인 모드만 복원하고 마지막 바코드는 지우지 않음
        let lookup = MockLookupClient::new();
        lookup.push_response(Ok(sample_product("A", "First")));
        let (mut coordinator, camera, lookup, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;

        camera.emit("A", Symbology::Ean13).await;
        settle().await;

        assert_eq!(lookup.call_count(), 1);
        assert_eq!(coordinator.scans_dropped(), 1);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_still_blocks_duplicate() {
        // 조회 실패도 마지막 승인 바코드를 남기므로 같은 코드는 재시도되지 않음
        let lookup = MockLookupClient::new();
        lookup.push_response(Err(LookupError::NotFound {
            barcode: "A".to_owned(),
        }));
        let (mut coordinator, camera, lookup, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        camera.emit("A", Symbology::Ean13).await;
        settle().await;

        assert_eq!(lookup.call_count(), 1);
        assert_eq!(coordinator.scans_dropped(), 1);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reset_allows_same_barcode_again() {
        let lookup = MockLookupClient::new();
        lookup.push_response(Ok(sample_product("A", "First")));
        lookup.push_response(Ok(sample_product("A", "First")));
        let (mut coordinator, camera, lookup, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        coordinator.reset_scan_state().unwrap();
        settle().await;

        // reset은 상태 메시지/에러를 초기화하지만 제품은 남겨둠
        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::Ready);
        assert_eq!(state.status_message, IDLE_PROMPT);
        assert!(!state.has_error());
        assert!(state.product.is_some());

        camera.emit("A", Symbology::Ean13).await;
        settle().await;

        assert_eq!(lookup.call_count(), 2);
        assert_eq!(coordinator.scans_accepted(), 2);

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_published_error() {
        let lookup = MockLookupClient::new();
        lookup.push_response(Err(LookupError::NotFound {
            barcode: "A".to_owned(),
        }));
        let (mut coordinator, camera, _, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        assert!(coordinator.subscribe().borrow().has_error());

        coordinator.reset_scan_state().unwrap();
        settle().await;
        assert!(!coordinator.subscribe().borrow().has_error());

        coordinator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn late_completion_after_stop_is_noop() {
        let lookup = MockLookupClient::new().with_delay(Duration::from_millis(500));
        lookup.push_response(Ok(sample_product("A", "First")));
        let (mut coordinator, camera, _, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        assert_eq!(coordinator.phase(), ScanPhase::LookupInFlight);

        // 조회가 진행 중인 상태에서 정리 -- 이후 완료 신호는 상태를 바꾸지 못함
        coordinator.stop().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::Stopped);
        assert!(state.product.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_restores_default_state_but_keeps_authorization() {
        let lookup = MockLookupClient::new();
        lookup.push_response(Ok(sample_product("A", "First")));
        let (mut coordinator, camera, _, _result_rx) =
            build_coordinator(MockCameraSession::new(), lookup);
        coordinator.start().await.unwrap();

        camera.emit("A", Symbology::Ean13).await;
        settle().await;
        assert!(coordinator.subscribe().borrow().product.is_some());

        coordinator.stop().await.unwrap();

        let state = coordinator.subscribe().borrow().clone();
        assert_eq!(state.phase, ScanPhase::Stopped);
        assert_eq!(state.status_message, IDLE_PROMPT);
        assert!(!state.has_error());
        assert!(state.product.is_none());
        assert!(!state.is_loading);
        assert!(state.is_camera_authorized);
    }
}
