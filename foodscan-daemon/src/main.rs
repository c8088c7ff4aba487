use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use foodscan_core::config::FoodscanConfig;
use foodscan_core::error::{ConfigError, FoodscanError};
use foodscan_core::event::ScanOutcome;
use foodscan_core::pipeline::Pipeline;
use foodscan_lookup::HttpLookupClient;
use foodscan_scanner::ScanCoordinatorBuilder;

mod camera;

use camera::StdinCameraSession;

/// Foodscan daemon — 바코드 스캔과 제품 조회 오케스트레이션
#[derive(Parser)]
#[command(name = "foodscan", version, about)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, default_value = "foodscan.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 설정 로드 -- 파일이 없으면 기본값 + 환경변수 오버라이드로 기동
    let (config, config_missing) = match FoodscanConfig::load(&cli.config).await {
        Ok(config) => (config, false),
        Err(FoodscanError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = FoodscanConfig::default();
            config.apply_env_overrides();
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
            (config, true)
        }
        Err(e) => return Err(anyhow::anyhow!("failed to load configuration: {}", e)),
    };

    // 로깅 초기화
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("{},foodscan=debug", config.general.log_level));
    if config.general.log_format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("foodscan-daemon starting");
    if config_missing {
        tracing::warn!(path = %cli.config, "config file not found, using defaults");
    }

    // Prometheus 익스포터 (설정 시)
    if !config.general.metrics_bind.is_empty() {
        let addr: std::net::SocketAddr = config
            .general
            .metrics_bind
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid metrics_bind address: {}", e))?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("failed to install prometheus exporter: {}", e))?;
        foodscan_core::metrics::describe_all();
        tracing::info!(addr = %addr, "prometheus exporter listening");
    }

    // 조회 클라이언트 생성
    let lookup = Arc::new(
        HttpLookupClient::new(&config.lookup)
            .map_err(|e| anyhow::anyhow!("failed to create lookup client: {}", e))?,
    );
    tracing::info!(base_url = %config.lookup.base_url, "lookup client initialized");

    // 스캔 코디네이터 빌드
    let camera = Arc::new(StdinCameraSession::new());
    let (mut coordinator, result_rx) = ScanCoordinatorBuilder::new()
        .config(config.scanner.clone())
        .camera(camera)
        .lookup(lookup)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build scan coordinator: {}", e))?;

    tracing::info!("scan coordinator initialized");

    // 게시 상태 변경 로깅
    let mut state_rx = coordinator.subscribe();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow_and_update().clone();
            tracing::info!(
                phase = %state.phase,
                status = %state.status_message,
                loading = state.is_loading,
                "scan state changed"
            );
            if state.has_error() {
                tracing::warn!(error = %state.error_message, "scan error published");
            }
        }
    });

    // 스캔 결과 이벤트 로깅
    if let Some(mut result_rx) = result_rx {
        tokio::spawn(async move {
            while let Some(event) = result_rx.recv().await {
                match &event.outcome {
                    ScanOutcome::Found(product) => {
                        tracing::info!(barcode = %event.barcode, product = %product, "product found");
                    }
                    ScanOutcome::NotFound => {
                        tracing::info!(barcode = %event.barcode, "product not in database");
                    }
                    ScanOutcome::Failed(reason) => {
                        tracing::warn!(barcode = %event.barcode, reason = %reason, "lookup failed");
                    }
                }
            }
        });
    }

    // 코디네이터 시작
    coordinator
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start scan coordinator: {}", e))?;
    tracing::info!("scan coordinator started");

    // 종료 시그널 대기
    tracing::info!("foodscan-daemon running — scan barcodes on stdin");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // 우아한 종료
    if let Err(e) = coordinator.stop().await {
        tracing::error!(error = %e, "failed to stop scan coordinator");
    }

    tracing::info!("foodscan-daemon shut down");
    Ok(())
}
