//! 생명주기 trait — 모듈 시작/정지/상태 점검 인터페이스
//!
//! 데몬은 [`Pipeline`]을 구현한 모듈을 동일한 생명주기로 관리합니다.

use crate::error::FoodscanError;

/// 모듈 상태 점검 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 동작 중이지만 일부 기능 저하 (사유 포함)
    Degraded(String),
    /// 동작 불가 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 여부를 반환합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 기능 저하 여부를 반환합니다.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// 동작 불가 여부를 반환합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 데몬이 관리하는 모듈의 생명주기 trait
///
/// `start`는 백그라운드 태스크를 스폰하고 즉시 반환합니다.
/// `stop`은 스폰된 태스크를 정리하고 외부 리소스를 해제합니다.
pub trait Pipeline: Send {
    /// 모듈을 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), FoodscanError>> + Send;

    /// 모듈을 정지합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), FoodscanError>> + Send;

    /// 현재 상태를 점검합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
