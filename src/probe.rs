//! 목적지 RTT 측정
//!
//! 전송 전에 한 번, 각 목적지의 HTTP 포트로 TCP 연결을 시도해 걸린 시간을 잰다.
//! 연결 성공이든 거부든 경과 시간을 RTT로 사용하며, 가장 큰 값이 재전송
//! 타임아웃의 기준이 된다.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tracing::debug;

/// RTT 측정에 사용하는 포트
pub const PROBE_PORT: u16 = 80;

/// 단일 목적지 RTT 측정
///
/// 시도는 `limit`을 넘지 않는다.
pub async fn probe_rtt(ip: IpAddr, limit: Duration) -> Duration {
    probe_addr(SocketAddr::new(ip, PROBE_PORT), limit).await
}

/// 지정 주소로 RTT 측정
pub async fn probe_addr(addr: SocketAddr, limit: Duration) -> Duration {
    let start = Instant::now();
    let result = tokio::time::timeout(limit, TcpStream::connect(addr)).await;
    let rtt = start.elapsed().min(limit);

    match result {
        Ok(Ok(_)) => debug!("RTT 측정 {}: {:?} (연결)", addr, rtt),
        Ok(Err(e)) => debug!("RTT 측정 {}: {:?} ({})", addr, rtt, e),
        Err(_) => debug!("RTT 측정 {}: 제한 시간 {:?} 초과", addr, limit),
    }

    rtt
}

/// 모든 목적지 중 최대 RTT
pub async fn max_rtt(ips: &[IpAddr], limit: Duration) -> Duration {
    let mut max = Duration::ZERO;
    for &ip in ips {
        max = max.max(probe_rtt(ip, limit).await);
    }
    max
}
