//! 전송 통계

use std::time::{Duration, Instant};

/// 송신자 통계
#[derive(Debug, Clone)]
pub struct SenderStats {
    /// 시작 시간
    pub start_time: Instant,

    /// 완료된 세그먼트 수 (모든 목적지 확인)
    pub segments: u64,

    /// 전송한 총 데이터그램 수
    pub datagrams_sent: u64,

    /// 재전송 데이터그램 수
    pub retransmissions: u64,

    /// 총 재전송 라운드 수 (첫 전송 포함)
    pub rounds: u64,

    /// 타임아웃으로 끝난 라운드 수
    pub timeouts: u64,

    /// 유효한 ACK 수
    pub acks_accepted: u64,

    /// 무시된 ACK 수 (시퀀스 불일치, 형식 오류, 알 수 없는 출처)
    pub acks_ignored: u64,

    /// 확인된 페이로드 바이트
    pub payload_bytes: u64,
}

impl SenderStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            segments: 0,
            datagrams_sent: 0,
            retransmissions: 0,
            rounds: 0,
            timeouts: 0,
            acks_accepted: 0,
            acks_ignored: 0,
            payload_bytes: 0,
        }
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 처리율 (bytes/sec)
    pub fn throughput(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }
        self.payload_bytes as f64 / elapsed
    }

    /// 재전송 비율
    pub fn retransmission_ratio(&self) -> f64 {
        if self.datagrams_sent == 0 {
            return 0.0;
        }
        self.retransmissions as f64 / self.datagrams_sent as f64
    }

    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Elapsed: {:.2}s | Segments: {} | Bytes: {} ({:.1} KB/s) | Datagrams: {} | Retransmits: {} ({:.1}%) | Rounds: {} | Timeouts: {}",
            self.elapsed().as_secs_f64(),
            self.segments,
            self.payload_bytes,
            self.throughput() / 1024.0,
            self.datagrams_sent,
            self.retransmissions,
            self.retransmission_ratio() * 100.0,
            self.rounds,
            self.timeouts,
        )
    }
}

impl Default for SenderStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 수신자 통계
#[derive(Debug, Clone)]
pub struct ReceiverStats {
    /// 시작 시간
    pub start_time: Instant,

    /// 수신한 총 데이터그램 수
    pub datagrams: u64,

    /// 손실 시뮬레이션으로 폐기
    pub dropped_by_loss: u64,

    /// 체크섬 오류로 폐기
    pub dropped_corrupt: u64,

    /// 알 수 없는 타입 / 길이 부족으로 폐기
    pub dropped_malformed: u64,

    /// 순서가 맞지 않아 재ACK
    pub out_of_order: u64,

    /// 수락된 세그먼트 수
    pub accepted: u64,

    /// 파일에 기록한 바이트
    pub bytes_written: u64,
}

impl ReceiverStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            datagrams: 0,
            dropped_by_loss: 0,
            dropped_corrupt: 0,
            dropped_malformed: 0,
            out_of_order: 0,
            accepted: 0,
            bytes_written: 0,
        }
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 관측된 손실률 (시뮬레이션 폐기 / 전체)
    pub fn observed_loss_rate(&self) -> f64 {
        if self.datagrams == 0 {
            return 0.0;
        }
        self.dropped_by_loss as f64 / self.datagrams as f64
    }

    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Elapsed: {:.2}s | Datagrams: {} | Accepted: {} | Bytes: {} | Lost: {} ({:.1}%) | Corrupt: {} | Malformed: {} | Out-of-order: {}",
            self.elapsed().as_secs_f64(),
            self.datagrams,
            self.accepted,
            self.bytes_written,
            self.dropped_by_loss,
            self.observed_loss_rate() * 100.0,
            self.dropped_corrupt,
            self.dropped_malformed,
            self.out_of_order,
        )
    }
}

impl Default for ReceiverStats {
    fn default() -> Self {
        Self::new()
    }
}
