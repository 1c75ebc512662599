//! # P2MP-FTP (Point-to-Multipoint File Transfer Protocol)
//!
//! UDP 기반 1:N Stop-and-Wait ARQ 파일 전송 프로토콜
//!
//! ## 핵심 특징
//! - **Stop-and-Wait**: 한 번에 하나의 세그먼트만 전송, 모든 목적지의 ACK 후 다음 세그먼트
//! - **선택적 재전송**: ACK를 보내지 않은 목적지에만 재전송
//! - **16비트 1의 보수 체크섬**: 헤더 + 페이로드 손상 검출
//! - **손실 시뮬레이션**: 수신측에서 확률적으로 패킷 폐기

pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod message;
pub mod probe;
pub mod receiver;
pub mod segment;
pub mod sender;
pub mod stats;

pub use config::{ReceiverConfig, SenderConfig};
pub use error::{Error, Result};
pub use message::{Ack, PacketType};
pub use receiver::{DropReason, Receiver, ReceiverSession, Verdict};
pub use segment::{Segment, SegmentBuilder, SegmentHeader};
pub use sender::{DestinationState, Sender};
pub use stats::{ReceiverStats, SenderStats};

/// 데이터 세그먼트 헤더 크기 (바이트)
pub const HEADER_SIZE: usize = 8;

/// ACK 패킷 크기 (바이트)
pub const ACK_SIZE: usize = 8;

/// 최대 세그먼트 크기 (헤더 포함)
pub const MAX_MSS: usize = 2048;

/// 포트 번호 하한 (이 값은 허용되지 않음)
pub const MIN_PORT_EXCLUSIVE: u16 = 1024;

/// 엔진 실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 정상 완료
    Completed,

    /// 사용자 중단 (Ctrl-C)
    Cancelled,
}

/// 시퀀스 번호 증가
///
/// 32비트 범위를 넘으면 `0xffffffff`를 뺀다. (2^32 모듈러 연산과 1 차이가 남)
pub fn advance_sequence(sequence: u32, by: usize) -> u32 {
    let next = u64::from(sequence) + by as u64;
    if next > u64::from(u32::MAX) {
        (next - u64::from(u32::MAX)) as u32
    } else {
        next as u32
    }
}
