//! 수신자 (서버측)
//!
//! - 체크섬 / 시퀀스 검증 후 ACK 전송
//! - 순서가 맞지 않으면 마지막 정상 수신 시퀀스로 재ACK
//! - 체크섬 오류는 조용히 폐기 (NACK 없음, 송신측 타임아웃으로 복구)
//! - 확률적 패킷 손실 시뮬레이션

use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::message::Ack;
use crate::segment::Segment;
use crate::stats::ReceiverStats;
use crate::{advance_sequence, Outcome, ReceiverConfig, Result};

/// 폐기 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// 헤더 길이 부족 또는 알 수 없는 패킷 타입
    Malformed,

    /// 체크섬 오류
    Corrupt,
}

/// 데이터그램 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 폐기 (ACK 없음)
    Drop(DropReason),

    /// 순서 불일치, 상태 변경 없이 재ACK
    Reack { ack: Ack, received: u32 },

    /// 수락: ACK 후 페이로드 기록
    Accept { ack: Ack, payload: Bytes, last: bool },
}

/// 수신 세션 상태 (단일 스트림)
#[derive(Debug, Clone, Default)]
pub struct ReceiverSession {
    expected_sequence: u32,
}

impl ReceiverSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지정한 기대 시퀀스로 시작
    pub fn starting_at(expected_sequence: u32) -> Self {
        Self { expected_sequence }
    }

    /// 다음에 수락할 시퀀스 번호
    pub fn expected_sequence(&self) -> u32 {
        self.expected_sequence
    }

    /// 데이터그램 1개 처리
    pub fn on_datagram(&mut self, datagram: &[u8]) -> Verdict {
        let segment = match Segment::from_bytes(datagram) {
            Ok(segment) => segment,
            Err(e) => {
                debug!("Packet dropped, not a data packet: {}", e);
                return Verdict::Drop(DropReason::Malformed);
            }
        };

        if !segment.verify_checksum() {
            debug!(
                "Packet is corrupted, dropping it: sequence={}",
                segment.header.sequence
            );
            return Verdict::Drop(DropReason::Corrupt);
        }

        let ack = Ack::new(self.expected_sequence);
        if segment.header.sequence != self.expected_sequence {
            return Verdict::Reack {
                ack,
                received: segment.header.sequence,
            };
        }

        // 헤더 포함 실제 길이만큼 증가
        self.expected_sequence = advance_sequence(self.expected_sequence, segment.wire_len());

        Verdict::Accept {
            ack,
            last: segment.is_last(),
            payload: segment.payload,
        }
    }
}

/// 수신자
pub struct Receiver {
    /// 설정
    config: ReceiverConfig,

    /// 수신 소켓
    socket: UdpSocket,

    /// 출력 파일 (추가 쓰기 전용)
    output: File,

    /// 세션 상태
    session: ReceiverSession,

    /// 손실 시뮬레이션 RNG
    rng: StdRng,

    /// 수신 통계
    stats: ReceiverStats,
}

impl Receiver {
    /// 소켓 바인딩 및 출력 파일 생성
    pub async fn bind(config: ReceiverConfig) -> Result<Self> {
        config.validate()?;

        let socket = UdpSocket::bind(config.bind_addr).await?;
        let output = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&config.output_path)
            .await?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            socket,
            output,
            session: ReceiverSession::new(),
            rng,
            stats: ReceiverStats::new(),
        })
    }

    /// 실제 바인드된 주소
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// 마지막 세그먼트를 받을 때까지 수신
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "P2MP-FTP Server listening on {}, loss probability {}",
            self.local_addr()?,
            self.config.loss_probability
        );

        let mut buf = vec![0u8; self.config.recv_buffer_size];
        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset
                    ) =>
                {
                    warn!("수신 에러: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if self.handle_datagram(&buf[..len], from).await? {
                break;
            }
        }

        self.output.flush().await?;
        info!("수신 완료: {}", self.stats.summary());
        Ok(())
    }

    /// 중단 신호까지 수신
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<Outcome>
    where
        F: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            result = self.run() => result.map(|()| Outcome::Completed)?,
            () = shutdown => Outcome::Cancelled,
        };

        if outcome == Outcome::Cancelled {
            self.output.flush().await?;
            warn!("수신 중단됨 (미완료): {}", self.stats.summary());
        }
        Ok(outcome)
    }

    /// 데이터그램 처리, 마지막 세그먼트를 수락하면 true
    async fn handle_datagram(&mut self, datagram: &[u8], from: SocketAddr) -> Result<bool> {
        self.stats.datagrams += 1;

        if self.simulate_loss() {
            self.stats.dropped_by_loss += 1;
            debug!("손실 시뮬레이션 폐기: from={}", from);
            return Ok(false);
        }

        match self.session.on_datagram(datagram) {
            Verdict::Drop(DropReason::Malformed) => {
                self.stats.dropped_malformed += 1;
            }
            Verdict::Drop(DropReason::Corrupt) => {
                self.stats.dropped_corrupt += 1;
            }
            Verdict::Reack { ack, received } => {
                self.socket.send_to(&ack.to_bytes(), from).await?;
                self.stats.out_of_order += 1;
                debug!(
                    "Packet loss, sequence number = {} (기대값 {})",
                    received, ack.acked_sequence
                );
            }
            Verdict::Accept { ack, payload, last } => {
                self.socket.send_to(&ack.to_bytes(), from).await?;
                self.output.write_all(&payload).await?;
                self.output.flush().await?;

                self.stats.accepted += 1;
                self.stats.bytes_written += payload.len() as u64;
                debug!(
                    "세그먼트 수락: sequence={}, {} bytes, last={}",
                    ack.acked_sequence,
                    payload.len(),
                    last
                );
                return Ok(last);
            }
        }

        Ok(false)
    }

    fn simulate_loss(&mut self) -> bool {
        is_lost(self.rng.gen::<f64>(), self.config.loss_probability)
    }

    /// 세션 상태
    pub fn session(&self) -> &ReceiverSession {
        &self.session
    }

    /// 통계 반환
    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }
}

/// 손실 판정
///
/// `draw`는 `[0, 1)` 균등 분포. `draw < probability`면 폐기하므로
/// p = 0은 절대 폐기하지 않고 p = 1은 항상 폐기한다.
fn is_lost(draw: f64, probability: f64) -> bool {
    draw < probability
}
