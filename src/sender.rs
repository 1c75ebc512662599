//! 송신자 (클라이언트측)
//!
//! - 파일을 MSS 단위 세그먼트로 분할
//! - Stop-and-Wait: 모든 목적지가 ACK한 뒤 다음 세그먼트 전송
//! - 선택적 재전송: 타임아웃 시 ACK하지 않은 목적지에만 재전송

use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;

use tokio::io::AsyncRead;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::message::Ack;
use crate::segment::{Segment, SegmentBuilder};
use crate::stats::SenderStats;
use crate::{Error, Outcome, Result, SenderConfig, ACK_SIZE, MAX_MSS};

/// 목적지별 전송 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationState {
    /// 목적지 주소
    pub address: SocketAddr,

    /// 마지막으로 확인된 시퀀스 번호 (첫 ACK 전에는 None)
    pub last_confirmed_sequence: Option<u32>,

    /// 이번 라운드에 받은 최근 ACK 원본 (라운드마다 초기화)
    pub pending_ack_bytes: Option<[u8; ACK_SIZE]>,
}

impl DestinationState {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            last_confirmed_sequence: None,
            pending_ack_bytes: None,
        }
    }

    /// `sequence` 확인 여부
    pub fn is_confirmed(&self, sequence: u32) -> bool {
        self.last_confirmed_sequence == Some(sequence)
    }

    /// 수신한 ACK 기록 및 평가
    ///
    /// `sequence`를 확인하는 유효한 ACK이면 true. 그 외 내용은 무시한다.
    pub fn record_ack(&mut self, datagram: &[u8], sequence: u32) -> bool {
        let Ok(raw) = <[u8; ACK_SIZE]>::try_from(datagram) else {
            return false;
        };
        self.pending_ack_bytes = Some(raw);

        match Ack::from_bytes(&raw) {
            Ok(ack) if ack.confirms(sequence) => {
                self.last_confirmed_sequence = Some(sequence);
                true
            }
            _ => false,
        }
    }
}

/// 라운드 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundOutcome {
    /// 모든 목적지 확인
    AllConfirmed,

    /// 타임아웃, 미확인 목적지 수
    TimedOut { pending: usize },
}

/// 송신자
pub struct Sender {
    /// 설정
    config: SenderConfig,

    /// 목적지별 상태
    destinations: Vec<DestinationState>,

    /// 전송 통계
    stats: SenderStats,
}

impl Sender {
    /// 새 송신자 생성
    pub fn new(config: SenderConfig) -> Result<Self> {
        config.validate()?;

        // ACK는 출처 주소로 목적지를 찾으므로 주소당 상태는 하나
        let mut destinations: Vec<DestinationState> = Vec::with_capacity(config.destinations.len());
        for &address in &config.destinations {
            if destinations.iter().any(|d| d.address == address) {
                warn!("중복 목적지 무시: {}", address);
                continue;
            }
            destinations.push(DestinationState::new(address));
        }

        Ok(Self {
            config,
            destinations,
            stats: SenderStats::new(),
        })
    }

    /// 설정된 파일 전송
    pub async fn run(&mut self) -> Result<()> {
        let file = tokio::fs::File::open(&self.config.file_path).await?;
        info!(
            "전송 시작: {:?} -> {} 목적지, MSS={}, timeout={:?}",
            self.config.file_path,
            self.destinations.len(),
            self.config.mss,
            self.config.timeout
        );
        self.send_from(file).await
    }

    /// 중단 신호까지 전송
    ///
    /// 중단 시 더 이상 세그먼트를 보내지 않으며 목적지에 알리지도 않는다.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<Outcome>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result.map(|()| Outcome::Completed),
            () = shutdown => {
                warn!("전송 중단됨");
                Ok(Outcome::Cancelled)
            }
        }
    }

    /// 임의 입력 전송
    pub async fn send_from<R: AsyncRead + Unpin>(&mut self, reader: R) -> Result<()> {
        let mut builder = SegmentBuilder::new(reader, self.config.mss);

        while let Some(segment) = builder.next_segment().await? {
            self.deliver(&segment).await?;

            if self.stats.segments % 100 == 0 {
                info!(
                    "Progress: {} segments, {} bytes",
                    self.stats.segments, self.stats.payload_bytes
                );
            }
        }

        info!("전송 완료: {}", self.stats.summary());
        Ok(())
    }

    /// 한 세그먼트를 모든 목적지가 확인할 때까지 전송
    async fn deliver(&mut self, segment: &Segment) -> Result<()> {
        let sequence = segment.header.sequence;
        let datagram = segment.to_bytes();
        let mut rounds = 0u32;

        debug!(
            "세그먼트 전송: sequence={}, {} bytes, last={}",
            sequence,
            segment.payload.len(),
            segment.is_last()
        );

        loop {
            if let Some(max_rounds) = self.config.max_rounds {
                if rounds >= max_rounds {
                    let pending = self.pending_count(sequence);
                    return Err(Error::RetransmitLimit { sequence, pending });
                }
            }

            let retransmit = rounds > 0;
            rounds += 1;

            match self.transmit_round(sequence, &datagram, retransmit).await? {
                RoundOutcome::AllConfirmed => break,
                RoundOutcome::TimedOut { pending } => {
                    self.stats.timeouts += 1;
                    debug!(
                        "Timeout, sequence number = {} ({} 목적지 미확인)",
                        sequence, pending
                    );
                }
            }
        }

        self.stats.segments += 1;
        self.stats.payload_bytes += segment.payload.len() as u64;
        Ok(())
    }

    /// 재전송 라운드 1회
    ///
    /// 라운드마다 새 소켓을 열고 라운드가 끝나면 닫는다.
    async fn transmit_round(
        &mut self,
        sequence: u32,
        datagram: &[u8],
        retransmit: bool,
    ) -> Result<RoundOutcome> {
        let socket = UdpSocket::bind(self.config.bind_addr).await?;
        self.stats.rounds += 1;

        let mut pending = 0usize;
        for dest in self.destinations.iter_mut() {
            dest.pending_ack_bytes = None;
            if dest.is_confirmed(sequence) {
                continue;
            }

            socket.send_to(datagram, dest.address).await?;
            pending += 1;

            self.stats.datagrams_sent += 1;
            if retransmit {
                self.stats.retransmissions += 1;
            }
        }

        let deadline = Instant::now() + self.config.timeout;
        let mut buf = [0u8; MAX_MSS];

        while pending > 0 {
            let Some((len, from)) = recv_until(&socket, &mut buf, deadline).await? else {
                return Ok(RoundOutcome::TimedOut { pending });
            };

            let confirmed = match self.destinations.iter_mut().find(|d| d.address == from) {
                Some(dest) if !dest.is_confirmed(sequence) => {
                    dest.record_ack(&buf[..len], sequence)
                }
                _ => false,
            };

            if confirmed {
                pending -= 1;
                self.stats.acks_accepted += 1;
            } else {
                self.stats.acks_ignored += 1;
                debug!("ACK 무시: from={}, {} bytes", from, len);
            }
        }

        Ok(RoundOutcome::AllConfirmed)
    }

    fn pending_count(&self, sequence: u32) -> usize {
        self.destinations
            .iter()
            .filter(|d| !d.is_confirmed(sequence))
            .count()
    }

    /// 목적지 상태
    pub fn destinations(&self) -> &[DestinationState] {
        &self.destinations
    }

    /// 통계 반환
    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// 설정 반환
    pub fn config(&self) -> &SenderConfig {
        &self.config
    }
}

/// 마감 시각까지 데이터그램 수신
///
/// 타임아웃은 에러가 아니라 `None`.
async fn recv_until(
    socket: &UdpSocket,
    buf: &mut [u8],
    deadline: Instant,
) -> Result<Option<(usize, SocketAddr)>> {
    loop {
        match tokio::time::timeout_at(deadline, socket.recv_from(buf)).await {
            Err(_) => return Ok(None),
            Ok(Ok(received)) => return Ok(Some(received)),
            // ICMP 도달 불가 통지, 해당 목적지는 다음 라운드에 재시도
            Ok(Err(e))
                if matches!(
                    e.kind(),
                    ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset
                ) =>
            {
                warn!("수신 에러: {}", e);
            }
            Ok(Err(e)) => return Err(e.into()),
        }
    }
}
