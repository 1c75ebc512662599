//! 프로토콜 설정

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result, HEADER_SIZE, MAX_MSS, MIN_PORT_EXCLUSIVE};

/// 송신자 설정
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// 목적지 주소 목록 (IPv4)
    pub destinations: Vec<SocketAddr>,

    /// 전송할 파일 경로
    pub file_path: PathBuf,

    /// 최대 세그먼트 크기 (헤더 포함)
    pub mss: usize,

    /// 재전송 라운드 타임아웃
    pub timeout: Duration,

    /// 측정 RTT로 타임아웃을 정할 때의 하한
    pub min_timeout: Duration,

    /// 측정 RTT로 타임아웃을 정할 때의 상한
    pub max_timeout: Duration,

    /// RTT 측정 시도당 제한 시간
    pub probe_limit: Duration,

    /// 라운드마다 새로 여는 소켓의 바인드 주소
    pub bind_addr: SocketAddr,

    /// 세그먼트당 최대 라운드 수 (None이면 무제한)
    pub max_rounds: Option<u32>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            file_path: PathBuf::new(),
            mss: 500,
            timeout: Duration::from_millis(200),
            min_timeout: Duration::from_millis(50),
            max_timeout: Duration::from_secs(5),
            probe_limit: Duration::from_secs(2),
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            max_rounds: None,
        }
    }
}

impl SenderConfig {
    /// 새 설정 생성
    pub fn new(destinations: Vec<SocketAddr>, file_path: impl Into<PathBuf>, mss: usize) -> Self {
        Self {
            destinations,
            file_path: file_path.into(),
            mss,
            ..Self::default()
        }
    }

    /// 측정된 최대 RTT로 타임아웃 설정
    pub fn with_measured_rtt(mut self, rtt: Duration) -> Self {
        self.timeout = rtt.clamp(self.min_timeout, self.max_timeout);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        check_mss(self.mss)?;
        if self.destinations.is_empty() {
            return Err(Error::NoDestinations);
        }
        if !self.file_path.is_file() {
            return Err(Error::InputFileMissing(self.file_path.clone()));
        }
        if self.max_rounds == Some(0) {
            return Err(Error::ZeroMaxRounds);
        }
        Ok(())
    }
}

/// 수신자 설정
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// 수신 바인드 주소
    pub bind_addr: SocketAddr,

    /// 출력 파일 경로 (존재하면 안 됨)
    pub output_path: PathBuf,

    /// 인위적 패킷 손실 확률 (0.0 ~ 1.0)
    pub loss_probability: f64,

    /// 손실 시뮬레이션 RNG 시드 (None이면 엔트로피)
    pub seed: Option<u64>,

    /// 수신 버퍼 크기
    pub recv_buffer_size: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 7735)),
            output_path: PathBuf::new(),
            loss_probability: 0.0,
            seed: None,
            recv_buffer_size: MAX_MSS,
        }
    }
}

impl ReceiverConfig {
    /// 새 설정 생성
    pub fn new(bind_addr: SocketAddr, output_path: impl Into<PathBuf>, loss_probability: f64) -> Self {
        Self {
            bind_addr,
            output_path: output_path.into(),
            loss_probability,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        check_loss_probability(self.loss_probability)?;
        if self.output_path.exists() {
            return Err(Error::OutputFileExists(self.output_path.clone()));
        }
        Ok(())
    }
}

/// MSS 범위 검사 (8 < MSS <= 2048)
pub fn check_mss(mss: usize) -> Result<usize> {
    if mss <= HEADER_SIZE || mss > MAX_MSS {
        return Err(Error::MssOutOfRange { mss, max: MAX_MSS });
    }
    Ok(mss)
}

/// 포트 범위 검사 (1024 < port <= 65535)
pub fn check_port(port: u32) -> Result<u16> {
    if port <= u32::from(MIN_PORT_EXCLUSIVE) || port > u32::from(u16::MAX) {
        return Err(Error::PortOutOfRange { port });
    }
    Ok(port as u16)
}

/// 손실 확률 범위 검사 (0 <= p <= 1)
pub fn check_loss_probability(probability: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(Error::LossProbabilityOutOfRange(probability));
    }
    Ok(probability)
}
