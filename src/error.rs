//! 에러 타입 정의

use std::path::PathBuf;

use thiserror::Error;

/// P2MP-FTP 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("잘못된 인자: {0}")]
    Usage(String),

    #[error("MSS 범위 초과: {mss} (8 < MSS <= {max})")]
    MssOutOfRange { mss: usize, max: usize },

    #[error("포트 범위 초과: {port} (1024 < port <= 65535)")]
    PortOutOfRange { port: u32 },

    #[error("손실 확률 범위 초과: {0} (0 <= p <= 1)")]
    LossProbabilityOutOfRange(f64),

    #[error("입력 파일 없음: {0:?}")]
    InputFileMissing(PathBuf),

    #[error("출력 파일이 이미 존재함: {0:?}")]
    OutputFileExists(PathBuf),

    #[error("목적지 없음")]
    NoDestinations,

    #[error("주소 변환 실패: {0}")]
    AddressResolution(String),

    #[error("패킷 길이 부족: {len} bytes")]
    PacketTooShort { len: usize },

    #[error("알 수 없는 패킷 타입: {0:#06X}")]
    UnknownIndicator(u16),

    #[error("유효하지 않은 ACK")]
    InvalidAck,

    #[error("재전송 라운드 한도는 1 이상이어야 함")]
    ZeroMaxRounds,

    #[error("재전송 한도 초과: sequence={sequence}, 미확인 목적지 {pending}개")]
    RetransmitLimit { sequence: u32, pending: usize },
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
