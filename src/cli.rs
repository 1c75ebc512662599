//! 명령행 인자 처리
//!
//! - 클라이언트(송신자): `<dest1> [dest2 ...] <port> <file> <mss>`
//! - 서버(수신자): `<port> <file> <loss_probability>`

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::config::{check_loss_probability, check_mss, check_port};
use crate::{Error, ReceiverConfig, Result, SenderConfig};

pub const CLIENT_USAGE: &str = r#"usage: p2mp-client <dest1> [dest2 ...] <port> <file> <mss>

  dest1, dest2, ...   목적지(서버) 호스트 이름 또는 IPv4 주소
  port                목적지 포트 (1024 < port <= 65535)
  file                전송할 파일
  mss                 최대 세그먼트 크기, 헤더 포함 (8 < mss <= 2048)

  RUST_LOG=debug 로 상세 로그 출력"#;

pub const SERVER_USAGE: &str = r#"usage: p2mp-server <port> <file> <loss_probability>

  port                수신 포트 (1024 < port <= 65535)
  file                수신 데이터를 기록할 파일 (존재하면 안 됨)
  loss_probability    인위적 패킷 손실 확률 (0 <= p <= 1)

  RUST_LOG=debug 로 상세 로그 출력"#;

/// 파싱 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation<T> {
    Run(T),
    Help,
}

/// 클라이언트 인자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientArgs {
    pub hosts: Vec<String>,
    pub port: u16,
    pub file: PathBuf,
    pub mss: usize,
}

impl ClientArgs {
    /// 인자 파싱 (프로그램 이름 제외)
    pub fn parse(args: &[String]) -> Result<Invocation<Self>> {
        if wants_help(args) {
            return Ok(Invocation::Help);
        }
        if args.len() < 4 {
            return Err(Error::Usage(format!(
                "인자 개수 오류: 최소 4개 필요, {}개 받음",
                args.len()
            )));
        }

        let n = args.len();
        let mss = parse_number(&args[n - 1], "MSS")?;
        let port = parse_number(&args[n - 3], "포트")?;
        let mss = check_mss(usize::try_from(mss).unwrap_or(usize::MAX))?;
        let port = check_port(u32::try_from(port).unwrap_or(u32::MAX))?;

        let file = PathBuf::from(&args[n - 2]);
        if !file.is_file() {
            return Err(Error::InputFileMissing(file));
        }

        Ok(Invocation::Run(Self {
            hosts: args[..n - 3].to_vec(),
            port,
            file,
            mss,
        }))
    }

    /// 호스트 이름을 주소로 변환해 송신자 설정 생성
    pub async fn into_config(self) -> Result<SenderConfig> {
        let mut destinations = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            let addr = resolve_destination(host, self.port).await?;
            if !destinations.contains(&addr) {
                destinations.push(addr);
            }
        }
        Ok(SenderConfig::new(destinations, self.file, self.mss))
    }
}

/// 서버 인자
#[derive(Debug, Clone, PartialEq)]
pub struct ServerArgs {
    pub port: u16,
    pub file: PathBuf,
    pub loss_probability: f64,
}

impl ServerArgs {
    /// 인자 파싱 (프로그램 이름 제외)
    pub fn parse(args: &[String]) -> Result<Invocation<Self>> {
        if wants_help(args) {
            return Ok(Invocation::Help);
        }
        if args.len() != 3 {
            return Err(Error::Usage(format!(
                "인자 개수 오류: 3개 필요, {}개 받음",
                args.len()
            )));
        }

        let port = parse_number(&args[0], "포트")?;
        let port = check_port(u32::try_from(port).unwrap_or(u32::MAX))?;

        let file = PathBuf::from(&args[1]);
        if file.exists() {
            return Err(Error::OutputFileExists(file));
        }

        let loss_probability: f64 = args[2].parse().map_err(|_| {
            Error::Usage(format!("손실 확률이 숫자가 아님: '{}'", args[2]))
        })?;
        let loss_probability = check_loss_probability(loss_probability)?;

        Ok(Invocation::Run(Self {
            port,
            file,
            loss_probability,
        }))
    }

    pub fn into_config(self) -> ReceiverConfig {
        ReceiverConfig::new(
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port)),
            self.file,
            self.loss_probability,
        )
    }
}

/// 목적지 이름을 IPv4 소켓 주소로 변환
pub async fn resolve_destination(host: &str, port: u16) -> Result<SocketAddr> {
    if host == "localhost" {
        return Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, port)));
    }
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(SocketAddr::from((ip, port)));
    }

    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| Error::AddressResolution(format!("{}: {}", host, e)))?;

    addrs
        .find(|addr| matches!(addr.ip(), IpAddr::V4(_)))
        .ok_or_else(|| Error::AddressResolution(format!("{}: IPv4 주소 없음", host)))
}

fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "-h" || a == "--help")
}

fn parse_number(value: &str, what: &str) -> Result<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Usage(format!("{}이(가) 정수가 아님: '{}'", what, value)));
    }
    Ok(value.parse().unwrap_or(u64::MAX))
}
