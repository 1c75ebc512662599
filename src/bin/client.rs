//! P2MP-FTP 클라이언트 (송신자)
//!
//! 파일을 여러 서버에 Stop-and-Wait ARQ로 전송
//! - 모든 서버의 ACK를 받은 뒤 다음 세그먼트 전송
//! - 타임아웃 시 ACK하지 않은 서버에만 재전송
//!
//! 사용법:
//!   cargo run --release --bin p2mp-client -- <dest1> [dest2 ...] <port> <file> <mss>
//!
//! 예시:
//!   cargo run --release --bin p2mp-client -- 192.168.1.10 192.168.1.11 7735 data.bin 500

use std::net::IpAddr;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use p2mp::cli::{ClientArgs, Invocation, CLIENT_USAGE};
use p2mp::{probe, Outcome, Sender};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 설정
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let client_args = match ClientArgs::parse(&args) {
        Ok(Invocation::Run(parsed)) => parsed,
        Ok(Invocation::Help) => {
            println!("{}", CLIENT_USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, CLIENT_USAGE);
            std::process::exit(2);
        }
    };

    info!("P2MP-FTP Client starting...");
    info!("Servers: {:?}", client_args.hosts);
    info!("Port: {}", client_args.port);
    info!("File: {:?}", client_args.file);
    info!("MSS: {} bytes", client_args.mss);

    let config = client_args.into_config().await?;

    // 최대 RTT로 타임아웃 결정
    let ips: Vec<IpAddr> = config.destinations.iter().map(|d| d.ip()).collect();
    let rtt = probe::max_rtt(&ips, config.probe_limit).await;
    let config = config.with_measured_rtt(rtt);
    info!("Max RTT: {:?}, timeout: {:?}", rtt, config.timeout);

    let mut sender = Sender::new(config)?;
    let outcome = sender
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    match outcome {
        Outcome::Completed => info!("Transfer complete!"),
        Outcome::Cancelled => info!("Transfer aborted"),
    }
    info!("{}", sender.stats().summary());

    Ok(())
}
