//! P2MP-FTP 서버 (수신자)
//!
//! 지정 포트에서 데이터 세그먼트를 받아 파일에 기록
//! - 체크섬 정상 + 순서 일치: ACK 후 기록
//! - 순서 불일치: 마지막 정상 수신 시퀀스로 ACK
//! - 체크섬 오류: 폐기
//!
//! 사용법:
//!   cargo run --release --bin p2mp-server -- <port> <file> <loss_probability>
//!
//! 예시:
//!   cargo run --release --bin p2mp-server -- 7735 received.bin 0.05

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use p2mp::cli::{Invocation, ServerArgs, SERVER_USAGE};
use p2mp::{Outcome, Receiver};

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
    let server_args = match ServerArgs::parse(&args) {
        Ok(Invocation::Run(parsed)) => parsed,
        Ok(Invocation::Help) => {
            println!("{}", SERVER_USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, SERVER_USAGE);
            std::process::exit(2);
        }
    };

    info!("P2MP-FTP Server starting...");
    info!("Port: {}", server_args.port);
    info!("Output file: {:?}", server_args.file);
    info!("Loss probability: {}", server_args.loss_probability);

    let mut receiver = match Receiver::bind(server_args.into_config()).await {
        Ok(receiver) => receiver,
        Err(e) => {
            error!("Exception while binding server socket: {}", e);
            return Err(e.into());
        }
    };

    let outcome = receiver
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    match outcome {
        Outcome::Completed => info!("Complete!"),
        Outcome::Cancelled => info!("Not completed. Goodbye!"),
    }
    info!("{}", receiver.stats().summary());

    Ok(())
}
