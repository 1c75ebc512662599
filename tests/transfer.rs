//! 송신자와 수신자를 루프백에서 함께 실행하는 통합 테스트
//!
//! 각 수신자는 별도 tokio 태스크로 실행하고, 송신자는 테스트 태스크에서 실행한다.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::task::JoinHandle;

use p2mp::{Error, Outcome, Receiver, ReceiverConfig, ReceiverStats, Sender, SenderConfig};

/// 수신자를 임의 포트에 바인딩하고 백그라운드 실행
async fn spawn_receiver(
    output: PathBuf,
    loss_probability: f64,
    seed: u64,
) -> (SocketAddr, JoinHandle<ReceiverStats>) {
    let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let config = ReceiverConfig::new(bind, output, loss_probability).with_seed(seed);
    let mut receiver = Receiver::bind(config).await.expect("bind failed");
    let addr = receiver.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        receiver.run().await.expect("receiver run");
        receiver.stats().clone()
    });

    (addr, handle)
}

/// 반복 패턴 테스트 데이터
fn test_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn write_input(dir: &Path, data: &[u8]) -> PathBuf {
    let path = dir.join("input.bin");
    std::fs::write(&path, data).unwrap();
    path
}

#[tokio::test]
async fn test_small_file_single_receiver() {
    let dir = tempfile::tempdir().unwrap();
    let data = b"0123456789".to_vec();
    let input = write_input(dir.path(), &data);
    let output = dir.path().join("received.bin");

    let (addr, receiver) = spawn_receiver(output.clone(), 0.0, 1).await;

    let config = SenderConfig::new(vec![addr], &input, 18).with_timeout(Duration::from_millis(500));
    let mut sender = Sender::new(config).unwrap();
    sender.run().await.unwrap();

    let receiver_stats = receiver.await.unwrap();

    assert_eq!(sender.stats().segments, 1);
    assert_eq!(sender.stats().rounds, 1);
    assert_eq!(sender.stats().retransmissions, 0);
    assert_eq!(receiver_stats.accepted, 1);
    assert_eq!(receiver_stats.bytes_written, 10);
    assert_eq!(std::fs::read(&output).unwrap(), data);
}

#[tokio::test]
async fn test_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &[]);
    let output = dir.path().join("received.bin");

    let (addr, receiver) = spawn_receiver(output.clone(), 0.0, 1).await;

    let config = SenderConfig::new(vec![addr], &input, 64).with_timeout(Duration::from_millis(500));
    let mut sender = Sender::new(config).unwrap();
    sender.run().await.unwrap();
    receiver.await.unwrap();

    assert_eq!(sender.stats().segments, 1);
    assert!(std::fs::read(&output).unwrap().is_empty());
}

#[tokio::test]
async fn test_multi_segment_multiple_receivers() {
    let dir = tempfile::tempdir().unwrap();
    let data = test_data(5000);
    let input = write_input(dir.path(), &data);

    let mut addrs = Vec::new();
    let mut handles = Vec::new();
    let mut outputs = Vec::new();
    for i in 0..3u64 {
        let output = dir.path().join(format!("received-{}.bin", i));
        let (addr, handle) = spawn_receiver(output.clone(), 0.0, i).await;
        addrs.push(addr);
        handles.push(handle);
        outputs.push(output);
    }

    let config = SenderConfig::new(addrs, &input, 500).with_timeout(Duration::from_millis(500));
    let mut sender = Sender::new(config).unwrap();
    sender.run().await.unwrap();

    // 492바이트 페이로드 10개 + 80바이트 1개
    assert_eq!(sender.stats().segments, 11);
    assert_eq!(sender.stats().payload_bytes, 5000);

    for (handle, output) in handles.into_iter().zip(outputs) {
        let stats = handle.await.unwrap();
        assert_eq!(stats.accepted, 11);
        assert_eq!(std::fs::read(&output).unwrap(), data);
    }
}

#[tokio::test]
async fn test_lossy_receivers_still_get_identical_copies() {
    let dir = tempfile::tempdir().unwrap();
    let data = test_data(2000);
    let input = write_input(dir.path(), &data);

    let mut addrs = Vec::new();
    let mut handles = Vec::new();
    let mut outputs = Vec::new();
    for i in 0..3u64 {
        let output = dir.path().join(format!("received-{}.bin", i));
        let (addr, handle) = spawn_receiver(output.clone(), 0.3, 0x5eed + i).await;
        addrs.push(addr);
        handles.push(handle);
        outputs.push(output);
    }

    let config = SenderConfig::new(addrs, &input, 200)
        .with_timeout(Duration::from_millis(100))
        .with_max_rounds(60);
    let mut sender = Sender::new(config).unwrap();

    tokio::time::timeout(Duration::from_secs(60), sender.run())
        .await
        .expect("transfer timed out")
        .unwrap();

    let stats = sender.stats();
    assert_eq!(stats.payload_bytes, 2000);
    assert!(stats.rounds >= stats.segments);

    let mut dropped = 0;
    for (handle, output) in handles.into_iter().zip(outputs) {
        let receiver_stats = handle.await.unwrap();
        dropped += receiver_stats.dropped_by_loss;
        assert_eq!(std::fs::read(&output).unwrap(), data);
    }

    // 수신측에서 버린 만큼 재전송이 필요
    assert!(stats.retransmissions >= dropped);
}

#[tokio::test]
async fn test_repeated_destination_completes() {
    let dir = tempfile::tempdir().unwrap();
    let data = b"0123456789".to_vec();
    let input = write_input(dir.path(), &data);
    let output = dir.path().join("received.bin");

    let (addr, receiver) = spawn_receiver(output.clone(), 0.0, 1).await;

    let config = SenderConfig::new(vec![addr, addr], &input, 64)
        .with_timeout(Duration::from_millis(200))
        .with_max_rounds(5);
    let mut sender = Sender::new(config).unwrap();
    sender.run().await.unwrap();

    let receiver_stats = receiver.await.unwrap();

    assert_eq!(sender.destinations().len(), 1);
    assert_eq!(sender.destinations()[0].last_confirmed_sequence, Some(0));
    assert_eq!(sender.stats().rounds, 1);
    assert_eq!(receiver_stats.accepted, 1);
    assert_eq!(receiver_stats.out_of_order, 0);
    assert_eq!(std::fs::read(&output).unwrap(), data);
}

#[tokio::test]
async fn test_unreachable_destination_hits_retransmit_limit() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), b"unreachable");

    // 바인딩 후 바로 닫아 응답 없는 포트 확보
    let addr = {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap()
    };

    let config = SenderConfig::new(vec![addr], &input, 64)
        .with_timeout(Duration::from_millis(50))
        .with_max_rounds(2);
    let mut sender = Sender::new(config).unwrap();

    match sender.run().await {
        Err(Error::RetransmitLimit { sequence, pending }) => {
            assert_eq!(sequence, 0);
            assert_eq!(pending, 1);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(sender.stats().rounds, 2);
    assert_eq!(sender.stats().segments, 0);
}

#[tokio::test]
async fn test_sender_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &test_data(100));

    let silent = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = silent.local_addr().unwrap();

    let config = SenderConfig::new(vec![addr], &input, 64).with_timeout(Duration::from_millis(50));
    let mut sender = Sender::new(config).unwrap();

    let outcome = sender
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(sender.stats().segments, 0);
    assert!(sender.stats().rounds >= 2);
}
