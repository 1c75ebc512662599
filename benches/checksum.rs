//! 체크섬 및 세그먼트 직렬화 벤치마크

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use p2mp::checksum;
use p2mp::{PacketType, Segment, HEADER_SIZE};

fn random_payload(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(7735);
    (0..len).map(|_| rng.gen::<u8>()).collect()
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    for mss in [64usize, 500, 2048] {
        let payload = random_payload(mss - HEADER_SIZE);
        group.throughput(Throughput::Bytes(payload.len() as u64));

        group.bench_with_input(BenchmarkId::new("compute", mss), &payload, |b, payload| {
            b.iter(|| checksum::compute(black_box(0x1234_5678), PacketType::Data.as_u16(), payload))
        });

        let sum = checksum::compute(0x1234_5678, PacketType::Data.as_u16(), &payload);
        group.bench_with_input(BenchmarkId::new("verify", mss), &payload, |b, payload| {
            b.iter(|| {
                checksum::verify(
                    black_box(0x1234_5678),
                    black_box(sum),
                    PacketType::Data.as_u16(),
                    payload,
                )
            })
        });
    }

    group.finish();
}

fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");
    let payload = Bytes::from(random_payload(500 - HEADER_SIZE));
    let wire = Segment::new(0, PacketType::Data, payload.clone()).to_bytes();
    group.throughput(Throughput::Bytes(wire.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| Segment::new(black_box(500), PacketType::Data, payload.clone()).to_bytes())
    });

    group.bench_function("decode_and_verify", |b| {
        b.iter(|| {
            let segment = Segment::from_bytes(black_box(&wire)).unwrap();
            segment.verify_checksum()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_checksum, bench_segment);
criterion_main!(benches);
