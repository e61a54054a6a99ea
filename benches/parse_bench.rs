use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use proxy_preamble::core::detect::V2_SIGNATURE;
use proxy_preamble::core::parse;
use proxy_preamble::protocol::stage::PreambleStage;

const V1_LINE: &[u8] = b"PROXY TCP4 192.0.2.1 198.51.100.1 56324 80\r\n";

fn v2_header(tlv_len: usize) -> Vec<u8> {
    let mut buf = V2_SIGNATURE.to_vec();
    buf.push(0x21);
    buf.push(0x11);
    buf.extend_from_slice(&((12 + tlv_len) as u16).to_be_bytes());
    buf.extend_from_slice(&[192, 0, 2, 1, 198, 51, 100, 1, 0xdc, 0x04, 0x00, 0x50]);
    buf.extend_from_slice(&vec![0u8; tlv_len]);
    buf
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.throughput(Throughput::Bytes(V1_LINE.len() as u64));
    group.bench_function("v1_line", |b| b.iter(|| parse(V1_LINE)));

    for tlv_len in [0usize, 64, 256] {
        let header = v2_header(tlv_len);
        group.throughput(Throughput::Bytes(header.len() as u64));
        group.bench_function(format!("v2_tlv_{tlv_len}b"), |b| b.iter(|| parse(&header)));
    }

    let plain = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    group.throughput(Throughput::Bytes(plain.len() as u64));
    group.bench_function("non_preamble", |b| b.iter(|| parse(plain)));

    group.finish();
}

fn bench_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage");

    // Full connection front: preamble plus a payload burst, fed in chunks.
    let mut input = V1_LINE.to_vec();
    input.extend_from_slice(&[0x41; 4096]);
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("v1_then_payload_chunked", |b| {
        b.iter_batched(
            || {
                (
                    PreambleStage::new(),
                    input
                        .chunks(512)
                        .map(Bytes::copy_from_slice)
                        .collect::<Vec<_>>(),
                )
            },
            |(mut stage, chunks)| {
                for chunk in chunks {
                    let _ = stage.advance(chunk);
                }
            },
            BatchSize::SmallInput,
        )
    });

    // Settled fast path: one chunk through an inert stage.
    let burst = Bytes::from_static(&[0x42; 4096]);
    group.throughput(Throughput::Bytes(burst.len() as u64));
    group.bench_function("settled_pass_through", |b| {
        let mut stage = PreambleStage::new();
        let _ = stage.advance(Bytes::from_static(V1_LINE));
        b.iter(|| stage.advance(burst.clone()))
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_stage);
criterion_main!(benches);
