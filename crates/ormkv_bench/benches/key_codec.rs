//! Composite key codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ormkv_encoding::KeyCodec;
use ormkv_schema::{FieldKind, FieldValue, Timestamp};
use ormkv_testkit::{descriptor_for_kinds, field_names};

fn codec(kinds: &[FieldKind]) -> KeyCodec {
    KeyCodec::new(vec![0x0F, 0x01, 0x00], &descriptor_for_kinds(kinds), &field_names(kinds.len()))
        .unwrap()
}

/// One representative value per kind.
fn sample(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Bool => FieldValue::Bool(true),
        FieldKind::Int32 => FieldValue::Int32(-12345),
        FieldKind::Int64 => FieldValue::Int64(-1_234_567_890_123),
        FieldKind::Uint32 => FieldValue::Uint32(12345),
        FieldKind::Uint64 => FieldValue::Uint64(1_234_567_890_123),
        FieldKind::Enum => FieldValue::Enum(3),
        FieldKind::String => FieldValue::from("us-east-1"),
        FieldKind::Bytes => FieldValue::Bytes(vec![0x00, 0x01, 0xFF, 0x00, 0x7F, 0x00]),
        FieldKind::Timestamp => FieldValue::Timestamp(Timestamp::new(1_700_000_000, 500)),
    }
}

/// Benchmark single-field encode and decode for every kind.
fn bench_field_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("field");

    for kind in ormkv_testkit::KEY_KINDS {
        let codec = codec(&[kind]);
        let values = vec![sample(kind)];
        let bytes = codec.encode(&values).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", kind), &values, |b, values| {
            b.iter(|| black_box(codec.encode(black_box(values)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decode", kind), &bytes, |b, bytes| {
            b.iter(|| black_box(codec.decode(black_box(bytes)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark composite keys of growing width.
fn bench_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite");
    let pattern = [FieldKind::String, FieldKind::Uint64, FieldKind::Int32, FieldKind::Bytes];

    for width in [1usize, 2, 4, 8] {
        let kinds: Vec<FieldKind> = pattern.iter().copied().cycle().take(width).collect();
        let codec = codec(&kinds);
        let values: Vec<FieldValue> = kinds.iter().map(|&k| sample(k)).collect();
        let bytes = codec.encode(&values).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", width), &values, |b, values| {
            b.iter(|| black_box(codec.encode(black_box(values)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decode", width), &bytes, |b, bytes| {
            b.iter(|| black_box(codec.decode(black_box(bytes)).unwrap()));
        });

        let half = codec.encode_prefix(&values[..width / 2]).unwrap();
        group.bench_with_input(BenchmarkId::new("decode_prefix", width), &half, |b, half| {
            b.iter(|| black_box(codec.decode(black_box(half)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark long strings with embedded zero bytes.
fn bench_escaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("escaping");
    let codec = codec(&[FieldKind::Bytes]);

    for zeros_every in [0usize, 16, 2] {
        let raw: Vec<u8> = (0..1024)
            .map(|i| if zeros_every > 0 && i % zeros_every == 0 { 0 } else { 0x41 })
            .collect();
        let values = vec![FieldValue::Bytes(raw)];
        let bytes = codec.encode(&values).unwrap();
        group.throughput(Throughput::Bytes(1024));

        group.bench_with_input(BenchmarkId::new("encode", zeros_every), &values, |b, values| {
            b.iter(|| black_box(codec.encode(black_box(values)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decode", zeros_every), &bytes, |b, bytes| {
            b.iter(|| black_box(codec.decode(black_box(bytes)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_field_kinds, bench_composite, bench_escaping);
criterion_main!(benches);
