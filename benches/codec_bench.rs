//! Criterion benchmarks for encode/decode throughput on a representative
//! telemetry frame.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use voltage_codec::{
    bit_struct, decode, encode, encode_into, fixed_array, float32, record, ref_to, uint16, uint8,
    DynCoder, Endian, Value,
};

fn frame() -> DynCoder {
    let flags = bit_struct([("version", 3u32), ("ack", 1), ("kind", 4)]).unwrap();
    let count = uint8();
    let readings = fixed_array(float32(Endian::Big), ref_to(&count));

    record([
        ("flags", flags),
        ("device", uint16(Endian::Big)),
        ("count", count),
        ("readings", readings),
    ])
}

fn frame_value(rng: &mut StdRng, count: usize) -> Value {
    Value::record([
        (
            "flags",
            Value::record([
                ("version", Value::UInt(rng.gen_range(0..8))),
                ("ack", Value::UInt(rng.gen_range(0..2))),
                ("kind", Value::UInt(rng.gen_range(0..16))),
            ]),
        ),
        ("device", Value::UInt(rng.gen_range(0..0x10000))),
        ("count", Value::UInt(count as u64)),
        (
            "readings",
            Value::List(
                (0..count)
                    .map(|_| Value::Float(rng.gen_range(-100.0f32..100.0) as f64))
                    .collect(),
            ),
        ),
    ])
}

fn bench_encode(c: &mut Criterion) {
    let coder = frame();
    let mut rng = StdRng::seed_from_u64(42);
    let value = frame_value(&mut rng, 64);
    let mut buf = vec![0u8; 1024];

    c.bench_function("encode_telemetry_64", |b| {
        b.iter(|| encode_into(&coder, black_box(&value), &mut buf).unwrap())
    });

    c.bench_function("encode_telemetry_64_growable", |b| {
        b.iter(|| encode(&coder, black_box(&value)).unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let coder = frame();
    let mut rng = StdRng::seed_from_u64(42);
    let value = frame_value(&mut rng, 64);
    let wire = encode(&coder, &value).unwrap();

    c.bench_function("decode_telemetry_64", |b| {
        b.iter(|| decode(&coder, black_box(&wire)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
