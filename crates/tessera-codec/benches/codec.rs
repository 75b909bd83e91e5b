//! Codec throughput benchmarks.
//!
//! ```bash
//! cargo bench -p tessera-codec
//! ```

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tessera_codec::{decode, encode, Format, Schema, Value};

fn order_schema() -> Schema {
    Schema::parse_str(
        r#"{"type":"record","name":"Order","namespace":"bench","fields":[
            {"name":"id","type":"long"},
            {"name":"customer","type":"string"},
            {"name":"total","type":"double"},
            {"name":"coupon","type":["null","string"],"default":null},
            {"name":"lines","type":{"type":"array","items":{
                "type":"record","name":"Line","fields":[
                    {"name":"sku","type":"string"},
                    {"name":"qty","type":"int"}]}}},
            {"name":"attrs","type":{"type":"map","values":"string"}}
        ]}"#,
    )
    .expect("bench schema parses")
}

fn order(lines: usize) -> Value {
    let mut attrs = BTreeMap::new();
    attrs.insert("channel".to_string(), Value::from("web"));
    Value::record([
        ("id", Value::Long(918_273)),
        ("customer", Value::from("customer-0042")),
        ("total", Value::Double(129.95)),
        ("coupon", Value::Union(1, Box::new(Value::from("SPRING")))),
        (
            "lines",
            Value::Array(
                (0..lines)
                    .map(|i| {
                        Value::record([
                            ("sku", Value::String(format!("sku-{i:05}"))),
                            ("qty", Value::Int(i as i32 % 7 + 1)),
                        ])
                    })
                    .collect(),
            ),
        ),
        ("attrs", Value::Map(attrs)),
    ])
}

fn bench_encode(c: &mut Criterion) {
    let schema = order_schema();
    let mut group = c.benchmark_group("encode");
    for lines in [1usize, 16, 256] {
        let value = order(lines);
        group.throughput(Throughput::Elements(1));
        for format in [Format::Binary, Format::Text] {
            group.bench_with_input(
                BenchmarkId::new(format.to_string(), lines),
                &value,
                |b, value| b.iter(|| encode(black_box(value), &schema, format)),
            );
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let schema = order_schema();
    let mut group = c.benchmark_group("decode");
    for lines in [1usize, 16, 256] {
        let value = order(lines);
        for format in [Format::Binary, Format::Text] {
            let bytes = encode(&value, &schema, format).expect("bench value encodes");
            group.throughput(Throughput::Bytes(bytes.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format.to_string(), lines),
                &bytes,
                |b, bytes| b.iter(|| decode(black_box(bytes), &schema, format)),
            );
        }
    }
    group.finish();
}

fn bench_canonical_form(c: &mut Criterion) {
    let schema = order_schema();
    c.bench_function("canonical_form", |b| b.iter(|| black_box(&schema).canonical_form()));
}

criterion_group!(benches, bench_encode, bench_decode, bench_canonical_form);
criterion_main!(benches);
