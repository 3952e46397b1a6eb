//! Benchmarks for eiscp framing and translation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eiscp::commands::CommandTranslator;
use eiscp::protocol::{encode, MessageBuffer};

fn codec_benchmarks(c: &mut Criterion) {
    c.bench_function("encode", |b| b.iter(|| encode(black_box("MVL2A"))));

    let mut stream = Vec::new();
    for i in 0..100u8 {
        stream.extend_from_slice(&encode(&format!("MVL{:02X}", i)));
    }

    c.bench_function("buffer_drain_100", |b| {
        b.iter(|| {
            let mut buffer = MessageBuffer::default();
            buffer.receive(black_box(&stream));
            let mut count = 0;
            while let Ok(Some(_)) = buffer.next_message() {
                count += 1;
            }
            count
        })
    });
}

fn translation_benchmarks(c: &mut Criterion) {
    let translator = CommandTranslator::default();

    c.bench_function("to_protocol", |b| {
        b.iter(|| translator.to_protocol_str(black_box("zone2.volume=42")))
    });

    c.bench_function("from_protocol", |b| {
        b.iter(|| translator.from_protocol(black_box("SWL+03")))
    });
}

criterion_group!(benches, codec_benchmarks, translation_benchmarks);
criterion_main!(benches);
