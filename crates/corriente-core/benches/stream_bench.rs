//! Throughput benchmarks for the buffer layer and a small framing network.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use corriente_core::units::{DevNull, FrameCutter, VectorInput};
use corriente_core::{BufferUsage, Network, Parameters, Real, StreamBuffer, StreamingAlgorithm, connect, shared};

fn bench_buffer_throughput(c: &mut Criterion) {
    c.bench_function("buffer_push_consume_64k", |b| {
        b.iter(|| {
            let mut buf: StreamBuffer<Real> = StreamBuffer::new(BufferUsage::AudioStream);
            let reader = buf.add_reader();
            let mut produced = 0_usize;
            let total = 65536;
            while produced < total {
                while produced < total && buf.try_push(produced as Real, "out").unwrap() {
                    produced += 1;
                }
                let n = buf.available(reader);
                black_box(buf.read_slice(reader, n));
                buf.consume(reader, n);
            }
        });
    });
}

fn bench_framing_network(c: &mut Criterion) {
    c.bench_function("frame_cutter_network_16k", |b| {
        let signal: Vec<Real> = (0..16384).map(|i| (i as Real).sin()).collect();
        b.iter(|| {
            let input = shared(VectorInput::new(signal.clone()));
            let cutter = shared({
                let mut cutter = FrameCutter::new();
                cutter
                    .configure(&Parameters::new().with("frameSize", 1024).with("hopSize", 512))
                    .unwrap();
                cutter
            });
            let sink = shared(DevNull::<Vec<Real>>::new());
            connect(&input, "data", &cutter, "signal").unwrap();
            connect(&cutter, "frame", &sink, "data").unwrap();
            Network::new(input).unwrap().run().unwrap();
        });
    });
}

criterion_group!(benches, bench_buffer_throughput, bench_framing_network);
criterion_main!(benches);
