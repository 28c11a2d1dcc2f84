use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use extractum::{Charset, Extractor, OutputFormat};
use std::hint::black_box;

/// Plain text of roughly `size` bytes.
fn create_test_document(size: usize) -> Vec<u8> {
    let sentence = "Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. ";
    sentence.repeat(size / sentence.len() + 1).into_bytes()
}

/// Benchmark: draining a stream with fixed-size reads
fn bench_stream_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_read");
    let extractor = Extractor::new();

    for size in [10_000usize, 100_000, 1_000_000] {
        let document = create_test_document(size);
        group.throughput(Throughput::Bytes(document.len() as u64));

        for buffer_size in [512usize, 4096, 65_536] {
            group.bench_with_input(
                BenchmarkId::new(format!("buf_{}", buffer_size), size),
                &document,
                |b, document| {
                    let mut buf = vec![0u8; buffer_size];
                    b.iter(|| {
                        let (mut stream, _) = extractor.extract_bytes(document).unwrap();
                        let mut total = 0;
                        loop {
                            let n = stream.read(&mut buf).unwrap();
                            if n == 0 {
                                break;
                            }
                            total += n;
                        }
                        black_box(total)
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark: to-string versus read_all, across output settings
fn bench_output_settings(c: &mut Criterion) {
    let mut group = c.benchmark_group("output_settings");
    let document = create_test_document(250_000);
    group.throughput(Throughput::Bytes(document.len() as u64));

    let settings = [
        ("plain_utf8", OutputFormat::PlainText, Charset::Utf8),
        ("plain_utf16be", OutputFormat::PlainText, Charset::Utf16Be),
        ("markup_utf8", OutputFormat::Markup, Charset::Utf8),
    ];

    for (name, format, charset) in settings {
        let extractor = Extractor::new().set_output_format(format).set_encoding(charset);

        group.bench_function(BenchmarkId::new("to_string", name), |b| {
            b.iter(|| black_box(extractor.extract_bytes_to_string(&document).unwrap()));
        });
        group.bench_function(BenchmarkId::new("read_all", name), |b| {
            b.iter(|| {
                let (mut stream, _) = extractor.extract_bytes(&document).unwrap();
                black_box(stream.read_all().unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stream_read, bench_output_settings);
criterion_main!(benches);
