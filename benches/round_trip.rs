use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kittypress::{compress_file, decompress_file};
use std::hint::black_box;
use std::time::Duration;
use tempfile::tempdir;

fn generate_test_data(size: usize, pattern: &str) -> Vec<u8> {
    match pattern {
        "text" => {
            let base = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ";
            let mut data = Vec::with_capacity(size);
            while data.len() < size {
                data.extend_from_slice(base);
            }
            data.truncate(size);
            data
        }
        "binary" => (0..size).map(|i| ((i * 17 + 11) % 256) as u8).collect(),
        "repetitive" => {
            let pattern = b"ABCDEFGHIJ";
            let mut data = Vec::with_capacity(size);
            while data.len() < size {
                data.extend_from_slice(pattern);
            }
            data.truncate(size);
            data
        }
        _ => panic!("Unknown pattern: {pattern}"),
    }
}

fn round_trip_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip_throughput");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for size in [1024usize, 102_400, 1_048_576].iter() {
        let size_label = match *size {
            1024 => "1KB",
            102_400 => "100KB",
            1_048_576 => "1MB",
            _ => "unknown",
        };

        for pattern in ["text", "binary", "repetitive"].iter() {
            let data = generate_test_data(*size, pattern);
            let benchmark_id =
                BenchmarkId::from_parameter(format!("{size_label}/{pattern}"));

            group.throughput(Throughput::Bytes(*size as u64));
            group.bench_with_input(benchmark_id, &data, |b, data| {
                let dir = tempdir().expect("temp dir");
                let input = dir.path().join("input");
                let packed = dir.path().join("packed.kitty");
                let restored = dir.path().join("restored");
                std::fs::write(&input, data).expect("write input");

                b.iter(|| {
                    compress_file(black_box(&input), black_box(&packed))
                        .expect("compression failed");
                    decompress_file(black_box(&packed), black_box(&restored))
                        .expect("decompression failed");
                    std::fs::metadata(&restored).expect("restored file").len()
                });
            });
        }
    }

    group.finish();
}

fn dictionary_stage_throughput(c: &mut Criterion) {
    use kittypress::lz77;

    let mut group = c.benchmark_group("dictionary_stage");
    group.measurement_time(Duration::from_secs(5));

    let size = 262_144;
    for pattern in ["text", "binary", "repetitive"].iter() {
        let data = generate_test_data(size, pattern);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pattern), &data, |b, data| {
            b.iter(|| {
                let tokens = lz77::compress(black_box(data));
                let decompressed = lz77::decompress(&tokens).expect("decompression failed");
                assert_eq!(decompressed.len(), data.len());
                decompressed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, round_trip_throughput, dictionary_stage_throughput);
criterion_main!(benches);
