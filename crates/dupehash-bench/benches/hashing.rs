use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dupehash_core::buffer_pool::BufferPool;
use dupehash_core::hasher::hash_stream;
use dupehash_core::progress::NullProgressSink;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

fn bench_whole_file_hash(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hash_stream_whole_file");

    for size in [64, 1024, 16 * 1024, 256 * 1024, 1024 * 1024] {
        let data = vec![0xABu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.to_async(&rt).iter(|| async {
                let mut cursor = std::io::Cursor::new(data.clone());
                let pool = BufferPool::default();
                let progress = NullProgressSink;
                let cancel = CancellationToken::new();
                black_box(
                    hash_stream(&mut cursor, data.len() as u64, 0, &pool, &progress, &cancel)
                        .await
                        .unwrap(),
                );
            });
        });
    }

    group.finish();
}

fn bench_sampled_file_hash(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hash_stream_sampled");

    for size in [256 * 1024, 1024 * 1024, 16 * 1024 * 1024] {
        let mut file = NamedTempFile::new().unwrap();
        let data = vec![0xCDu8; size];
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async {
                let mut handle = tokio::fs::File::open(file.path()).await.unwrap();
                let pool = BufferPool::default();
                let progress = NullProgressSink;
                let cancel = CancellationToken::new();
                black_box(
                    hash_stream(&mut handle, size as u64, 8192, &pool, &progress, &cancel)
                        .await
                        .unwrap(),
                );
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_whole_file_hash, bench_sampled_file_hash);
criterion_main!(benches);
