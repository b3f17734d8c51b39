//! Throughput Benchmark for ttlkv
//!
//! This benchmark measures the performance of the in-memory storage
//! engine under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use ttlkv::storage::{sweep_once, Key, MemoryStorage, Storage, StorageError, Value};

fn set(storage: &MemoryStorage, key: Key, value: Value) {
    storage
        .put(key, |_| Ok::<_, StorageError>(Some(value)))
        .unwrap();
}

/// Benchmark blind writes
fn bench_put(c: &mut Criterion) {
    let storage = Arc::new(MemoryStorage::new());

    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            set(&storage, Key::from(format!("key:{}", i)), Value::string("small_value"));
            i += 1;
        });
    });

    group.bench_function("put_large", |b| {
        let mut i = 0u64;
        let payload = bytes::Bytes::from("x".repeat(64 * 1024)); // 64KB value
        b.iter(|| {
            set(&storage, Key::from(format!("key:{}", i)), Value::string(payload.clone()));
            i += 1;
        });
    });

    group.bench_function("put_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            set(
                &storage,
                Key::from(format!("ttl:{}", i)),
                Value::string("value").with_ttl(Duration::from_secs(3600)),
            );
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark reads
fn bench_get(c: &mut Criterion) {
    let storage = Arc::new(MemoryStorage::new());

    for i in 0..100_000 {
        set(
            &storage,
            Key::from(format!("key:{}", i)),
            Value::string(format!("value:{}", i)),
        );
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Key::from(format!("key:{}", i % 100_000));
            let _ = black_box(storage.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Key::from(format!("missing:{}", i));
            let _ = black_box(storage.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark read-modify-write counters
fn bench_incr(c: &mut Criterion) {
    let storage = Arc::new(MemoryStorage::new());

    let incr = |storage: &MemoryStorage, key: Key| {
        storage
            .put(key, |current| {
                let n: i64 = current
                    .and_then(Value::as_string)
                    .and_then(|s| std::str::from_utf8(s).ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
                Ok::<_, StorageError>(Some(Value::string((n + 1).to_string())))
            })
            .unwrap();
    };

    let mut group = c.benchmark_group("incr");
    group.throughput(Throughput::Elements(1));

    // Single counter (high contention)
    group.bench_function("single_counter", |b| {
        b.iter(|| incr(&storage, Key::from("counter")));
    });

    // Multiple counters (low contention)
    group.bench_function("multiple_counters", |b| {
        let mut i = 0u64;
        b.iter(|| {
            incr(&storage, Key::from(format!("counter:{}", i % 1000)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let storage = Arc::new(MemoryStorage::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let storage = Arc::clone(&storage);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = Key::from(format!("key:{}:{}", t, i));
                            set(&storage, key.clone(), Value::string("value"));
                            let _ = storage.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(storage.len());
        });
    });

    group.finish();
}

/// Benchmark enumeration and sweeping
fn bench_enumerate(c: &mut Criterion) {
    let storage = Arc::new(MemoryStorage::new());

    // 10% of the keyspace carries a TTL
    for i in 0..10_000 {
        let value = if i % 10 == 0 {
            Value::string("data").with_ttl(Duration::from_secs(3600))
        } else {
            Value::string("data")
        };
        set(&storage, Key::from(format!("user:{}", i)), value);
    }

    let mut group = c.benchmark_group("enumerate");

    group.bench_function("keys", |b| {
        b.iter(|| black_box(storage.keys().unwrap()));
    });

    group.bench_function("all_with_ttl", |b| {
        b.iter(|| black_box(storage.all_with_ttl().unwrap()));
    });

    group.bench_function("sweep_nothing_expired", |b| {
        b.iter(|| black_box(sweep_once(storage.as_ref()).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_put,
    bench_get,
    bench_incr,
    bench_concurrent,
    bench_enumerate,
);

criterion_main!(benches);
