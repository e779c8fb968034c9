use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use keyrelay::{
    channels::{bounded, OverflowPolicy},
    Config, RingChannel, Session,
};
use std::thread;

fn benchmark_single_threaded_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("Channel_SingleThreaded");

    for capacity in [64, 1024, 4096].iter() {
        group.throughput(Throughput::Elements(*capacity as u64));
        group.bench_with_input(
            BenchmarkId::new("fill_drain_u64", capacity),
            capacity,
            |b, &capacity| {
                let (producer, consumer) = bounded::<u64>(capacity, OverflowPolicy::Block);
                b.iter(|| {
                    for i in 0..capacity {
                        producer.push(i as u64);
                    }
                    for _ in 0..capacity {
                        consumer.try_recv().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn benchmark_ring_overflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("Channel_RingOverflow");
    let count = 10_000u64;
    group.throughput(Throughput::Elements(count));
    group.bench_function("push_evicting", |b| {
        let (producer, consumer) = bounded::<u64>(16, OverflowPolicy::DropOldest);
        b.iter(|| {
            for i in 0..count {
                producer.push(i);
            }
            consumer.try_iter().count()
        });
    });
    group.finish();
}

fn benchmark_fifo_two_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("Channel_TwoThreads");
    let count = 10_000u64;
    group.throughput(Throughput::Elements(count));
    group.bench_function("fifo_handoff", |b| {
        b.iter(|| {
            let (producer, consumer) = bounded::<u64>(256, OverflowPolicy::Block);
            let reader = thread::spawn(move || consumer.iter().count());
            for i in 0..count {
                producer.push(i);
            }
            drop(producer);
            reader.join().unwrap()
        });
    });
    group.finish();
}

fn benchmark_session_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("Session_Put");
    let session = Session::open_local(Config::default().with_timestamping(false)).unwrap();

    for subscribers in [1usize, 8, 32].iter() {
        let subs: Vec<_> = (0..*subscribers)
            .map(|i| {
                session
                    .declare_subscriber(format!("bench/{}/**", i % 4), RingChannel::new(64))
                    .unwrap()
            })
            .collect();
        group.bench_with_input(
            BenchmarkId::new("put_fanout", subscribers),
            subscribers,
            |b, _| {
                b.iter(|| session.put("bench/1/value", "payload").unwrap());
            },
        );
        drop(subs);
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_threaded_throughput,
    benchmark_ring_overflow,
    benchmark_fifo_two_threads,
    benchmark_session_put
);
criterion_main!(benches);
