use criterion::{BatchSize, Criterion, Throughput};
use iotlink::container::{DynamicSequence, FixedCapacitySequence, Sequence};
use std::hint::black_box;

const RECORDS: usize = 32;

fn fill_and_drain<S: Sequence<u32>>(sequence: &mut S) {
    for value in 0..RECORDS as u32 {
        sequence.push(value);
    }
    while !sequence.is_empty() {
        black_box(sequence.erase(0));
    }
}

pub fn bench_push_and_erase(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_and_erase");
    group.throughput(Throughput::Elements(RECORDS as u64));

    group.bench_function("fixed", |b| {
        b.iter_batched_ref(
            FixedCapacitySequence::<u32, RECORDS>::new,
            |sequence| fill_and_drain(sequence),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("dynamic", |b| {
        b.iter_batched_ref(
            DynamicSequence::<u32>::new,
            |sequence| fill_and_drain(sequence),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_dynamic_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("dynamic_growth");
    for count in [8usize, 64, 512] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("push_{count}"), |b| {
            b.iter(|| {
                let mut sequence = DynamicSequence::<u32>::new();
                for value in 0..count as u32 {
                    sequence.push(value);
                }
                black_box(sequence.capacity())
            })
        });
    }
    group.finish();
}
