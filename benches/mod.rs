use criterion::{criterion_group, criterion_main};

mod container;
mod dispatch;

criterion_group!(
    benches,
    container::bench_push_and_erase,
    container::bench_dynamic_growth,
    dispatch::bench_shared_attribute_dispatch,
    dispatch::bench_rpc_round_trip
);
criterion_main!(benches);
