use std::hint::black_box;

use criterion::{
  BenchmarkId,
  Criterion,
  criterion_group,
  criterion_main,
};

use blockheap_alloc::{
  AllocFlags,
  CollapsePolicy,
  Heap,
  HeapConfig,
};
use blockheap_arena::{
  Arena,
  ArenaId,
  FitPolicy,
  Request,
};
use blockheap_sys::backing::Backing;

fn bench_reverse_free(c: &mut Criterion) {
  let mut group = c.benchmark_group("reverse_free");

  for count in [8usize, 32, 63] {
    group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
      let backing = Backing::new(64 * 1024).unwrap();
      let mut arena = Arena::new(ArenaId::DEFAULT, backing.region().unwrap(), 64).unwrap();
      let request = Request::new(AllocFlags::object());

      b.iter(|| {
        let ptrs: Vec<_> = (0..n)
          .map(|_| arena.reserve(64, request, FitPolicy::FirstFit).unwrap().ptr)
          .collect();
        for ptr in ptrs.into_iter().rev() {
          arena.release(black_box(ptr)).unwrap();
        }
      });
    });
  }

  group.finish();
}

fn bench_subarena_collapse(c: &mut Criterion) {
  let mut group = c.benchmark_group("subarena_collapse");

  for collapse in [CollapsePolicy::Explicit, CollapsePolicy::Auto] {
    let name = format!("{collapse:?}");
    group.bench_with_input(BenchmarkId::from_parameter(name), &collapse, |b, &collapse| {
      let backing = Backing::new(64 * 1024).unwrap();
      let config = HeapConfig::default().with_collapse(collapse);
      let mut heap = Heap::new(backing.region().unwrap(), config).unwrap();

      b.iter(|| {
        let sub = heap.create_subarena(4096, AllocFlags::DEFAULT).unwrap();
        let ptr = heap.alloc_in(sub, 256, AllocFlags::object()).unwrap();
        heap.free(ptr).unwrap();
        if heap.arena(sub).is_some() {
          heap.destroy_arena(sub).unwrap();
        }
      });
    });
  }

  group.finish();
}

criterion_group!(benches, bench_reverse_free, bench_subarena_collapse);
criterion_main!(benches);
