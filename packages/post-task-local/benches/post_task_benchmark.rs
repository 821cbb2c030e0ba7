use criterion::{Criterion, black_box, criterion_group, criterion_main};
use post_task::{Priority, post_task};
use post_task_local::{LocalHost, Profile};

fn benchmark_microtasks(c: &mut Criterion) {
    c.bench_function("post_task user-blocking via microtask 1000", |b| {
        b.iter(|| {
            let host = LocalHost::new(Profile::microtasks());
            for _ in 0..1000 {
                let _ = post_task(
                    &host,
                    || {
                        black_box(1 + 1);
                    },
                    Priority::UserBlocking,
                );
            }
            host.run_microtasks();
        })
    });
}

fn benchmark_timers(c: &mut Criterion) {
    c.bench_function("post_task mixed priorities via timer 1000", |b| {
        b.iter(|| {
            let host = LocalHost::new(Profile::timers());
            for i in 0..1000 {
                let _ = post_task(
                    &host,
                    || {
                        black_box(1 + 1);
                    },
                    Priority::ALL[i % 3],
                );
            }
            host.run_until_stalled();
        })
    });
}

fn benchmark_native(c: &mut Criterion) {
    c.bench_function("post_task mixed priorities via native 1000", |b| {
        b.iter(|| {
            let host = LocalHost::new(Profile::native());
            for i in 0..1000 {
                let _ = post_task(
                    &host,
                    || {
                        black_box(1 + 1);
                    },
                    Priority::ALL[i % 3],
                );
            }
            host.run_native();
        })
    });
}

criterion_group!(benches, benchmark_microtasks, benchmark_timers, benchmark_native);
criterion_main!(benches);
