//! Registry benchmark suite.
//!
//! Measures listing reconciliation and focused operations against the
//! in-memory endpoint at different surface counts:
//! - Surface counts: 1, 16, 128
//!
//! Run with: cargo bench --bench registry
//! Results saved to: target/criterion/

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use surface_keeper::{
    Capabilities, DriverKind, DriverSession, MemoryConnector, MemoryDriver, Registry,
    SurfaceProperties,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const SURFACE_COUNTS: &[usize] = &[1, 16, 128];

// ============================================================================
// Setup
// ============================================================================

async fn setup(surfaces: usize) -> Registry {
    let driver = MemoryDriver::new();
    for i in 0..surfaces {
        driver.open_surface(&format!("s-{i}"), &format!("Surface {i}"), "https://bench/");
    }
    let session = DriverSession::open(
        &MemoryConnector::new(driver),
        DriverKind::Chrome,
        Capabilities::new(),
        None,
    )
    .await
    .expect("open session");
    Registry::new(session).expect("create registry")
}

// ============================================================================
// Benchmark: Refresh
// ============================================================================

fn bench_refresh(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("refresh");
    for &count in SURFACE_COUNTS {
        let registry = rt.block_on(setup(count));
        group.bench_with_input(BenchmarkId::new("surfaces", count), &registry, |b, registry| {
            b.to_async(&rt).iter(|| async { registry.refresh().await.expect("refresh") });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Matching
// ============================================================================

fn bench_match_last(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("match_last");
    group.measurement_time(Duration::from_secs(10));
    for &count in SURFACE_COUNTS {
        let registry = rt.block_on(setup(count));
        let wanted = format!("Surface {}", count - 1);
        group.bench_with_input(BenchmarkId::new("surfaces", count), &registry, |b, registry| {
            b.to_async(&rt).iter(|| async {
                let matcher = |_: usize, p: &SurfaceProperties| p.title == wanted;
                registry
                    .get_handle_matching(&matcher, Duration::from_secs(1))
                    .await
                    .expect("match")
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Focused Operation
// ============================================================================

fn bench_focused_title(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let registry = rt.block_on(setup(2));
    let first = rt.block_on(registry.get_handle(0)).expect("handle");
    let second = rt.block_on(registry.get_handle(1)).expect("handle");

    c.bench_function("focused_title_alternating", |b| {
        b.to_async(&rt).iter(|| async {
            first.title().await.expect("title");
            second.title().await.expect("title");
        });
    });
}

criterion_group!(benches, bench_refresh, bench_match_last, bench_focused_title);
criterion_main!(benches);
