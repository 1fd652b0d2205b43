use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use service_gateway::RateLimiter;

fn limiter(rate: u32) -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(NonZeroU32::new(rate).unwrap()))
}

/// Most grants falling inside any window `[t, t + window)`.
fn max_in_window(grants: &[Duration], window: Duration) -> usize {
    let mut sorted = grants.to_vec();
    sorted.sort();
    let mut best = 0;
    let mut lo = 0;
    for hi in 0..sorted.len() {
        while sorted[hi] - sorted[lo] >= window {
            lo += 1;
        }
        best = best.max(hi - lo + 1);
    }
    best
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_grants_respect_burst_bound() {
    const CAPACITY: u32 = 10;
    let rl = limiter(CAPACITY);
    let start = Instant::now();
    let grants = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let rl = rl.clone();
        let grants = grants.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                rl.acquire().await;
                grants.lock().unwrap().push(start.elapsed());
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let grants = grants.lock().unwrap().clone();
    assert_eq!(grants.len(), 80);

    // A full bucket lets the first CAPACITY through at once.
    assert_eq!(grants.iter().filter(|t| t.is_zero()).count(), CAPACITY as usize);

    // Any one-second window holds at most the bucket plus what refills in it.
    assert!(max_in_window(&grants, Duration::from_secs(1)) <= 2 * CAPACITY as usize);

    // Once the burst is spent, grants are paced at the refill rate.
    let after_burst: Vec<Duration> = grants
        .iter()
        .copied()
        .filter(|t| *t >= Duration::from_secs(1))
        .collect();
    assert!(max_in_window(&after_burst, Duration::from_secs(1)) <= CAPACITY as usize);

    // 70 tokens beyond the initial burst at 10/s.
    let total = grants.iter().max().copied().unwrap();
    assert_eq!(total, Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_every_waiter_makes_progress() {
    let rl = limiter(2);
    let progress: Arc<Vec<AtomicUsize>> = Arc::new((0..16).map(|_| AtomicUsize::new(0)).collect());

    let mut handles = Vec::new();
    for id in 0..16 {
        let rl = rl.clone();
        let progress = progress.clone();
        handles.push(tokio::spawn(async move {
            loop {
                rl.acquire().await;
                progress[id].fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    tokio::time::sleep(Duration::from_secs(30)).await;
    for handle in &handles {
        handle.abort();
    }

    for (id, count) in progress.iter().enumerate() {
        assert!(count.load(Ordering::SeqCst) >= 2, "caller {id} starved");
    }
}

#[tokio::test(start_paused = true)]
async fn test_waiters_are_served_in_arrival_order() {
    let rl = limiter(1);
    rl.acquire().await;

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();
    for id in 0..5 {
        let rl = rl.clone();
        let order = order.clone();
        handles.push(tokio::spawn(async move {
            rl.acquire().await;
            order.lock().unwrap().push(id);
        }));
        // Let this caller queue before the next one arrives.
        tokio::task::yield_now().await;
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_acquire_sleeps_until_token_is_due() {
    let rl = limiter(4);
    for _ in 0..4 {
        rl.acquire().await;
    }

    let waiter = {
        let rl = rl.clone();
        tokio::spawn(async move { rl.acquire().await })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!waiter.is_finished());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(waiter.is_finished());
}
