//! Randomized delays between browser actions. Timing only; never consulted
//! by the resolution pipeline, so outcomes are identical with jitter
//! disabled under paused test time.

use std::time::Duration;

use rand::Rng;

/// Pause between applications and page navigations (3–5s).
pub async fn random_delay() {
    let ms = rand::thread_rng().gen_range(3_000..=5_000);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Pause between in-page actions (0.1–1s).
pub async fn small_random_delay() {
    let ms = rand::thread_rng().gen_range(100..=1_000);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
