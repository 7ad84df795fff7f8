//! Cooperative pause control. The operator toggles a shared flag ("p" then
//! Enter); the run loop polls it only at safe boundaries, between
//! applications and wizard steps, so a pause never interrupts a field
//! mid-resolution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Default)]
pub struct PauseControl {
    paused: Arc<AtomicBool>,
}

impl PauseControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Flips the flag and returns the new state.
    pub fn toggle(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    /// Safe-boundary checkpoint: returns immediately when running, blocks
    /// until unpaused otherwise.
    pub async fn checkpoint(&self) {
        if !self.is_paused() {
            return;
        }
        info!("paused, press 'p' then Enter to resume");
        while self.is_paused() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        info!("resumed");
    }

    /// Spawns the stdin listener. Any line that is just "p" toggles the
    /// flag; everything else is ignored. Must be started after the login
    /// flow, which owns stdin for captcha prompts.
    pub fn spawn_stdin_listener(&self) -> JoinHandle<()> {
        let control = self.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().eq_ignore_ascii_case("p") {
                    let paused = control.toggle();
                    info!(paused, "pause toggled");
                }
            }
        })
    }
}
