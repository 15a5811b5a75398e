pub mod builders;

pub use builders::*;

use std::time::Duration;

/// Let the monitor's engine task drain its mailbox. Under a paused clock the
/// sleep returns immediately after auto-advancing, which also runs any ready
/// timer tasks.
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
