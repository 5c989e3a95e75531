use std::future::Future;
use std::time::Duration;

use log::debug;

/// Runs `probe` up to `attempts` times, sleeping `delay` between attempts,
/// and returns the first value it produces.
///
/// There is no sleep after the last attempt.
pub async fn retry<T, F, Fut>(attempts: u32, delay: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=attempts {
        if let Some(value) = probe().await {
            return Some(value);
        }
        debug!("Attempt {attempt}/{attempts} came back empty");
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }
    None
}
