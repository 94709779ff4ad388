use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};

use super::frame::{CameraRole, FramePair, RawFrame};

/// Maximum capture time difference of a pair, 10 ms.
pub const DEFAULT_TOLERANCE_NS: u64 = 10_000_000;

/// Frames kept per camera while waiting for a partner.
pub const DEFAULT_MAX_BUFFERED_FRAMES: usize = 5;

/// Pairs queued per subscriber before new pairs are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Parameters of the frame pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Maximum capture time difference in nanoseconds.
    pub tolerance_ns: u64,
    /// Frames kept per camera; the oldest are evicted first.
    pub max_buffered_frames: usize,
    /// Capacity of each subscriber channel.
    pub channel_capacity: usize,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            tolerance_ns: DEFAULT_TOLERANCE_NS,
            max_buffered_frames: DEFAULT_MAX_BUFFERED_FRAMES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Default)]
struct PairingState {
    primary: BTreeMap<i64, RawFrame>,
    secondary: BTreeMap<i64, RawFrame>,
    subscribers: Vec<mpsc::Sender<FramePair>>,
}

/// Matches frames of the two physical cameras by capture timestamp.
///
/// Frames arrive independently from both cameras, possibly on different
/// threads. Each camera has a small timestamp-ordered buffer; a new frame is
/// paired with the closest frame of the other camera if they are at most
/// [`PairingConfig::tolerance_ns`] apart. Unmatched frames age out of the
/// buffers silently.
///
/// # Example
///
/// ```
/// use woundlens_io::stereo::{CameraRole, RawFrame, StereoFramePairer};
///
/// let pairer = StereoFramePairer::default();
/// let mut pairs = pairer.subscribe();
///
/// pairer.submit(RawFrame::new(CameraRole::Primary, 0, [2, 2].into(), vec![0; 6]));
/// pairer.submit(RawFrame::new(CameraRole::Secondary, 5_000_000, [2, 2].into(), vec![0; 6]));
///
/// let pair = pairs.try_recv().unwrap();
/// assert_eq!(pair.timestamp_ns, 5_000_000);
/// ```
#[derive(Default)]
pub struct StereoFramePairer {
    config: PairingConfig,
    state: Mutex<PairingState>,
}

impl StereoFramePairer {
    /// Create a pairer with the given configuration.
    pub fn new(config: PairingConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PairingState::default()),
        }
    }

    /// The pairing configuration.
    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    /// Register a new receiver of frame pairs.
    ///
    /// Pairs emitted while the receiver's queue is full are dropped for that
    /// receiver. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> mpsc::Receiver<FramePair> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        self.lock().subscribers.push(tx);
        rx
    }

    /// Buffer a frame and emit a pair if it has a partner.
    pub fn submit(&self, frame: RawFrame) {
        let max_buffered = self.config.max_buffered_frames;
        let (role, timestamp_ns) = (frame.role, frame.timestamp_ns);

        let mut state = self.lock();
        let PairingState {
            primary,
            secondary,
            subscribers,
        } = &mut *state;
        let (own, opposite) = match role {
            CameraRole::Primary => (primary, secondary),
            CameraRole::Secondary => (secondary, primary),
        };

        if own.insert(timestamp_ns, frame).is_some() {
            log::debug!("replaced buffered {role} frame at {timestamp_ns} ns");
        }
        // a late frame may be evicted right away but can still pair
        let mut evicted_self = evict_to(own, max_buffered, role)
            .into_iter()
            .find(|f| f.timestamp_ns == timestamp_ns);

        if let Some((candidate_ns, delta_ns)) = closest(opposite, timestamp_ns) {
            if delta_ns <= self.config.tolerance_ns {
                let mine = own.remove(&timestamp_ns).or_else(|| evicted_self.take());
                let theirs = opposite.remove(&candidate_ns);
                if let Some(pair) = mine.zip(theirs).and_then(|(a, b)| FramePair::new(a, b)) {
                    log::debug!(
                        "paired frames at {} ns (skew {delta_ns} ns)",
                        pair.timestamp_ns
                    );
                    emit(subscribers, pair);
                }
            } else {
                log::debug!(
                    "no {} frame within tolerance of {role} frame at {timestamp_ns} ns (closest {delta_ns} ns)",
                    role.opposite()
                );
            }
        }

        evict_to(opposite, max_buffered, role.opposite());
    }

    /// Discard all buffered frames.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.primary.clear();
        state.secondary.clear();
    }

    /// Number of frames buffered for a camera.
    pub fn buffered(&self, role: CameraRole) -> usize {
        let state = self.lock();
        match role {
            CameraRole::Primary => state.primary.len(),
            CameraRole::Secondary => state.secondary.len(),
        }
    }

    // the buffers stay consistent even if a holder panicked
    fn lock(&self) -> std::sync::MutexGuard<'_, PairingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Closest buffered timestamp and its distance; ties keep the earliest.
fn closest(buffer: &BTreeMap<i64, RawFrame>, timestamp_ns: i64) -> Option<(i64, u64)> {
    buffer.keys().fold(None, |best, &candidate| {
        let delta = candidate.abs_diff(timestamp_ns);
        match best {
            Some((_, best_delta)) if best_delta <= delta => best,
            _ => Some((candidate, delta)),
        }
    })
}

fn evict_to(buffer: &mut BTreeMap<i64, RawFrame>, max: usize, role: CameraRole) -> Vec<RawFrame> {
    let mut evicted = Vec::new();
    while buffer.len() > max {
        let Some((timestamp_ns, frame)) = buffer.pop_first() else {
            break;
        };
        log::debug!("evicted unpaired {role} frame at {timestamp_ns} ns");
        evicted.push(frame);
    }
    evicted
}

fn emit(subscribers: &mut Vec<mpsc::Sender<FramePair>>, pair: FramePair) {
    if subscribers.is_empty() {
        log::debug!("no subscribers for pair at {} ns", pair.timestamp_ns);
        return;
    }

    let mut pair = Some(pair);
    let mut i = 0;
    while i < subscribers.len() {
        // the last subscriber takes the pair itself, the others a copy
        let item = if i + 1 == subscribers.len() {
            pair.take()
        } else {
            pair.clone()
        };
        let Some(item) = item else {
            break;
        };

        match subscribers[i].try_send(item) {
            Ok(()) => i += 1,
            Err(TrySendError::Full(dropped)) => {
                log::warn!("subscriber queue full, dropping pair at {} ns", dropped.timestamp_ns);
                i += 1;
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("removing closed subscriber");
                subscribers.remove(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: i64 = 1_000_000;

    fn frame(role: CameraRole, timestamp_ns: i64) -> RawFrame {
        RawFrame::new(role, timestamp_ns, [2, 2].into(), vec![0; 6])
    }

    #[test]
    fn pairs_within_tolerance() {
        let pairer = StereoFramePairer::default();
        let mut rx = pairer.subscribe();

        pairer.submit(frame(CameraRole::Primary, 0));
        pairer.submit(frame(CameraRole::Secondary, 5 * MS));

        let pair = rx.try_recv().expect("one pair");
        assert_eq!(pair.timestamp_ns, 5 * MS);
        assert_eq!(pair.primary.timestamp_ns, 0);
        assert_eq!(pair.secondary.timestamp_ns, 5 * MS);
        assert!(rx.try_recv().is_err());

        assert_eq!(pairer.buffered(CameraRole::Primary), 0);
        assert_eq!(pairer.buffered(CameraRole::Secondary), 0);
    }

    #[test]
    fn tolerance_is_inclusive() {
        let pairer = StereoFramePairer::default();
        let mut rx = pairer.subscribe();

        pairer.submit(frame(CameraRole::Secondary, 100 * MS));
        pairer.submit(frame(CameraRole::Primary, 110 * MS));
        assert_eq!(rx.try_recv().map(|p| p.timestamp_ns).ok(), Some(110 * MS));

        pairer.submit(frame(CameraRole::Secondary, 200 * MS));
        pairer.submit(frame(CameraRole::Primary, 210 * MS + 1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn distant_frames_age_out() {
        let pairer = StereoFramePairer::default();
        let mut rx = pairer.subscribe();

        pairer.submit(frame(CameraRole::Primary, 0));
        pairer.submit(frame(CameraRole::Secondary, 50 * MS));
        assert!(rx.try_recv().is_err());
        assert_eq!(pairer.buffered(CameraRole::Primary), 1);

        // five newer primary frames push the first one out
        for k in 1..=5 {
            pairer.submit(frame(CameraRole::Primary, (200 + k) * MS));
        }
        assert_eq!(pairer.buffered(CameraRole::Primary), 5);
        assert!(rx.try_recv().is_err());

        pairer.submit(frame(CameraRole::Secondary, MS));
        assert!(rx.try_recv().is_err());

        // and five newer secondary frames push out the one at 50 ms
        for k in 1..=5 {
            pairer.submit(frame(CameraRole::Secondary, (400 + k) * MS));
        }
        assert_eq!(pairer.buffered(CameraRole::Secondary), 5);
        pairer.submit(frame(CameraRole::Primary, 52 * MS));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ties_prefer_the_earlier_frame() {
        let pairer = StereoFramePairer::default();
        let mut rx = pairer.subscribe();

        pairer.submit(frame(CameraRole::Secondary, 0));
        pairer.submit(frame(CameraRole::Secondary, 10 * MS));
        pairer.submit(frame(CameraRole::Primary, 5 * MS));

        let pair = rx.try_recv().expect("one pair");
        assert_eq!(pair.secondary.timestamp_ns, 0);
        assert_eq!(pair.timestamp_ns, 5 * MS);
        assert_eq!(pairer.buffered(CameraRole::Secondary), 1);
    }

    #[test]
    fn closest_frame_wins() {
        let pairer = StereoFramePairer::default();
        let mut rx = pairer.subscribe();

        pairer.submit(frame(CameraRole::Primary, 30 * MS));
        pairer.submit(frame(CameraRole::Primary, 41 * MS));
        pairer.submit(frame(CameraRole::Secondary, 38 * MS));

        let pair = rx.try_recv().expect("one pair");
        assert_eq!(pair.primary.timestamp_ns, 41 * MS);
        assert_eq!(pair.timestamp_ns, 41 * MS);
        assert_eq!(pairer.buffered(CameraRole::Primary), 1);
    }

    #[test]
    fn late_frame_still_pairs() {
        let pairer = StereoFramePairer::default();
        let mut rx = pairer.subscribe();

        pairer.submit(frame(CameraRole::Primary, 0));
        for k in 0..5 {
            pairer.submit(frame(CameraRole::Secondary, (100 + 10 * k) * MS));
        }
        assert!(rx.try_recv().is_err());

        // older than every buffered secondary frame, so evicted on arrival
        pairer.submit(frame(CameraRole::Secondary, MS));

        let pair = rx.try_recv().expect("one pair");
        assert_eq!(pair.timestamp_ns, MS);
        assert_eq!(pairer.buffered(CameraRole::Primary), 0);
        assert_eq!(pairer.buffered(CameraRole::Secondary), 5);
    }

    #[test]
    fn full_queue_drops_pairs() {
        let pairer = StereoFramePairer::new(PairingConfig {
            channel_capacity: 1,
            ..Default::default()
        });
        let mut rx = pairer.subscribe();

        for k in 0..3 {
            pairer.submit(frame(CameraRole::Primary, k * 100 * MS));
            pairer.submit(frame(CameraRole::Secondary, k * 100 * MS + MS));
        }

        assert_eq!(rx.try_recv().map(|p| p.timestamp_ns).ok(), Some(MS));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn every_subscriber_gets_the_pair() {
        let pairer = StereoFramePairer::default();
        let mut a = pairer.subscribe();
        let b = pairer.subscribe();
        let mut c = pairer.subscribe();
        drop(b);

        pairer.submit(frame(CameraRole::Primary, 0));
        pairer.submit(frame(CameraRole::Secondary, 0));

        let first = a.try_recv().ok();
        assert!(first.is_some());
        assert_eq!(first, c.try_recv().ok());
        assert_eq!(pairer.lock().subscribers.len(), 2);
    }

    #[test]
    fn clear_discards_frames() {
        let pairer = StereoFramePairer::default();
        pairer.submit(frame(CameraRole::Primary, 0));
        pairer.submit(frame(CameraRole::Secondary, 90 * MS));
        pairer.clear();
        assert_eq!(pairer.buffered(CameraRole::Primary), 0);
        assert_eq!(pairer.buffered(CameraRole::Secondary), 0);
    }

    #[test]
    fn config_from_json() -> Result<(), serde_json::Error> {
        let config: PairingConfig = serde_json::from_str(r#"{"tolerance_ns": 2000000}"#)?;
        assert_eq!(config.tolerance_ns, 2_000_000);
        assert_eq!(config.max_buffered_frames, 5);
        assert_eq!(config.channel_capacity, 8);
        Ok(())
    }
}
