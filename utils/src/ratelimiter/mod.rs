//! In-process, fixed-window rate limiting keyed by an arbitrary string
//! (usually a client IP).
//!
//! Every key gets a window that opens on its first consumption and lasts
//! `duration`. Consuming more than `points` within the window rejects the
//! request, and if `block_duration` is set the key is then held in a blocked
//! state for that long, measured from the rejection that exhausted it.
//!
//! State lives in a single map behind a mutex, so concurrent consumptions of
//! the same key never lose updates. Nothing is shared between processes.
//!
//! Expired entries are swept lazily under the same lock, at most once per
//! window and only once the map is large.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Entries are only swept once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterOptions {
	/// The number of points a key may consume per window
	pub points: u32,
	/// How long a window lasts, zero means the window never resets
	pub duration: Duration,
	/// How long a key stays blocked once it exceeds its points, zero
	/// disables blocking and the key simply waits for the window to end
	pub block_duration: Duration,
}

impl Default for RateLimiterOptions {
	fn default() -> Self {
		Self {
			points: 4,
			duration: Duration::from_secs(300),
			block_duration: Duration::from_secs(300),
		}
	}
}

/// The outcome of a consumption, accepted or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResponse {
	/// Points left in the current window
	pub remaining: u32,
	/// Points consumed in the current window, including this consumption
	pub consumed: u32,
	/// Time until the window or block ends, `None` if it never does
	pub reset: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded, {consumed} points consumed out of {points}")]
pub struct RateLimitExceeded {
	pub points: u32,
	pub consumed: u32,
	/// Time until the key may consume again, `None` if it never may
	pub retry_after: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
struct KeyState {
	consumed: u32,
	expires_at: Option<Instant>,
	blocked: bool,
}

impl KeyState {
	fn expired(&self, now: Instant) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}
}

#[derive(Debug)]
struct Keys {
	states: fnv::FnvHashMap<String, KeyState>,
	last_sweep: Instant,
}

impl Keys {
	fn sweep(&mut self, now: Instant, interval: Option<Duration>) {
		let Some(interval) = interval else {
			return;
		};

		if self.states.len() <= PRUNE_THRESHOLD || now.duration_since(self.last_sweep) < interval {
			return;
		}

		let before = self.states.len();
		self.states.retain(|_, state| !state.expired(now));
		self.last_sweep = now;

		tracing::trace!(before, after = self.states.len(), "swept rate limiter keys");
	}
}

#[derive(Debug)]
pub struct RateLimiter {
	options: RateLimiterOptions,
	keys: Mutex<Keys>,
}

impl RateLimiter {
	pub fn new(options: RateLimiterOptions) -> Self {
		Self {
			options,
			keys: Mutex::new(Keys {
				states: fnv::FnvHashMap::default(),
				last_sweep: Instant::now(),
			}),
		}
	}

	/// How often expired keys may be swept. Without a window only blocks
	/// expire, and with neither nothing ever does.
	fn sweep_interval(&self) -> Option<Duration> {
		[self.options.duration, self.options.block_duration]
			.into_iter()
			.find(|interval| !interval.is_zero())
	}

	/// Consumes a single point for `key`.
	pub fn consume(&self, key: &str) -> Result<RateLimitResponse, RateLimitExceeded> {
		self.consume_points(key, 1)
	}

	pub fn consume_points(&self, key: &str, cost: u32) -> Result<RateLimitResponse, RateLimitExceeded> {
		let now = Instant::now();
		let mut keys = self.keys.lock().expect("rate limiter lock poisoned");
		keys.sweep(now, self.sweep_interval());

		let state = keys
			.states
			.entry(key.to_owned())
			.and_modify(|state| {
				if state.expired(now) {
					*state = self.fresh_window(now);
				}
			})
			.or_insert_with(|| self.fresh_window(now));

		if state.blocked {
			return Err(RateLimitExceeded {
				points: self.options.points,
				consumed: state.consumed,
				retry_after: state.expires_at.map(|at| at - now),
			});
		}

		state.consumed = state.consumed.saturating_add(cost);

		if state.consumed > self.options.points {
			if !self.options.block_duration.is_zero() {
				state.blocked = true;
				state.expires_at = Some(now + self.options.block_duration);
			}

			tracing::trace!(key, consumed = state.consumed, "rate limit exceeded");

			return Err(RateLimitExceeded {
				points: self.options.points,
				consumed: state.consumed,
				retry_after: state.expires_at.map(|at| at - now),
			});
		}

		Ok(RateLimitResponse {
			remaining: self.options.points - state.consumed,
			consumed: state.consumed,
			reset: state.expires_at.map(|at| at - now),
		})
	}

	#[cfg(test)]
	fn tracked_keys(&self) -> usize {
		self.keys.lock().expect("rate limiter lock poisoned").states.len()
	}

	#[cfg(test)]
	fn last_sweep(&self) -> Instant {
		self.keys.lock().expect("rate limiter lock poisoned").last_sweep
	}

	fn fresh_window(&self, now: Instant) -> KeyState {
		KeyState {
			consumed: 0,
			expires_at: (!self.options.duration.is_zero()).then(|| now + self.options.duration),
			blocked: false,
		}
	}
}
