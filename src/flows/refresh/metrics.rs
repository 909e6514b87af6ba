// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing refresh activity for one manager.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	skipped: AtomicU64,
	joined: AtomicU64,
	started: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Total calls into the refresh coordinator.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Calls that returned early because the token was still valid.
	pub fn skipped(&self) -> u64 {
		self.skipped.load(Ordering::Relaxed)
	}

	/// Calls that awaited a refresh another caller had already started.
	pub fn joined(&self) -> u64 {
		self.joined.load(Ordering::Relaxed)
	}

	/// Refresh requests actually sent to the token endpoint.
	pub fn started(&self) -> u64 {
		self.started.load(Ordering::Relaxed)
	}

	/// Network refreshes whose result was applied.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Refreshes that failed before or after reaching the network.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_skip(&self) {
		self.skipped.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joined.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_start(&self) {
		self.started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
