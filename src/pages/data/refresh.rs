//! Ordering guard for overlapping graph refreshes.

/// Identifies one refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// Hands out increasing tickets; only the newest one may publish results.
#[derive(Clone, Debug, Default)]
pub struct RefreshGuard {
	generation: u64,
}

impl RefreshGuard {
	pub fn begin(&mut self) -> Ticket {
		self.generation += 1;
		Ticket(self.generation)
	}

	pub fn is_current(&self, ticket: Ticket) -> bool {
		ticket.0 == self.generation
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn newest_refresh_wins() {
		let mut guard = RefreshGuard::default();
		let first = guard.begin();
		assert!(guard.is_current(first));

		let second = guard.begin();
		assert!(!guard.is_current(first));
		assert!(guard.is_current(second));
	}
}
