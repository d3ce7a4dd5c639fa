use core::ops::RangeInclusive;

use embedded_time::duration::Milliseconds;
use embedded_time::Instant;
use rand::Rng;

use crate::time::{Clock, Millis};

/// A non-blocking timer driving the retransmission of a confirmable message.
///
/// It does not _contain_ the work to be done (e.g. `Box<fn()>`), it only
/// tells you when the work should be done again.
///
/// The first retransmission happens `init` after `start`. Every retransmission
/// doubles the timeout, never past `ceiling`. Once `max_retransmits` retransmissions
/// have happened and the timeout elapses again, the timer gives up.
///
/// ```
/// use embedded_time::clock::Clock;
/// use embedded_time::duration::Milliseconds;
/// use croak::retry::{Attempts, RetryTimer, YouShould};
///
/// let clock = croak::std::Clock::new();
/// let now = || clock.try_now().unwrap();
///
/// let mut timer = RetryTimer::new(now(), Milliseconds(1), Milliseconds(4), Attempts(1));
///
/// assert_eq!(nb::block!(timer.what_should_i_do(now())), Ok(YouShould::Retry));
/// assert_eq!(nb::block!(timer.what_should_i_do(now())), Ok(YouShould::Cry));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryTimer<C: Clock> {
  next_at: Instant<C>,
  timeout: Millis,
  ceiling: Millis,
  retransmits: Attempts,
  max_retransmits: Attempts,
}

/// A number of attempts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attempts(pub u16);

/// Result of [`RetryTimer.what_should_i_do`].
///
/// This tells you if a retry should be attempted or not.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum YouShould {
  /// Attempts have been exhausted and the work that is
  /// being retried should be considered poisoned.
  Cry,
  /// A retry should be performed
  Retry,
}

impl<C: Clock> RetryTimer<C> {
  /// Create a new retrier
  pub fn new(start: Instant<C>, init: Millis, ceiling: Millis, max_retransmits: Attempts) -> Self {
    Self { next_at: start.checked_add(init).unwrap_or(start),
           timeout: init,
           ceiling,
           retransmits: Attempts(0),
           max_retransmits }
  }

  /// When the thing we keep trying has not succeeded yet, invoke this to
  /// ask the timer "it still hasn't worked! what do I do??"
  ///
  /// Returns `nb::Error::WouldBlock` when we have not yet
  /// waited the appropriate amount of time to retry.
  pub fn what_should_i_do(&mut self,
                          now: Instant<C>)
                          -> nb::Result<YouShould, core::convert::Infallible> {
    if now < self.next_at {
      return Err(nb::Error::WouldBlock);
    }

    if self.retransmits >= self.max_retransmits {
      Ok(YouShould::Cry)
    } else {
      let Milliseconds(timeout) = self.timeout;
      let Milliseconds(ceiling) = self.ceiling;

      self.retransmits.0 += 1;
      self.timeout = Milliseconds(timeout.saturating_mul(2).min(ceiling));
      self.next_at = now.checked_add(self.timeout).unwrap_or(now);

      Ok(YouShould::Retry)
    }
  }

  /// How many times [`YouShould::Retry`] has been returned
  pub fn retransmits(&self) -> Attempts {
    self.retransmits
  }

  /// The delay that will be waited before the next retry
  pub fn timeout(&self) -> Millis {
    self.timeout
  }
}

/// Exponential backoff: pick a random initial delay between
/// `init_min` and `init_max`, doubling it after each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Strategy {
  /// Minimum (inclusive) delay for second attempt
  pub init_min: Millis,
  /// Maximum (inclusive) delay for second attempt
  pub init_max: Millis,
}

impl Strategy {
  /// Are the min & max different?
  pub fn has_jitter(&self) -> bool {
    self.init_min != self.init_max
  }

  /// Get the range of initial delays, in milliseconds
  pub fn range(&self) -> RangeInclusive<u64> {
    let Milliseconds(min) = self.init_min;
    let Milliseconds(max) = self.init_max;
    min.min(max)..=max.max(min)
  }

  /// Pick an initial delay
  pub fn pick(&self, rand: &mut impl Rng) -> Millis {
    if self.has_jitter() {
      Milliseconds(rand.gen_range(self.range()))
    } else {
      Milliseconds(*self.range().start())
    }
  }
}

#[cfg(test)]
mod test {
  use rand::SeedableRng;

  use super::*;
  use crate::test::ClockMock;

  fn now(clock: &ClockMock) -> Instant<ClockMock> {
    use embedded_time::Clock;
    clock.try_now().unwrap()
  }

  #[test]
  pub fn retry_doubles_timeout() {
    let clock = ClockMock::new();
    let mut retry = RetryTimer::new(now(&clock), Milliseconds(100), Milliseconds(10_000), Attempts(5));

    // attempt 1 happens before asking what_should_i_do

    clock.set(99);
    assert_eq!(retry.what_should_i_do(now(&clock)), Err(nb::Error::WouldBlock));

    clock.set(100);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Retry));
    assert_eq!(retry.timeout(), Milliseconds(200u64));

    clock.set(299);
    assert_eq!(retry.what_should_i_do(now(&clock)), Err(nb::Error::WouldBlock));

    clock.set(300);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Retry));

    clock.set(700);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Retry));
    assert_eq!(retry.retransmits(), Attempts(3));
  }

  #[test]
  pub fn retry_timeout_is_capped() {
    let clock = ClockMock::new();
    let mut retry = RetryTimer::new(now(&clock), Milliseconds(2000), Milliseconds(4000), Attempts(10));

    clock.set(2000);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Retry));
    assert_eq!(retry.timeout(), Milliseconds(4000u64));

    clock.set(6000);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Retry));
    assert_eq!(retry.timeout(), Milliseconds(4000u64));

    clock.set(9999);
    assert_eq!(retry.what_should_i_do(now(&clock)), Err(nb::Error::WouldBlock));
  }

  #[test]
  pub fn retry_cries_when_exhausted() {
    let clock = ClockMock::new();
    let mut retry = RetryTimer::new(now(&clock), Milliseconds(2000), Milliseconds(4000), Attempts(2));

    clock.set(2000);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Retry));
    clock.set(6000);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Retry));
    clock.set(9999);
    assert_eq!(retry.what_should_i_do(now(&clock)), Err(nb::Error::WouldBlock));
    clock.set(10_000);
    assert_eq!(retry.what_should_i_do(now(&clock)), Ok(YouShould::Cry));
  }

  #[test]
  pub fn strategy_pick_in_range() {
    let mut rand = rand_chacha::ChaCha8Rng::seed_from_u64(0);
    let strat = Strategy { init_min: Milliseconds(2000),
                           init_max: Milliseconds(3000) };

    assert!(strat.has_jitter());
    (0..100).for_each(|_| {
              let Milliseconds(ms) = strat.pick(&mut rand);
              assert!((2000..=3000).contains(&ms));
            });

    let fixed = Strategy { init_min: Milliseconds(2000),
                           init_max: Milliseconds(2000) };
    assert!(!fixed.has_jitter());
    assert_eq!(fixed.pick(&mut rand), Milliseconds(2000u64));
  }
}
