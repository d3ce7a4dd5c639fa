use embedded_time::duration::Milliseconds;

use crate::retry::{Attempts, Strategy};
use crate::time::Millis;

/// Runtime config
///
/// Defaults follow the transmission parameters of RFC7252 section 4.8
/// and can be changed at any time with [`crate::core::Core::config_mut`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
  /// Initial amount of time to wait for an ACK before
  /// retransmitting a CON message.
  ///
  /// ```
  /// use croak::config::Config;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// assert_eq!(Config::default().ack_timeout, Milliseconds(2_000u64));
  /// ```
  pub ack_timeout: Millis,
  /// The initial timeout is picked randomly between `ack_timeout`
  /// and `ack_timeout * ack_random_factor`.
  ///
  /// Must be at least 1.0.
  ///
  /// ```
  /// use croak::config::Config;
  ///
  /// assert_eq!(Config::default().ack_random_factor, 1.5);
  /// ```
  pub ack_random_factor: f32,
  /// Number of times we are allowed to resend a CON message
  /// before giving up on it.
  ///
  /// ```
  /// use croak::config::Config;
  /// use croak::retry::Attempts;
  ///
  /// assert_eq!(Config::default().max_retransmit, Attempts(4));
  /// ```
  pub max_retransmit: Attempts,
  /// Preferred size of blocks in block-wise transfers.
  ///
  /// When `None`, requests are sent whole and the server picks
  /// the block size of responses.
  ///
  /// ```
  /// use croak::config::Config;
  ///
  /// assert_eq!(Config::default().block_size, None);
  /// ```
  pub block_size: Option<u16>,
  /// Mixed into the bytes that tokens are derived from, so that
  /// clients with different seeds produce different tokens.
  pub token_seed: u16,
}

impl Default for Config {
  fn default() -> Self {
    Config { ack_timeout: Milliseconds(2_000),
             ack_random_factor: 1.5,
             max_retransmit: Attempts(4),
             block_size: None,
             token_seed: 0 }
  }
}

impl Config {
  /// Set the ACK timeout
  pub fn set_ack_timeout(&mut self, timeout: Millis) -> &mut Self {
    self.ack_timeout = timeout;
    self
  }

  /// Set the ACK random factor.
  ///
  /// Values below 1.0 are accepted but make the initial
  /// timeout shorter than `ack_timeout`.
  pub fn set_ack_random_factor(&mut self, factor: f32) -> &mut Self {
    if factor < 1.0 {
      log::warn!("ack_random_factor {} is less than 1.0", factor);
    }

    self.ack_random_factor = factor;
    self
  }

  /// Set the maximum number of retransmissions
  pub fn set_max_retransmit(&mut self, max: Attempts) -> &mut Self {
    self.max_retransmit = max;
    self
  }

  /// Set the preferred block size.
  ///
  /// Block sizes must be a power of two between 16 and 1024;
  /// anything else is logged and resets the preference to `None`.
  ///
  /// ```
  /// use croak::config::Config;
  ///
  /// let mut config = Config::default();
  ///
  /// config.set_block_size(Some(64));
  /// assert_eq!(config.block_size, Some(64));
  ///
  /// config.set_block_size(Some(100));
  /// assert_eq!(config.block_size, None);
  /// ```
  pub fn set_block_size(&mut self, size: Option<u16>) -> &mut Self {
    self.block_size = match size {
      | Some(size) if !Self::valid_block_size(size) => {
        log::warn!("block size {} is not a power of two between 16 and 1024; ignoring",
                   size);
        None
      },
      | other => other,
    };
    self
  }

  pub(crate) fn valid_block_size(size: u16) -> bool {
    size.is_power_of_two() && (16..=1024).contains(&size)
  }

  fn factor(&self) -> f64 {
    self.ack_random_factor as f64
  }

  fn scale(&self, multiplier: f64) -> Millis {
    let Milliseconds(ack) = self.ack_timeout;
    Milliseconds((ack as f64 * multiplier * self.factor()) as u64)
  }

  /// The range that initial timeouts of CON messages are picked from
  ///
  /// ```
  /// use croak::config::Config;
  /// use croak::retry::Strategy;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// assert_eq!(Config::default().retry_strategy(),
  ///            Strategy { init_min: Milliseconds(2_000),
  ///                       init_max: Milliseconds(3_000) });
  /// ```
  pub fn retry_strategy(&self) -> Strategy {
    Strategy { init_min: self.ack_timeout,
               init_max: self.scale(1.0) }
  }

  /// Longest time between the first transmission of a CON message
  /// and its last retransmission. This also caps the timeout between
  /// two retransmissions.
  ///
  /// `ack_timeout * (2 ^ (max_retransmit - 1)) * ack_random_factor`
  ///
  /// ```
  /// use croak::config::Config;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// assert_eq!(Config::default().max_transmit_span(), Milliseconds(24_000u64));
  /// ```
  pub fn max_transmit_span(&self) -> Millis {
    self.scale(2f64.powi(self.max_retransmit.0 as i32 - 1))
  }

  /// Longest time between the first transmission of a CON message
  /// and giving up on receiving an acknowledgement or reply.
  ///
  /// `ack_timeout * (2 ^ (max_retransmit + 1)) * ack_random_factor`
  ///
  /// ```
  /// use croak::config::Config;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// assert_eq!(Config::default().max_transmit_wait(), Milliseconds(96_000u64));
  /// ```
  pub fn max_transmit_wait(&self) -> Millis {
    self.scale(2f64.powi(self.max_retransmit.0 as i32 + 1))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn setters_chain() {
    let mut config = Config::default();
    config.set_ack_timeout(Milliseconds(500))
          .set_ack_random_factor(1.0)
          .set_max_retransmit(Attempts(2))
          .set_block_size(Some(1024));

    assert_eq!(config.ack_timeout, Milliseconds(500u64));
    assert_eq!(config.ack_random_factor, 1.0);
    assert_eq!(config.max_retransmit, Attempts(2));
    assert_eq!(config.block_size, Some(1024));
  }

  #[test]
  fn bad_block_sizes_reset_to_none() {
    let mut config = Config::default();

    [8u16, 2048, 17, 0].into_iter().for_each(|size| {
                                    config.set_block_size(Some(64));
                                    config.set_block_size(Some(size));
                                    assert_eq!(config.block_size, None, "{}", size);
                                  });
  }

  #[test]
  fn derived_timings() {
    let mut config = Config::default();
    config.set_ack_timeout(Milliseconds(2000))
          .set_ack_random_factor(1.0)
          .set_max_retransmit(Attempts(2));

    assert_eq!(config.retry_strategy().range(), 2000..=2000);
    assert_eq!(config.max_transmit_span(), Milliseconds(4000u64));
    assert_eq!(config.max_transmit_wait(), Milliseconds(16_000u64));
  }
}
