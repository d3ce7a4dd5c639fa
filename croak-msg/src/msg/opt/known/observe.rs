/// The value of an Observe option sent in a request (RFC 7641 §2).
///
/// In a response the option instead carries a sequence number,
/// see [`Message::observe`](crate::Message::observe).
#[derive(Hash, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Action {
  /// Start receiving notifications whenever the resource changes
  Register,
  /// Stop receiving notifications
  Deregister,
}

impl Action {
  /// Read the action from an option value; anything but 0 or 1 is `None`
  pub fn from_byte(n: u8) -> Option<Self> {
    match n {
      | 0 => Some(Action::Register),
      | 1 => Some(Action::Deregister),
      | _ => None,
    }
  }
}

impl From<Action> for u8 {
  fn from(a: Action) -> Self {
    match a {
      | Action::Register => 0,
      | Action::Deregister => 1,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_byte() {
    assert_eq!(Action::from_byte(u8::from(Action::Register)),
               Some(Action::Register));
    assert_eq!(Action::from_byte(1), Some(Action::Deregister));
    assert_eq!(Action::from_byte(2), None);
  }
}
