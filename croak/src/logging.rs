use croak_msg::Message;

pub(crate) fn msg_summary(msg: &Message) -> String {
  format!("{:?}: {:?} {} with {} byte payload (id {}, token {:02x?})",
          msg.code.kind(),
          msg.ty,
          msg.code,
          msg.payload.0.len(),
          msg.id.0,
          msg.token.as_bytes())
}
