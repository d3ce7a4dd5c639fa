//! Block-wise transfer decisions (RFC7959).
//!
//! Given the latest reply to a request, [`next_action`] decides whether the
//! next Block1 slice of the request body should be sent, the next Block2
//! block of the response should be requested, or the response is whole and
//! can be delivered. [`merge`] reassembles Block2 fragments.

use crate::exchange::Reply;

/// What to do after receiving a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
  /// Send Block1 number `num` of the request body
  SendBlock1 {
    /// block number
    num: u32,
    /// block size
    size: u16,
  },
  /// Ask for Block2 number `num` of the response body
  RequestBlock2 {
    /// block number
    num: u32,
    /// block size
    size: u16,
  },
  /// The response is complete
  Deliver,
}

/// Decide what to do after receiving `reply` to a request with a
/// body of `body_len` bytes.
///
/// Uploading the rest of the request takes priority over downloading
/// the rest of the response. The block size the server used in its reply
/// is honored for the next block.
///
/// ```
/// use croak::block::{next_action, NextAction};
/// use croak::exchange::Reply;
/// use croak_msg::{no_repeat, Block, Code, Id, Message, Token, Type};
///
/// let mut msg = Message::new(Type::Ack, Code::new(2, 5), Id(1), Token::default());
/// msg.set(no_repeat::BLOCK2, Block::try_new(0, 64, true).unwrap().bytes().to_vec());
/// let reply = Reply::new(msg, "127.0.0.1:5683".parse().unwrap());
///
/// assert_eq!(next_action(&reply, 0), NextAction::RequestBlock2 { num: 1, size: 64 });
/// ```
pub fn next_action(reply: &Reply, body_len: usize) -> NextAction {
  let block1 = reply.block1()
                    .filter(|b| b.more())
                    .map(|b| (b.num() + 1, b.size()))
                    .filter(|(num, size)| (*num as usize) * (*size as usize) < body_len);

  if let Some((num, size)) = block1 {
    return NextAction::SendBlock1 { num, size };
  }

  match reply.msg().block2() {
    | Some(b) if b.more() => NextAction::RequestBlock2 { num: b.num() + 1,
                                                         size: b.size() },
    | _ => NextAction::Deliver,
  }
}

/// Reassemble the body of a response from its replies.
///
/// Fragments are ordered by block number; empty fragments and fragments
/// whose number is not greater than the highest one already used are skipped.
pub fn merge<'a, I>(replies: I) -> Vec<u8>
  where I: IntoIterator<Item = &'a Reply>
{
  let mut replies = replies.into_iter().collect::<Vec<_>>();
  replies.sort_by_key(|r| r.block_num());

  let mut highest: Option<u32> = None;
  replies.into_iter()
         .filter(|r| !r.msg().payload.0.is_empty())
         .fold(Vec::new(), |mut body, r| {
           let num = r.block_num();
           if highest.map(|h| num > h).unwrap_or(true) {
             body.extend_from_slice(&r.msg().payload.0);
             highest = Some(num);
           }
           body
         })
}

/// The slice of `payload` that Block1 number `num` carries
pub(crate) fn slice(payload: &[u8], num: u32, size: u16) -> &[u8] {
  let start = (num as usize).saturating_mul(size as usize).min(payload.len());
  let end = start.saturating_add(size as usize).min(payload.len());
  &payload[start..end]
}
