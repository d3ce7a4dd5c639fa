use tinyvec::ArrayVec;

use super::no_repeat::{BLOCK1, BLOCK2};
use crate::{Opt, OptNumber, OptValue};

/// Largest block number representable in a Block option (20 bits)
pub const MAX_BLOCK_NUM: u32 = (1 << 20) - 1;

/// Three items of information may need to be transferred in a
/// Block (Block1 or Block2) option:
/// * the size of the block ([`Block::size`])
/// * whether more blocks are following ([`Block::more`])
/// * the relative number of the block ([`Block::num`]) within a sequence of blocks with the given size.
///
/// ```text
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 NUM                   |M| SZX |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Block(u32);

/// Block parameters that can't be represented on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockError {
  /// Block size was not a power of two
  SizeNotPowerOfTwo(u16),
  /// Block size was outside of `16..=1024`
  SizeOutOfRange(u16),
  /// Block number did not fit in 20 bits
  NumTooLarge(u32),
  /// Tried to build a block option for an option that isn't Block1 or Block2
  NotABlockOption(OptNumber),
}

impl Block {
  /// Create a block, rejecting sizes and numbers that can't be encoded.
  ///
  /// ```
  /// use croak_msg::{Block, BlockError};
  ///
  /// let b = Block::try_new(3, 128, true).unwrap();
  /// assert_eq!((b.num(), b.size(), b.more()), (3, 128, true));
  ///
  /// assert_eq!(Block::try_new(0, 100, false), Err(BlockError::SizeNotPowerOfTwo(100)));
  /// assert_eq!(Block::try_new(0, 2048, false), Err(BlockError::SizeOutOfRange(2048)));
  /// assert_eq!(Block::try_new(1 << 20, 16, false), Err(BlockError::NumTooLarge(1 << 20)));
  /// ```
  pub fn try_new(num: u32, size: u16, more: bool) -> Result<Self, BlockError> {
    let szx = Self::szx_of(size)?;

    if num > MAX_BLOCK_NUM {
      return Err(BlockError::NumTooLarge(num));
    }

    let num = num << 4;
    let more = u32::from(more) << 3;

    Ok(Self(num | more | szx))
  }

  /// Get the SZX exponent for a block size
  pub fn szx_of(size: u16) -> Result<u32, BlockError> {
    if !size.is_power_of_two() {
      Err(BlockError::SizeNotPowerOfTwo(size))
    } else if !(16..=1024).contains(&size) {
      Err(BlockError::SizeOutOfRange(size))
    } else {
      Ok(size.trailing_zeros() - 4)
    }
  }

  /// Parse a block option value (0-3 bytes, big-endian)
  ///
  /// Yields `None` if the value is longer than 3 bytes.
  pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
    if bytes.len() > 3 {
      return None;
    }

    Some(Self(bytes.iter().fold(0u32, |n, b| (n << 8) | *b as u32)))
  }

  /// Encode this block using the fewest bytes (1, 2 or 3) that fit
  ///
  /// ```
  /// use croak_msg::Block;
  ///
  /// assert_eq!(Block::try_new(0, 16, false).unwrap().bytes().as_slice(), &[0]);
  /// assert_eq!(Block::try_new(16, 16, false).unwrap().bytes().as_slice(), &[1, 0]);
  /// assert_eq!(Block::try_new(4096, 1024, true).unwrap().bytes().as_slice(), &[1, 0, 14]);
  /// ```
  pub fn bytes(&self) -> ArrayVec<[u8; 3]> {
    let [_, a, b, c] = self.0.to_be_bytes();
    let mut out = ArrayVec::new();

    match self.0 {
      | n if n > 0xFFFF => out.extend([a, b, c]),
      | n if n > 0xFF => out.extend([b, c]),
      | _ => out.push(c),
    }

    out
  }

  /// SZX; the block size exponent.
  ///
  /// The reserved value 7 is treated as 6.
  pub fn szx(&self) -> u32 {
    (self.0 & 0b111).min(6)
  }

  /// Size of the block in bytes, `2^(szx + 4)`
  pub fn size(&self) -> u16 {
    2u16.pow(self.szx() + 4)
  }

  /// Whether more blocks follow this one
  pub fn more(&self) -> bool {
    (self.0 & 0b1000) >> 3 == 1
  }

  /// The relative number of this block
  pub fn num(&self) -> u32 {
    self.0 >> 4
  }

  /// Byte offset of this block within the full payload
  pub fn offset(&self) -> usize {
    self.num() as usize * self.size() as usize
  }
}

impl From<Block> for u32 {
  fn from(b: Block) -> Self {
    b.0
  }
}

impl From<u32> for Block {
  fn from(n: u32) -> Self {
    Block(n)
  }
}

impl From<Block> for OptValue {
  fn from(b: Block) -> Self {
    OptValue(b.bytes().to_vec())
  }
}

/// Build a Block1 or Block2 option for block `num` of size `size`.
///
/// The "more" flag is only ever set for Block1 (describing a request payload
/// of `total_len` bytes), when `(num + 1) * size < total_len`. In a Block2
/// request option the flag has no meaning and is left clear.
///
/// ```
/// use croak_msg::{generate_block_option, no_repeat, Block};
///
/// let opt = generate_block_option(no_repeat::BLOCK1, 1, 64, 200).unwrap();
/// let block = Block::from_bytes(&opt.value.0).unwrap();
/// assert_eq!((block.num(), block.more(), block.size()), (1, true, 64));
///
/// let opt = generate_block_option(no_repeat::BLOCK1, 3, 64, 200).unwrap();
/// assert!(!Block::from_bytes(&opt.value.0).unwrap().more());
/// ```
pub fn generate_block_option(number: OptNumber,
                             num: u32,
                             size: u16,
                             total_len: usize)
                             -> Result<Opt, BlockError> {
  let more = match number {
    | BLOCK1 => (num as usize + 1) * (size as usize) < total_len,
    | BLOCK2 => false,
    | other => return Err(BlockError::NotABlockOption(other)),
  };

  Block::try_new(num, size, more).map(|block| Opt { number,
                                                    value: block.into() })
}
