use crate::grib::{GribError, Result};

const PROBE: u16 = 0x0001;

/// Whether the host stores multi-byte integers least significant byte first.
pub fn is_little_endian() -> bool {
    PROBE.to_ne_bytes()[0] == 0x01
}

/// Reverses every `element_size`-byte element of `buf` in place when the host is
/// little-endian. GRIB2 is big-endian on the wire, so after this call the
/// elements can be reinterpreted with `from_ne_bytes`.
pub fn normalize(buf: &mut [u8], element_size: usize) {
    if element_size < 2 || !is_little_endian() {
        return;
    }
    for element in buf.chunks_exact_mut(element_size) {
        element.reverse();
    }
}

const WINDOW_SIZE: usize = 8;
const WINDOW_BITS: usize = WINDOW_SIZE * 8;

/// Reads a `bit_width`-bit unsigned integer starting `bit_offset` bits into `buf`,
/// most significant bit first.
///
/// The value is cut out of a big-endian window loaded from the byte holding the
/// first bit. Bytes of the window past the end of `buf` read as zero.
pub fn read_bits(buf: &[u8], bit_offset: usize, bit_width: usize) -> u32 {
    debug_assert!((1..=32).contains(&bit_width), "bit width {} out of range", bit_width);

    let byte_offset = bit_offset / 8;
    let mut window = [0u8; WINDOW_SIZE];
    if byte_offset < buf.len() {
        let available = (buf.len() - byte_offset).min(WINDOW_SIZE);
        window[..available].copy_from_slice(&buf[byte_offset..byte_offset + available]);
    }
    normalize(&mut window, WINDOW_SIZE);
    let word = u64::from_ne_bytes(window);

    let shift = WINDOW_BITS - bit_width - bit_offset % 8;
    let mask = (1u64 << bit_width) - 1;

    ((word >> shift) & mask) as u32
}

pub(crate) trait GribInt<I> {
    fn as_grib_int(&self) -> I;
}

macro_rules! add_impl_for_ints {
    ($(($ty_src:ty, $ty_dst:ty),)*) => ($(
        impl GribInt<$ty_dst> for $ty_src {
            fn as_grib_int(&self) -> $ty_dst {
                if self.leading_zeros() == 0 {
                    let abs = (self << 1 >> 1) as $ty_dst;
                    -abs
                } else {
                    *self as $ty_dst
                }
            }
        }
    )*);
}

add_impl_for_ints! {
    (u8, i8),
    (u16, i16),
    (u32, i32),
    (u64, i64),
}

/// Forward-only cursor over a section buffer.
pub(crate) struct Buffer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Buffer<'a> {
    pub(crate) fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        if end > self.bytes.len() {
            return Err(GribError::FieldOverrun { offset: self.pos, len: self.bytes.len() });
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;

        Ok(slice)
    }
}
