// Every payload sub-region starts on this boundary
pub const ALIGNMENT: u64 = 8;

// Fill byte for gaps left by aligned or out of order writes
pub const PAD_BYTE: u8 = 0xCC;

pub fn align_up(offset: u64) -> u64 {
    (offset + (ALIGNMENT - 1)) & !(ALIGNMENT - 1)
}

pub fn is_aligned(offset: u64) -> bool {
    offset & (ALIGNMENT - 1) == 0
}

// Grow the buffer to `len` with PAD_BYTE, never shrinks it
pub fn pad_to(buf: &mut Vec<u8>, len: usize) {
    if buf.len() < len {
        buf.resize(len, PAD_BYTE);
    }
}
