//! XOR payload masking, as used by WebSocket-style framers.
//!
//! Stateless and independent of the buffers. Masking twice with the same key
//! restores the input.

/// Return `data` with every byte XORed against `mask[i % 4]`.
pub fn apply_mask(mask: [u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    apply_mask_in_place(mask, &mut out);
    out
}

/// Mask a buffer the caller already owns.
pub fn apply_mask_in_place(mask: [u8; 4], data: &mut [u8]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}
