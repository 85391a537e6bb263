//! Sum-of-absolute-differences scoring over two equally shaped images.
//!
//! Every path returns a score normalized to `[0, 1]`: the raw SAD divided by
//! the largest SAD the samples could produce.

use super::pixels::{PixelBuffer, PixelLayout};

const MAX_U8: f64 = u8::MAX as f64;
const MAX_U16: f64 = u16::MAX as f64;

/// Normalized difference between two images of identical dimensions.
///
/// Packed buffers with matching sample type and channel count take the bulk
/// path; every other combination is compared pixel by pixel.
pub fn score(left: &PixelBuffer<'_>, right: &PixelBuffer<'_>) -> f64 {
    debug_assert_eq!(left.dimensions(), right.dimensions());
    match (left.layout(), right.layout()) {
        (
            PixelLayout::PackedU8 { channels: lc, samples: l },
            PixelLayout::PackedU8 { channels: rc, samples: r },
        ) if lc == rc => score_packed_u8(l, r),
        (
            PixelLayout::PackedU16 { channels: lc, samples: l },
            PixelLayout::PackedU16 { channels: rc, samples: r },
        ) if lc == rc => score_packed_u16(l, r),
        _ => score_generic(left, right),
    }
}

pub fn score_packed_u8(left: &[u8], right: &[u8]) -> f64 {
    if left.is_empty() {
        return 0.0;
    }
    sad_u8(left, right) as f64 / (left.len() as f64 * MAX_U8)
}

pub fn score_packed_u16(left: &[u16], right: &[u16]) -> f64 {
    if left.is_empty() {
        return 0.0;
    }
    sad_u16(left, right) as f64 / (left.len() as f64 * MAX_U16)
}

/// Four 16-bit channels per pixel through the per-pixel accessor.
pub fn score_generic(left: &PixelBuffer<'_>, right: &PixelBuffer<'_>) -> f64 {
    let (width, height) = left.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let mut sad = 0u64;
    for y in 0..height {
        for x in 0..width {
            let l = left.sample(x, y);
            let r = right.sample(x, y);
            sad += l
                .iter()
                .zip(&r)
                .map(|(a, b)| u64::from(a.abs_diff(*b)))
                .sum::<u64>();
        }
    }
    sad as f64 / (4.0 * f64::from(width) * f64::from(height) * MAX_U16)
}

/// SAD over two byte buffers of equal length.
#[cfg(target_arch = "x86_64")]
pub fn sad_u8(left: &[u8], right: &[u8]) -> u64 {
    debug_assert_eq!(left.len(), right.len());
    // SAFETY: SSE2 is part of the x86_64 baseline.
    unsafe { sse2::sad_u8(left, right) }
}

/// SAD over two byte buffers of equal length.
#[cfg(not(target_arch = "x86_64"))]
pub fn sad_u8(left: &[u8], right: &[u8]) -> u64 {
    debug_assert_eq!(left.len(), right.len());
    sad_u8_scalar(left, right)
}

pub fn sad_u8_scalar(left: &[u8], right: &[u8]) -> u64 {
    left.iter()
        .zip(right)
        .map(|(a, b)| u64::from(a.abs_diff(*b)))
        .sum()
}

pub fn sad_u16(left: &[u16], right: &[u16]) -> u64 {
    debug_assert_eq!(left.len(), right.len());
    left.iter()
        .zip(right)
        .map(|(a, b)| u64::from(a.abs_diff(*b)))
        .sum()
}

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use std::arch::x86_64::{
        __m128i, _mm_add_epi64, _mm_loadu_si128, _mm_sad_epu8, _mm_setzero_si128,
        _mm_storeu_si128,
    };

    const CHUNK: usize = 16;

    /// `psadbw` over 16-byte chunks, scalar loop for the tail.
    ///
    /// Each `psadbw` yields two 64-bit partial sums of at most `8 * 255`, so
    /// the lane accumulators cannot overflow for any addressable length.
    ///
    /// # Safety
    /// Caller must ensure SSE2 is available on the current CPU.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sad_u8(left: &[u8], right: &[u8]) -> u64 {
        let mut lc = left.chunks_exact(CHUNK);
        let mut rc = right.chunks_exact(CHUNK);

        // SAFETY: every chunk is exactly CHUNK bytes and `loadu`/`storeu` have
        // no alignment requirement.
        let simd = unsafe {
            let mut acc = _mm_setzero_si128();
            for (l, r) in lc.by_ref().zip(rc.by_ref()) {
                let a = _mm_loadu_si128(l.as_ptr().cast::<__m128i>());
                let b = _mm_loadu_si128(r.as_ptr().cast::<__m128i>());
                acc = _mm_add_epi64(acc, _mm_sad_epu8(a, b));
            }
            let mut lanes = [0u64; 2];
            _mm_storeu_si128(lanes.as_mut_ptr().cast::<__m128i>(), acc);
            lanes[0] + lanes[1]
        };

        simd + super::sad_u8_scalar(lc.remainder(), rc.remainder())
    }
}
