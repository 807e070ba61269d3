//! Arithmetic on sample slices.
//!
//! Stencils work on the interpolated prefix of a sample, so callers pass
//! slices already cut to the layer count. The `*_within` variants address
//! samples inside one buffer by offset, for stencils whose inputs and output
//! live in the same element.

#[inline]
pub(crate) fn copy(dst: &mut [f32], src: &[f32]) {
    dst.copy_from_slice(src);
}

#[inline]
pub(crate) fn add(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d += s;
    }
}

#[inline]
pub(crate) fn sub(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d -= s;
    }
}

#[inline]
pub(crate) fn scale(dst: &mut [f32], f: f32) {
    for d in dst.iter_mut() {
        *d *= f;
    }
}

/// `dst = (a + b) / 2`
#[inline]
pub(crate) fn midpoint(dst: &mut [f32], a: &[f32], b: &[f32]) {
    for ((d, x), y) in dst.iter_mut().zip(a).zip(b) {
        *d = (x + y) * 0.5;
    }
}

/// `dst = dst + (target - dst) * t`
#[inline]
pub(crate) fn lerp_to(dst: &mut [f32], target: &[f32], t: f32) {
    for (d, x) in dst.iter_mut().zip(target) {
        *d += (x - *d) * t;
    }
}

/// `buf[dst] = average of buf[srcs]`, over `n` components.
#[inline]
pub(crate) fn avg4_within(buf: &mut [f32], dst: usize, srcs: [usize; 4], n: usize) {
    let [a, b, c, d] = srcs;
    for i in 0..n {
        buf[dst + i] = (buf[a + i] + buf[b + i] + buf[c + i] + buf[d + i]) * 0.25;
    }
}

/// `dst = average of buf[srcs]`, over `dst.len()` components.
#[inline]
pub(crate) fn avg4_from(dst: &mut [f32], buf: &[f32], srcs: [usize; 4]) {
    let [a, b, c, d] = srcs;
    for (i, out) in dst.iter_mut().enumerate() {
        *out = (buf[a + i] + buf[b + i] + buf[c + i] + buf[d + i]) * 0.25;
    }
}

/// Copy `len` floats from offset `src` to offset `dst` of the same buffer.
#[inline]
pub(crate) fn copy_within(buf: &mut [f32], dst: usize, src: usize, len: usize) {
    if dst != src {
        buf.copy_within(src..src + len, dst);
    }
}

/// `buf[dst] += buf[src]`, over `n` components.
#[inline]
pub(crate) fn add_within(buf: &mut [f32], dst: usize, src: usize, n: usize) {
    for i in 0..n {
        buf[dst + i] += buf[src + i];
    }
}

/// Copy `len` floats from `src[src_off..]` into `dst[dst_off..]`.
#[inline]
pub(crate) fn copy_sample(dst: &mut [f32], dst_off: usize, src: &[f32], src_off: usize, len: usize) {
    dst[dst_off..dst_off + len].copy_from_slice(&src[src_off..src_off + len]);
}
