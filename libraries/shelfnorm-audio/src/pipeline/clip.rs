/// Final hard clipping to the representable range
use shelfnorm_core::AudioBuffer;

/// Lower bound of the output range
pub const CLIP_MIN: f64 = -1.0;
/// Upper bound of the output range
pub const CLIP_MAX: f64 = 1.0;

/// Map one sample into [-1.0, 1.0]
///
/// Infinities saturate to the nearest bound and NaN becomes silence.
pub fn clip_sample(sample: f64) -> f64 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(CLIP_MIN, CLIP_MAX)
    }
}

/// Clamp `buffer` to [-1.0, 1.0] in place, returning how many samples changed
///
/// NaN samples are replaced and counted like any other out-of-range value.
pub fn clip_buffer(buffer: &mut AudioBuffer) -> usize {
    let mut clipped = 0;
    for channel in buffer.channels_mut() {
        for sample in channel.iter_mut() {
            let limited = clip_sample(*sample);
            if limited.to_bits() != sample.to_bits() {
                *sample = limited;
                clipped += 1;
            }
        }
    }
    clipped
}
