/// Second-order section cascade
///
/// Runs one or more biquad sections in series over a single channel. Each
/// channel gets its own zeroed state, so channels never influence each other.
use super::shelf::SosCoefficients;
use rayon::prelude::*;
use shelfnorm_core::AudioBuffer;

/// Direct form I memory for one section
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SectionState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl SectionState {
    #[inline]
    fn process(&mut self, c: &SosCoefficients, x: f64) -> f64 {
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }
}

/// Cascade of sections with private per-section state
///
/// `process` consumes the filter, so state cannot carry over into another
/// channel or another invocation.
#[derive(Debug, Clone)]
pub struct SectionCascadeFilter<'a> {
    sections: &'a [SosCoefficients],
    states: Vec<SectionState>,
}

impl<'a> SectionCascadeFilter<'a> {
    /// Create a cascade with zeroed state
    pub fn new(sections: &'a [SosCoefficients]) -> Self {
        Self {
            sections,
            states: vec![SectionState::default(); sections.len()],
        }
    }

    /// Number of sections in the cascade
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Cascade without sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Filter one channel in place
    ///
    /// Each section runs over the whole sequence before the next section
    /// starts; its output is the next section's input.
    pub fn process(mut self, samples: &mut [f64]) {
        for (coeffs, state) in self.sections.iter().zip(self.states.iter_mut()) {
            for sample in samples.iter_mut() {
                *sample = state.process(coeffs, *sample);
            }
        }
    }
}

/// Filter one channel with fresh state and return the output
pub fn apply(sections: &[SosCoefficients], samples: &[f64]) -> Vec<f64> {
    let mut out = samples.to_vec();
    SectionCascadeFilter::new(sections).process(&mut out);
    out
}

/// Filter every channel of `buffer` in place
///
/// With `parallel` set, channels are spread over the rayon pool. Each
/// channel owns its state, so the result is identical either way.
pub fn filter_buffer(buffer: &mut AudioBuffer, sections: &[SosCoefficients], parallel: bool) {
    let channels = buffer.channels_mut();
    if parallel && channels.len() > 1 {
        channels
            .into_par_iter()
            .for_each(|channel| SectionCascadeFilter::new(sections).process(channel));
    } else {
        for channel in channels {
            SectionCascadeFilter::new(sections).process(channel);
        }
    }
}
