/// Phase transfer functions for phase-distortion synthesis.
///
/// A shaper maps a phase in [0, 1) onto another phase in [0, 1). Reading an
/// oscillator through a bent phase changes the wave shape while the pitch,
/// which still comes from the undistorted phase accumulator, stays put.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WaveShaper {
    /// Identity; the oscillator is read undistorted.
    #[default]
    Linear,
    /// Restarts the cycle `ratio` times per period, like a hard-synced slave.
    HardSync { ratio: f32 },
    /// `phase^exponent`: values above 1 squeeze the start of the cycle.
    Power { exponent: f32 },
    /// Piecewise-linear bend through the point (`x`, `y`).
    Knee { x: f32, y: f32 },
}

impl WaveShaper {
    #[inline]
    pub fn value(&self, phase: f32) -> f32 {
        match *self {
            WaveShaper::Linear => phase,
            WaveShaper::HardSync { ratio } => {
                let scaled = phase * ratio;
                scaled - scaled.floor()
            }
            WaveShaper::Power { exponent } => phase.powf(exponent),
            WaveShaper::Knee { x, y } => {
                if x <= 0.0 {
                    y + (1.0 - y) * phase
                } else if x >= 1.0 {
                    y * phase
                } else if phase < x {
                    phase * y / x
                } else {
                    y + (phase - x) * (1.0 - y) / (1.0 - x)
                }
            }
        }
    }
}
