//! Effect trait definition
//!
//! Base trait for the stateful processors a render instantiates from the
//! stage list.

use std::ops::Range;

/// A stateful DSP processor
///
/// Effects process planar audio in place, one frame range at a time. State
/// (filter history, envelope) carries over between consecutive ranges so a
/// buffer rendered in blocks matches one rendered in a single pass.
pub trait Effect: Send {
    /// Process `frames` of every channel in place
    ///
    /// All channels have the same length and `frames` lies within it.
    fn process(&mut self, channels: &mut [Vec<f32>], frames: Range<usize>);

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;
}
