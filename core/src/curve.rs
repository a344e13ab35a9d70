//! Animated scalar curves.
//!
//! Material channels can be driven by a [`Curve`] (one float) or by three
//! curves (an RGB triple). The uber program samples them at the time passed
//! to `render_mesh` and uploads the result as a plain uniform value.

/// How a curve interpolates between two keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurveInterpolation {
    /// Hold the value of the previous key.
    Step,
    /// Linear blend between neighbouring keys.
    #[default]
    Linear,
}

/// What a curve returns outside its key range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurveExtrapolation {
    /// Clamp to the first/last key value.
    #[default]
    Constant,
    /// Wrap the time into the key range.
    Repeat,
}

/// A single key of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveKey {
    /// Key time in seconds.
    pub time: f32,
    /// Value at that time.
    pub value: f32,
}

/// A scalar curve sampled by time in seconds.
///
/// # Example
///
/// ```
/// use ragl_core::curve::Curve;
///
/// let curve = Curve::new(0.0).with_key(0.0, 0.0).with_key(2.0, 1.0);
/// assert!((curve.sample(1.0) - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    name: Option<String>,
    default_value: f32,
    keys: Vec<CurveKey>,
    interpolation: CurveInterpolation,
    extrapolation: CurveExtrapolation,
}

impl Curve {
    /// Create a curve with no keys. It samples to `default_value` everywhere.
    pub fn new(default_value: f32) -> Self {
        Self {
            name: None,
            default_value,
            keys: Vec::new(),
            interpolation: CurveInterpolation::default(),
            extrapolation: CurveExtrapolation::default(),
        }
    }

    /// Create a curve that always returns `value`.
    pub fn constant(value: f32) -> Self {
        Self::new(value)
    }

    /// Set a debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a key, keeping keys sorted by time. A key at an existing time replaces it.
    pub fn with_key(mut self, time: f32, value: f32) -> Self {
        self.insert_key(time, value);
        self
    }

    /// Set the interpolation mode.
    pub fn with_interpolation(mut self, interpolation: CurveInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the extrapolation mode.
    pub fn with_extrapolation(mut self, extrapolation: CurveExtrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Insert or replace a key.
    pub fn insert_key(&mut self, time: f32, value: f32) {
        match self
            .keys
            .binary_search_by(|key| key.time.total_cmp(&time))
        {
            Ok(index) => self.keys[index].value = value,
            Err(index) => self.keys.insert(index, CurveKey { time, value }),
        }
    }

    /// Get the debug name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the keys, sorted by time.
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Sample the curve at `time` seconds.
    pub fn sample(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return self.default_value,
        };

        let span = last.time - first.time;
        let time = match self.extrapolation {
            CurveExtrapolation::Repeat if span > 0.0 => {
                first.time + (time - first.time).rem_euclid(span)
            }
            _ => time,
        };

        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; guaranteed to exist and be > 0 here.
        let next = self.keys.partition_point(|key| key.time <= time);
        let a = self.keys[next - 1];
        let b = self.keys[next];

        match self.interpolation {
            CurveInterpolation::Step => a.value,
            CurveInterpolation::Linear => {
                let t = (time - a.time) / (b.time - a.time);
                a.value + (b.value - a.value) * t
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_curve_returns_default() {
        assert_eq!(Curve::new(3.5).sample(10.0), 3.5);
    }

    #[test]
    fn test_linear_interpolation() {
        let curve = Curve::new(0.0).with_key(0.0, 0.0).with_key(1.0, 10.0);
        assert!((curve.sample(0.25) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_constant_extrapolation_clamps() {
        let curve = Curve::new(0.0).with_key(1.0, 2.0).with_key(2.0, 4.0);
        assert_eq!(curve.sample(-5.0), 2.0);
        assert_eq!(curve.sample(50.0), 4.0);
    }

    #[test]
    fn test_step_interpolation() {
        let curve = Curve::new(0.0)
            .with_key(0.0, 1.0)
            .with_key(1.0, 5.0)
            .with_interpolation(CurveInterpolation::Step);
        assert_eq!(curve.sample(0.99), 1.0);
    }

    #[test]
    fn test_repeat_extrapolation_wraps() {
        let curve = Curve::new(0.0)
            .with_key(0.0, 0.0)
            .with_key(2.0, 2.0)
            .with_extrapolation(CurveExtrapolation::Repeat);
        assert!((curve.sample(3.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_keys_stay_sorted_and_replace() {
        let mut curve = Curve::new(0.0).with_key(2.0, 1.0).with_key(1.0, 1.0);
        curve.insert_key(2.0, 7.0);
        let times: Vec<f32> = curve.keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
        assert_eq!(curve.keys()[1].value, 7.0);
    }
}
