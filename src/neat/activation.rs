//! Node activation functions

use serde::{Deserialize, Serialize};

/// Activation functions for network nodes
///
/// Sigmoid and tanh are steepened (x5 and x2.5) so that small weighted sums
/// still reach the saturated range, the convention the jump threshold of 0.5
/// is tuned for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActivationFunction {
    Linear,
    Sigmoid,
    Tanh,
    Gaussian,
    Sine,
    Relu,
    Step,
}

impl ActivationFunction {
    /// Apply activation function to input
    pub fn activate(&self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Sigmoid => {
                let z = (5.0 * x).clamp(-60.0, 60.0);
                1.0 / (1.0 + (-z).exp())
            }
            Self::Tanh => (2.5 * x).clamp(-60.0, 60.0).tanh(),
            Self::Gaussian => {
                let z = x.clamp(-3.4, 3.4);
                (-5.0 * z * z).exp()
            }
            Self::Sine => (5.0 * x).clamp(-60.0, 60.0).sin(),
            Self::Relu => x.max(0.0),
            Self::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tanh_is_steepened_and_bounded() {
        let f = ActivationFunction::Tanh;
        assert_eq!(f.activate(0.0), 0.0);
        assert!((f.activate(0.2) - 0.5f64.tanh()).abs() < 1e-12);
        assert!(f.activate(1e9) <= 1.0);
        assert!(f.activate(-1e9) >= -1.0);
    }

    #[test]
    fn test_sigmoid_midpoint() {
        let f = ActivationFunction::Sigmoid;
        assert!((f.activate(0.0) - 0.5).abs() < 1e-12);
        assert!(f.activate(10.0) > 0.99);
        assert!(f.activate(-10.0) < 0.01);
    }

    #[test]
    fn test_step_and_relu() {
        assert_eq!(ActivationFunction::Step.activate(0.1), 1.0);
        assert_eq!(ActivationFunction::Step.activate(0.0), 0.0);
        assert_eq!(ActivationFunction::Relu.activate(-2.0), 0.0);
        assert_eq!(ActivationFunction::Relu.activate(2.0), 2.0);
    }
}
