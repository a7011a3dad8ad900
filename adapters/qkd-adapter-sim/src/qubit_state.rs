//! Single-qubit state simulation.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::FRAC_1_SQRT_2;

use qkd_ir::StandardGate;

/// The state of one qubit: amplitudes of |0⟩ and |1⟩.
#[derive(Debug, Clone, Copy)]
pub struct QubitState {
    amplitudes: [Complex64; 2],
}

impl QubitState {
    /// A qubit initialised to |0⟩.
    pub fn zero() -> Self {
        Self {
            amplitudes: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        }
    }

    /// Apply a standard gate.
    pub fn apply(&mut self, gate: StandardGate) {
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_x(),
            StandardGate::Z => self.apply_z(),
            StandardGate::H => self.apply_h(),
        }
    }

    fn apply_x(&mut self) {
        self.amplitudes.swap(0, 1);
    }

    fn apply_z(&mut self) {
        self.amplitudes[1] = -self.amplitudes[1];
    }

    fn apply_h(&mut self) {
        let [a, b] = self.amplitudes;
        self.amplitudes = [FRAC_1_SQRT_2 * (a + b), FRAC_1_SQRT_2 * (a - b)];
    }

    /// Probability of reading 1 in the computational basis.
    pub fn prob_one(&self) -> f64 {
        self.amplitudes[1].norm_sqr()
    }

    /// Bit-flip channel: apply X with probability `p`.
    pub fn bit_flip<R: Rng>(&mut self, p: f64, rng: &mut R) {
        if p > 0.0 && rng.gen_bool(p.min(1.0)) {
            self.apply_x();
        }
    }

    /// Depolarizing channel: with probability `p` apply a uniformly chosen
    /// Pauli (I, X, Y or Z), which leaves the maximally mixed state on average.
    pub fn depolarize<R: Rng>(&mut self, p: f64, rng: &mut R) {
        if p <= 0.0 || !rng.gen_bool(p.min(1.0)) {
            return;
        }
        match rng.gen_range(0..4u8) {
            0 => {}
            1 => self.apply_x(),
            // Y = iXZ; the global phase is unobservable.
            2 => {
                self.apply_z();
                self.apply_x();
            }
            _ => self.apply_z(),
        }
    }

    /// Measure in the computational basis, collapsing the state.
    pub fn measure<R: Rng>(&mut self, rng: &mut R) -> bool {
        let r: f64 = rng.r#gen();
        let one = r < self.prob_one();
        self.amplitudes = if one {
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
        } else {
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]
        };
        one
    }
}
