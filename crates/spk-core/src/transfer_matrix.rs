use num_complex::Complex64;

/// A 2×2 complex transfer matrix relating pressure and volume velocity at
/// the input (throat-side) port of an acoustic element to the output
/// (mouth-side) port:
///
/// ```text
/// [p_in ]   [a  b] [p_out]
/// [U_in ] = [c  d] [U_out]
/// ```
///
/// With this orientation the input impedance for a load Z on the output is
/// (a·Z + b)/(c·Z + d), and chaining runs throat → mouth. Every passive
/// reciprocal element satisfies det = 1.
#[derive(Debug, Clone, Copy)]
pub struct TransferMatrix {
    pub a: Complex64,
    pub b: Complex64,
    pub c: Complex64,
    pub d: Complex64,
}

impl TransferMatrix {
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { a, b, c, d }
    }

    /// Identity matrix (no-op element).
    pub fn identity() -> Self {
        Self {
            a: Complex64::new(1.0, 0.0),
            b: Complex64::new(0.0, 0.0),
            c: Complex64::new(0.0, 0.0),
            d: Complex64::new(1.0, 0.0),
        }
    }

    /// Chain (multiply) this matrix with the next element toward the mouth:
    /// self · other.
    pub fn chain(&self, other: &TransferMatrix) -> TransferMatrix {
        TransferMatrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
        }
    }

    /// Determinant a·d − b·c. Unity for reciprocal elements.
    pub fn det(&self) -> Complex64 {
        self.a * self.d - self.b * self.c
    }

    /// Impedance seen at the input when the output is terminated by
    /// `z_load`: (a·Z + b)/(c·Z + d).
    pub fn input_impedance(&self, z_load: Complex64) -> Complex64 {
        (self.a * z_load + self.b) / (self.c * z_load + self.d)
    }

    /// Output volume velocity for a given input volume velocity and output
    /// termination: U_out = U_in/(c·Z + d).
    pub fn output_velocity(&self, u_in: Complex64, z_load: Complex64) -> Complex64 {
        u_in / (self.c * z_load + self.d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::Medium;
    use crate::segment::Segment;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_is_transparent_at_the_throat() {
        // A no-op element ahead of a real horn segment must not change
        // what the throat sees or what the mouth receives.
        let medium = Medium::half_space();
        let seg = Segment::exponential(2e-3, 8e-2, 0.7).unwrap();
        let omega = 2.0 * PI * 400.0;
        let m = seg.transfer_matrix(omega, &medium);
        let chained = TransferMatrix::identity().chain(&m);

        let z_load = Complex64::new(medium.rho * medium.c / 8e-2, 0.0);
        let dz = (chained.input_impedance(z_load) - m.input_impedance(z_load)).norm();
        assert!(dz < 1e-9 * z_load.norm(), "throat impedance moved by {dz}");

        let u_in = Complex64::new(3e-4, -1e-4);
        let du = (chained.output_velocity(u_in, z_load) - m.output_velocity(u_in, z_load)).norm();
        assert!(du < 1e-15, "mouth velocity moved by {du}");
    }

    #[test]
    fn test_chain_runs_throat_to_mouth() {
        // Two exponential segments with the same flare constant compose to
        // the single segment spanning both, throat-side matrix first.
        let medium = Medium::half_space();
        let first = Segment::exponential(2e-3, 8e-3, 0.35).unwrap();
        let second = Segment::exponential(8e-3, 3.2e-2, 0.35).unwrap();
        let whole = Segment::exponential(2e-3, 3.2e-2, 0.7).unwrap();

        let omega = 2.0 * PI * 700.0;
        let split = first
            .transfer_matrix(omega, &medium)
            .chain(&second.transfer_matrix(omega, &medium));
        let joined = whole.transfer_matrix(omega, &medium);
        for (lhs, rhs) in [
            (split.a, joined.a),
            (split.b, joined.b),
            (split.c, joined.c),
            (split.d, joined.d),
        ] {
            assert!(
                (lhs - rhs).norm() < 1e-9 * (1.0 + rhs.norm()),
                "composed element {lhs} vs single-segment {rhs}"
            );
        }
    }

    #[test]
    fn test_uniform_pipe_reciprocity() {
        // Hand-built lossless duct matrix: det = cos²(kL) + sin²(kL) = 1,
        // and a matched termination ρc/S reflects straight through.
        let kl: f64 = 2.2 * 0.31; // wavenumber times length
        let z0 = 413.0 / 8e-3; // ρc over a 80 cm² bore
        let j = Complex64::new(0.0, 1.0);
        let m = TransferMatrix::new(
            Complex64::new(kl.cos(), 0.0),
            j * z0 * kl.sin(),
            j * kl.sin() / z0,
            Complex64::new(kl.cos(), 0.0),
        );
        assert!((m.det() - Complex64::new(1.0, 0.0)).norm() < 1e-12, "det = {}", m.det());
        let matched = Complex64::new(z0, 0.0);
        assert!((m.input_impedance(matched) - matched).norm() < 1e-9 * z0);
    }

    #[test]
    fn test_identity_passes_load_through() {
        let id = TransferMatrix::identity();
        let z = Complex64::new(37.0, -12.0);
        assert!((id.input_impedance(z) - z).norm() < 1e-12);
        let u = Complex64::new(1.0, 2.0);
        assert!((id.output_velocity(u, z) - u).norm() < 1e-12);
    }
}
