// centroidal_core/src/utils/integrators.rs

use nalgebra::DVector;
use num_traits::Float;
use serde::Deserialize;

/// A fixed-step ODE integrator for `ẋ = f(x, t)`.
pub trait Integrator<T> {
    /// Advances `x0` from `t0` to `tf` in a single step.
    fn step(
        &self,
        func: &dyn Fn(&DVector<T>, T) -> DVector<T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> DVector<T>;
}

/// First-order explicit Euler (RK1).
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplicitEuler;

impl<T> Integrator<T> for ExplicitEuler
where
    T: Float + std::ops::Mul<DVector<T>, Output = DVector<T>>,
    DVector<T>: std::ops::Add<Output = DVector<T>>,
{
    fn step(
        &self,
        func: &dyn Fn(&DVector<T>, T) -> DVector<T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> DVector<T> {
        let dt = tf - t0;
        x0.clone() + dt * func(x0, t0)
    }
}

/// Classic fourth-order Runge-Kutta.
#[derive(Debug, Default, Clone, Copy)]
pub struct RK4;

impl<T> Integrator<T> for RK4
where
    T: Float + std::ops::Mul<DVector<T>, Output = DVector<T>>,
    DVector<T>: std::ops::Add<Output = DVector<T>>,
{
    fn step(
        &self,
        func: &dyn Fn(&DVector<T>, T) -> DVector<T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> DVector<T> {
        let dt = tf - t0;
        let two = T::one() + T::one();
        let half = T::one() / two;
        let sixth = T::one() / (two + two + two);

        let k1 = func(x0, t0);
        let k2 = func(&(x0.clone() + (half * dt) * k1.clone()), t0 + half * dt);
        let k3 = func(&(x0.clone() + (half * dt) * k2.clone()), t0 + half * dt);
        let k4 = func(&(x0.clone() + dt * k3.clone()), tf);

        x0.clone() + (dt * sixth) * (k1 + two * k2 + two * k3 + k4)
    }
}

/// Integrator selection as it appears in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum IntegratorKind {
    Euler,
    #[default]
    Rk4,
}

impl IntegratorKind {
    pub fn integrator(self) -> &'static dyn Integrator<f64> {
        match self {
            IntegratorKind::Euler => &ExplicitEuler,
            IntegratorKind::Rk4 => &RK4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ẋ = -x, exact solution x(t) = x0 e^{-t}
    fn decay(x: &DVector<f64>, _t: f64) -> DVector<f64> {
        -x
    }

    #[test]
    fn test_euler_single_step() {
        let x0 = DVector::from_vec(vec![2.0]);
        let x1 = ExplicitEuler.step(&decay, &x0, 0.0, 0.1);
        assert_relative_eq!(x1[0], 2.0 * 0.9, epsilon = 1e-15);
    }

    #[test]
    fn test_rk4_matches_exponential_decay() {
        let mut x = DVector::from_vec(vec![1.0, -3.0]);
        let dt = 0.01;
        for k in 0..100 {
            let t = k as f64 * dt;
            x = RK4.step(&decay, &x, t, t + dt);
        }
        let e = (-1.0_f64).exp();
        assert_relative_eq!(x[0], e, max_relative = 1e-9);
        assert_relative_eq!(x[1], -3.0 * e, max_relative = 1e-9);
    }

    #[test]
    fn test_kind_dispatch() {
        let x0 = DVector::from_vec(vec![1.0]);
        let euler = IntegratorKind::Euler.integrator().step(&decay, &x0, 0.0, 0.5);
        let rk4 = IntegratorKind::Rk4.integrator().step(&decay, &x0, 0.0, 0.5);
        assert_relative_eq!(euler[0], 0.5);
        assert!((rk4[0] - (-0.5_f64).exp()).abs() < (euler[0] - (-0.5_f64).exp()).abs());
    }
}
