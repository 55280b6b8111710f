//! Adam optimizer for [`Mlp`] parameters

use ndarray::{Array1, Array2, Zip};

use crate::network::{Gradients, Mlp};

/// First and second moment estimates of one layer
#[derive(Debug, Clone)]
struct LayerMoments {
    weight_m: Array2<f64>,
    weight_v: Array2<f64>,
    bias_m: Array1<f64>,
    bias_v: Array1<f64>,
}

/// Adam (Kingma & Ba) with bias-corrected moment estimates
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: u64,
    moments: Vec<LayerMoments>,
}

impl Adam {
    /// Create an optimizer for `net` with the usual `beta1 = 0.9`, `beta2 = 0.999`
    #[must_use]
    pub fn new(net: &Mlp, learning_rate: f64) -> Self {
        let moments = net
            .layers
            .iter()
            .map(|layer| LayerMoments {
                weight_m: Array2::zeros(layer.weight.raw_dim()),
                weight_v: Array2::zeros(layer.weight.raw_dim()),
                bias_m: Array1::zeros(layer.bias.raw_dim()),
                bias_v: Array1::zeros(layer.bias.raw_dim()),
            })
            .collect();

        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            moments,
        }
    }

    /// Number of steps taken so far
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.t
    }

    /// Apply one descent step of `grads` to `net`
    pub fn step(&mut self, net: &mut Mlp, grads: &Gradients) {
        debug_assert_eq!(net.layers.len(), grads.layers.len());
        self.t += 1;

        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        #[allow(clippy::cast_precision_loss)]
        let t = self.t as f64;
        let correction1 = 1.0 - beta1.powf(t);
        let correction2 = 1.0 - beta2.powf(t);
        let update = move |p: &mut f64, m: &mut f64, v: &mut f64, g: f64| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *p -= lr * m_hat / (v_hat.sqrt() + eps);
        };

        for ((layer, moments), grad) in net.layers.iter_mut().zip(&mut self.moments).zip(&grads.layers) {
            Zip::from(&mut layer.weight)
                .and(&mut moments.weight_m)
                .and(&mut moments.weight_v)
                .and(&grad.weight)
                .for_each(|p, m, v, &g| update(p, m, v, g));
            Zip::from(&mut layer.bias)
                .and(&mut moments.bias_m)
                .and(&mut moments.bias_v)
                .and(&grad.bias)
                .for_each(|p, m, v, &g| update(p, m, v, g));
        }
    }
}
