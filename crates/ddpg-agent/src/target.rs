//! Target network tracking

use ndarray::Zip;

use crate::actor::Actor;
use crate::critic::Critic;
use crate::network::Mlp;
use crate::utils::polyak_update;

/// Parameter sets that can slowly track an online counterpart
pub trait SoftUpdate {
    /// `self <- tau * online + (1 - tau) * self`, elementwise
    fn soft_update(&mut self, online: &Self, tau: f64);

    /// Copy every parameter of `online`
    fn hard_update(&mut self, online: &Self);
}

impl SoftUpdate for Mlp {
    fn soft_update(&mut self, online: &Self, tau: f64) {
        debug_assert!(self.same_architecture(online));
        for (target, source) in self.layers.iter_mut().zip(&online.layers) {
            Zip::from(&mut target.weight)
                .and(&source.weight)
                .for_each(|t, &s| *t = polyak_update(*t, s, tau));
            Zip::from(&mut target.bias)
                .and(&source.bias)
                .for_each(|t, &s| *t = polyak_update(*t, s, tau));
        }
    }

    fn hard_update(&mut self, online: &Self) {
        self.clone_from(online);
    }
}

impl SoftUpdate for Actor {
    fn soft_update(&mut self, online: &Self, tau: f64) {
        self.network_mut().soft_update(online.network(), tau);
    }

    fn hard_update(&mut self, online: &Self) {
        self.network_mut().hard_update(online.network());
    }
}

impl SoftUpdate for Critic {
    fn soft_update(&mut self, online: &Self, tau: f64) {
        self.network_mut().soft_update(online.network(), tau);
    }

    fn hard_update(&mut self, online: &Self) {
        self.network_mut().hard_update(online.network());
    }
}
