// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 */

//! Property tests for propagators, ring buffers and refractoriness

use proptest::prelude::*;
use rand::rngs::mock::StepRng;
use spikecore_npu_neural::propagator::{decay, propagator_20, propagator_21};
use spikecore_npu_neural::{
    IafPscExp, Node, OutgoingSpike, Resolution, RingBuffer, SimulationContext, StatusDict,
};

proptest! {
    /// Decay factors stay strictly inside (0, 1)
    #[test]
    fn prop_decay_in_unit_interval(tau in 0.1f64..100.0, h in 0.01f64..5.0) {
        let p = decay(h, tau);
        prop_assert!(p > 0.0 && p < 1.0);
    }

    /// Decay approaches identity as the step shrinks
    #[test]
    fn prop_decay_identity_limit(tau in 0.1f64..100.0) {
        let coarse = decay(0.1, tau);
        let fine = decay(1e-8, tau);
        prop_assert!(fine > coarse);
        prop_assert!(1.0 - fine < 1e-5);
    }

    /// Current-to-membrane transfer is positive and finite for every tau pair
    #[test]
    fn prop_p21_positive(
        tau_s in 0.1f64..50.0,
        tau_m in 0.1f64..50.0,
        c in 1.0f64..1000.0,
        h in 0.01f64..2.0,
    ) {
        let p21 = propagator_21(tau_s, tau_m, c, h);
        prop_assert!(p21.is_finite());
        prop_assert!(p21 > 0.0);
        prop_assert!(propagator_20(tau_m, c, h) > 0.0);
    }

    /// Every add between two reads is returned by the next read
    #[test]
    fn prop_ring_buffer_sums(
        len in 1usize..64,
        slot in 0usize..1000,
        adds in prop::collection::vec(-100.0f64..100.0, 0..32),
    ) {
        let mut rb = RingBuffer::new(len);
        for a in &adds {
            rb.add_value(slot, *a);
        }
        let expected: f64 = adds.iter().sum();
        let got = rb.get_value(slot);
        prop_assert!((got - expected).abs() <= 1e-9 * (1.0 + expected.abs()));
        prop_assert_eq!(rb.get_value(slot), 0.0);
    }

    /// No two spikes closer than the refractory period
    #[test]
    fn prop_refractory_separation(t_ref in 0.0f64..5.0, i_e in 400.0f64..3000.0) {
        let mut ctx = SimulationContext::new(Resolution::default(), 10, 20).unwrap();
        let mut n = IafPscExp::new();
        n.set_status(&StatusDict::new().with("t_ref", t_ref).with("I_e", i_e)).unwrap();
        n.init_buffers(&ctx);
        n.calibrate(&ctx).unwrap();

        let mut sink: Vec<OutgoingSpike> = Vec::new();
        let mut rng = StepRng::new(0, 1);
        for _ in 0..30 {
            n.update(&ctx, 0, ctx.min_delay, &mut sink, &mut rng);
            ctx.advance_slice();
        }
        let counts = ctx.resolution.ms_to_steps(t_ref);
        for pair in sink.windows(2) {
            prop_assert!(pair[1].stamp - pair[0].stamp > counts);
        }
    }
}
