// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 */

//! Plasticity synapse driven by an updater device inside a small host loop

use ahash::AHashMap;
use proptest::prelude::*;
use rand::rngs::mock::StepRng;
use spikecore_npu_neural::{
    IafMatco2018, IafPscExp, NeuralError, Node, NodeId, OutgoingSpike, SimulationContext,
    SpikeEvent, StatusDict,
};
use spikecore_npu_plasticity::{
    classify, force_update_all, Connection, ConnectionBase, HistoryRetention,
    MatcoCommonProperties, MatcoSynapse, PlasticityRegime, RateRuleThresholds, UpdaterDevice,
};

const PRE: NodeId = NodeId(1);
const POST: NodeId = NodeId(2);
const UPDATER: NodeId = NodeId(3);

type Nodes = AHashMap<NodeId, Box<dyn Node>>;

fn matco(id: NodeId, status: StatusDict) -> Box<dyn Node> {
    let mut n = IafMatco2018::new();
    n.set_node_id(id);
    n.set_status(&status).unwrap();
    Box::new(n)
}

fn build(ctx: &SimulationContext, pre_drive: f64, deliver_interval: i64) -> Nodes {
    let mut updater = UpdaterDevice::new();
    updater.set_node_id(UPDATER);
    updater
        .set_status(&StatusDict::new().with("deliver_interval", deliver_interval))
        .unwrap();

    let mut nodes: Nodes = AHashMap::new();
    nodes.insert(PRE, matco(PRE, StatusDict::new().with("I_e", pre_drive)));
    nodes.insert(POST, matco(POST, StatusDict::new()));
    nodes.insert(UPDATER, Box::new(updater));
    for n in nodes.values_mut() {
        n.init_buffers(ctx);
        n.calibrate(ctx).unwrap();
    }
    nodes
}

/// Runs `blocks` min-delay blocks; returns (presynaptic spikes, triggers applied)
fn simulate(
    ctx: &mut SimulationContext,
    nodes: &mut Nodes,
    synapses: &mut [MatcoSynapse],
    cp: &MatcoCommonProperties,
    blocks: usize,
) -> (usize, usize) {
    let mut rng = StepRng::new(0, 1);
    let mut spikes = 0;
    let mut triggers = 0;
    let ids = [PRE, POST, UPDATER];
    for _ in 0..blocks {
        let mut out: Vec<OutgoingSpike> = Vec::new();
        for id in ids {
            let node = nodes.get_mut(&id).unwrap();
            node.update(ctx, 0, ctx.min_delay, &mut out, &mut rng);
        }
        for spike in out.iter().filter(|s| s.sender == PRE) {
            spikes += 1;
            let post = nodes.get_mut(&POST).unwrap();
            for syn in synapses.iter_mut() {
                let mut e = SpikeEvent::new(spike.sender, spike.stamp);
                syn.send(ctx, &mut e, post.as_mut());
            }
        }
        let pending = nodes.get_mut(&UPDATER).unwrap().take_update_triggers();
        for t in pending {
            triggers += force_update_all(synapses, UPDATER, t, cp, &*nodes).unwrap();
        }
        ctx.advance_slice();
    }
    (spikes, triggers)
}

fn assigned_common(nodes: &Nodes) -> MatcoCommonProperties {
    let mut cp = MatcoCommonProperties::default();
    cp.set_status(&StatusDict::new().with("U", UPDATER.0), nodes)
        .unwrap();
    cp
}

/// Test: Weight changes only on updater triggers and every change is logged
#[test]
fn test_updates_follow_trigger_cadence() {
    let mut ctx = SimulationContext::default();
    let mut nodes = build(&ctx, 100.0, 2);
    let cp = assigned_common(&nodes);
    let mut synapses = vec![MatcoSynapse::new(ConnectionBase::new(POST, 0, 10).unwrap())];

    let (spikes, triggers) = simulate(&mut ctx, &mut nodes, &mut synapses, &cp, 20);
    assert!(spikes > 0, "presynaptic neuron never fired");
    assert_eq!(triggers, 10);

    let syn = &synapses[0];
    assert_eq!(syn.history().len(), 10);
    let weights = syn.history().weights();
    assert_eq!(weights.last().copied(), Some(syn.weight()));
    for d in syn.history().deltas() {
        assert!(d == 0.0 || (d.abs() - cp.learning_rate).abs() < 1e-15);
    }
    assert!(syn.omega_e() > 0.0 && syn.omega_e() < 1.0);

    let status = syn.get_status();
    assert_eq!(status.get_f64_vec("weights").unwrap(), weights);
    assert_eq!(status.get_f64_vec("rate").unwrap().len(), 10);
}

/// Test: Silent presynaptic input never potentiates
#[test]
fn test_silent_input_never_potentiates() {
    let mut ctx = SimulationContext::default();
    let mut nodes = build(&ctx, 0.0, 1);
    let cp = assigned_common(&nodes);
    let mut synapses = vec![MatcoSynapse::new(ConnectionBase::new(POST, 0, 10).unwrap())];

    let (spikes, triggers) = simulate(&mut ctx, &mut nodes, &mut synapses, &cp, 5);
    assert_eq!(spikes, 0);
    assert_eq!(triggers, 5);
    assert!(synapses[0]
        .history()
        .flags()
        .iter()
        .all(|f| *f == PlasticityRegime::None.flag()));
    assert_eq!(synapses[0].weight(), 1.0);
}

/// Test: Capped retention keeps only the newest samples
#[test]
fn test_capped_history() {
    let mut ctx = SimulationContext::default();
    let mut nodes = build(&ctx, 100.0, 1);
    let cp = assigned_common(&nodes);
    let mut synapses = vec![MatcoSynapse::with_retention(
        ConnectionBase::new(POST, 0, 10).unwrap(),
        HistoryRetention::Capped(3),
    )];

    let (_, triggers) = simulate(&mut ctx, &mut nodes, &mut synapses, &cp, 8);
    assert_eq!(triggers, 8);
    assert_eq!(synapses[0].history().len(), 3);
    assert_eq!(synapses[0].history().weights().last().copied(), Some(synapses[0].weight()));
}

/// Test: Each membrane-potential band maps to its regime
#[test]
fn test_four_regimes_against_postsynaptic_state() {
    let cases = [
        (0.20, PlasticityRegime::Ltp),
        (0.145, PlasticityRegime::HomosynapticLtd),
        (0.0, PlasticityRegime::None),
    ];
    for (v_m, expected) in cases {
        let mut nodes: Nodes = AHashMap::new();
        nodes.insert(POST, matco(POST, StatusDict::new().with("V_m", v_m)));
        let mut updater = UpdaterDevice::new();
        updater.set_node_id(UPDATER);
        nodes.insert(UPDATER, Box::new(updater));
        let cp = assigned_common(&nodes);

        let mut syn = MatcoSynapse::new(ConnectionBase::new(POST, 0, 10).unwrap());
        syn.set_status(&StatusDict::new().with("tau", 1.0)).unwrap();
        let ctx = SimulationContext::default();
        let post = nodes.get_mut(&POST).unwrap();
        post.init_buffers(&ctx);
        syn.send(&ctx, &mut SpikeEvent::new(PRE, 1), post.as_mut());

        assert_eq!(syn.force_update_weight(0.1, &cp, &nodes).unwrap(), expected);
        assert!(!syn.phi());
    }

    // Depolarised target without presynaptic activity
    let mut nodes: Nodes = AHashMap::new();
    nodes.insert(POST, matco(POST, StatusDict::new().with("V_m", 0.3)));
    let mut updater = UpdaterDevice::new();
    updater.set_node_id(UPDATER);
    nodes.insert(UPDATER, Box::new(updater));
    let cp = assigned_common(&nodes);
    let mut syn = MatcoSynapse::new(ConnectionBase::new(POST, 0, 10).unwrap());
    assert_eq!(
        syn.force_update_weight(0.1, &cp, &nodes).unwrap(),
        PlasticityRegime::HeterosynapticLtd
    );
    assert!((syn.weight() - (1.0 - cp.learning_rate)).abs() < 1e-12);
}

/// Test: Updating without an assigned updater fails
#[test]
fn test_missing_updater() {
    let ctx = SimulationContext::default();
    let nodes = build(&ctx, 0.0, 1);
    let mut synapses = vec![MatcoSynapse::new(ConnectionBase::new(POST, 0, 10).unwrap())];
    let cp = MatcoCommonProperties::default();
    assert_eq!(
        force_update_all(&mut synapses, UPDATER, 1.0, &cp, &nodes).unwrap_err(),
        NeuralError::NoWeightUpdater
    );
}

/// Test: A trigger from a different updater leaves synapses alone
#[test]
fn test_foreign_updater_ignored() {
    let ctx = SimulationContext::default();
    let nodes = build(&ctx, 0.0, 1);
    let cp = assigned_common(&nodes);
    let mut synapses = vec![MatcoSynapse::new(ConnectionBase::new(POST, 0, 10).unwrap())];
    assert_eq!(
        force_update_all(&mut synapses, NodeId(99), 1.0, &cp, &nodes).unwrap(),
        0
    );
    assert!(synapses[0].history().is_empty());
}

/// Test: Targets without a readable membrane potential are rejected
#[test]
fn test_exact_integrator_target_rejected() {
    let ctx = SimulationContext::default();
    let mut nodes = build(&ctx, 0.0, 1);
    let mut psc = IafPscExp::new();
    psc.set_node_id(NodeId(4));
    nodes.insert(NodeId(4), Box::new(psc));
    let cp = assigned_common(&nodes);

    let mut syn = MatcoSynapse::new(ConnectionBase::new(NodeId(4), 0, 10).unwrap());
    assert!(matches!(
        syn.force_update_weight(1.0, &cp, &nodes),
        Err(NeuralError::IncompatibleTarget { .. })
    ));
}

proptest! {
    /// Weight keeps its sign under any sequence of regimes
    #[test]
    fn prop_weight_sign_preserved(
        w0 in 0.01f64..10.0,
        seq in prop::collection::vec((0.0f64..1.0, -0.5f64..0.5), 1..200),
    ) {
        let t = RateRuleThresholds::default();
        let lr = 0.0008;
        let mut w = w0;
        for (omega, v_m) in seq {
            w += w * classify(omega, v_m, &t).delta(lr);
        }
        prop_assert!(w > 0.0);
    }
}
