use branching_common::{
    CellVariant, EventKind, IntensityConfig, PopulationPoint, SamplerConfig, SimulationConfig,
    TimeContract,
};
use branching_engine::{
    run_batch, CellFactory, CellSimulation, DurationSampler, FixedDuration, SimulationError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::AtomicBool;

fn curve(pairs: &[(f64, i64)]) -> Vec<PopulationPoint> {
    pairs.iter().map(|&(t, n)| PopulationPoint::new(t, n)).collect()
}

fn fixed_config(division: f64, lifetime: f64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.division = SamplerConfig::Fixed { value: division };
    config.lifetime = SamplerConfig::Fixed { value: lifetime };
    config
}

#[test]
fn constant_division_with_infinite_lifetime() {
    let mut config = fixed_config(2.0, f64::INFINITY);

    let mut sim = CellSimulation::from_config(&config, 0).unwrap();
    sim.run(3).unwrap();
    assert_eq!(sim.population_curve(), curve(&[(0.0, 1), (2.0, 2), (4.0, 3), (4.0, 4)]));

    config.cells.time_contract = TimeContract::Absolute;
    let mut sim = CellSimulation::from_config(&config, 0).unwrap();
    sim.run(3).unwrap();
    assert_eq!(sim.population_curve(), curve(&[(0.0, 1), (2.0, 2), (2.0, 3), (2.0, 4)]));
}

#[test]
fn lifetime_shorter_than_division_means_single_death() {
    let config = fixed_config(5.0, 3.0);
    let mut sim = CellSimulation::from_config(&config, 0).unwrap();
    assert!(!sim.live_cells()[0].will_divide());

    sim.run(5).unwrap();
    assert_eq!(sim.population_curve(), curve(&[(0.0, 1), (3.0, 0)]));
    assert_eq!(sim.step().unwrap(), None);
    assert_eq!(sim.event_log().len(), 1);
}

#[test]
fn division_and_death_interleave() {
    // Divides every 2, dies 3 after birth: each generation divides before dying.
    let mut sim = CellSimulation::from_config(&fixed_config(2.0, 3.0), 0).unwrap();
    sim.run(7).unwrap();
    let kinds: Vec<EventKind> = sim.event_log().iter().map(|e| e.kind).collect();
    assert!(kinds.iter().all(|k| *k == EventKind::Division));
    assert_eq!(sim.population(), 8);
}

#[test]
fn scripted_sampler_drives_mixed_events() {
    // Seed: life 10, division 1. Daughters alternate between dying at +1 and dividing at +4.
    let factory = CellFactory::new(
        CellVariant::Normal,
        Box::new(|time: f64, _rng: &mut StdRng| if time == 0.0 { 1.0 } else { 4.0 }),
        Box::new(|time: f64, _rng: &mut StdRng| if time == 0.0 { 10.0 } else { 1.0 }),
    );
    let mut sim = CellSimulation::new(factory, StdRng::seed_from_u64(0), true).unwrap();
    sim.run(10).unwrap();

    // Division at 1, then both daughters die at 2 (first in scan order first).
    assert_eq!(sim.population_curve(), curve(&[(0.0, 1), (1.0, 2), (2.0, 1), (2.0, 0)]));
    let ids: Vec<u64> = sim.event_log().iter().map(|e| e.cell_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(sim.is_terminated());
}

#[test]
fn immortal_cells_ignore_lifetime_sampler() {
    let mut config = fixed_config(1.0, 0.1);
    config.cells.variant = CellVariant::Immortal;
    let mut sim = CellSimulation::from_config(&config, 0).unwrap();
    sim.run(15).unwrap();
    assert!(sim.live_cells().iter().all(|c| c.life_time().is_infinite()));
    assert!(sim.event_log().iter().all(|e| e.kind == EventKind::Division));
}

#[test]
fn thinning_sampler_runs_end_to_end() {
    let mut config = SimulationConfig::default();
    config.division = SamplerConfig::Thinning {
        intensity: IntensityConfig::PhaseShiftedSine { amplitude: 5.0, offset: 5.0 },
        gamma_max: 10.0,
        max_candidates: 10_000,
    };
    config.lifetime = SamplerConfig::Fixed { value: 1e4 };

    let mut sim = CellSimulation::from_config(&config, 17).unwrap();
    assert_eq!(sim.run(100).unwrap(), 100);
    assert_eq!(sim.population(), 101);
}

#[test]
fn nan_sampler_fails_the_run() {
    let factory = CellFactory::new(
        CellVariant::Normal,
        Box::new(FixedDuration(1.0)),
        Box::new(|time: f64, _rng: &mut StdRng| if time > 0.0 { f64::NAN } else { 5.0 }),
    );
    let mut sim = CellSimulation::new(factory, StdRng::seed_from_u64(0), true).unwrap();
    let err = sim.run(3).unwrap_err();
    assert!(matches!(err, SimulationError::SamplerContractViolation { .. }));
    assert!(sim.event_log().is_empty());
}

#[test]
fn batch_exposes_curves_per_run() {
    let mut config = SimulationConfig::default();
    config.run.runs = 8;
    config.run.steps = 30;
    let results = run_batch(&config, &AtomicBool::new(false));

    assert_eq!(results.completed.len(), 8);
    for (run_index, points) in results.curves() {
        let record = &results.completed[run_index as usize];
        assert_eq!(points.len(), record.events.len() + 1);
        assert_eq!(points[0], PopulationPoint::new(0.0, 1));
    }
}

#[test]
fn sampler_trait_objects_are_interchangeable() {
    let samplers: Vec<Box<dyn DurationSampler>> = vec![
        Box::new(FixedDuration(1.0)),
        branching_engine::build_sampler(&SamplerConfig::Gamma { shape: 2.0, scale: 0.5 }).unwrap(),
        branching_engine::build_sampler(&SamplerConfig::Sinusoidal { amplitude: 1.0, offset: 2.0 })
            .unwrap(),
    ];
    for division in samplers {
        let factory =
            CellFactory::new(CellVariant::Immortal, division, Box::new(FixedDuration(0.0)));
        let mut sim = CellSimulation::new(factory, StdRng::seed_from_u64(5), false).unwrap();
        assert_eq!(sim.run(10).unwrap(), 10);
        assert!(sim.dead_cells().is_empty());
    }
}
