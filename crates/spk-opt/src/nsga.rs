//! NSGA-II multi-objective optimizer with constraint dominance.
//!
//! Determinism is a contract: all random draws happen sequentially on one
//! seeded ChaCha stream, candidate evaluation is pure and collected in
//! candidate order, and every tie-break falls back to the candidate index.
//! Two runs with the same seed and inputs produce bit-identical fronts,
//! independent of worker count.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::objective::EvaluationContext;

/// Algorithm settings. The distribution indices follow Deb's reference
/// values (η_c ≈ 15, η_m ≈ 20).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsgaConfig {
    pub population: usize,
    pub generations: usize,
    pub seed: u64,
    pub crossover_prob: f64,
    pub crossover_eta: f64,
    pub mutation_eta: f64,
    /// Per-gene mutation probability; `None` = 1/dimension.
    pub mutation_prob: Option<f64>,
    /// How many designs to report in `top` (by crowding).
    pub top_n: usize,
    /// When set (two objectives only), stop once the hypervolume of the
    /// first front changes less than this for three generations running.
    pub hypervolume_tol: Option<f64>,
}

impl NsgaConfig {
    pub fn new(population: usize, generations: usize, seed: u64) -> Self {
        Self {
            population,
            generations,
            seed,
            crossover_prob: 0.9,
            crossover_eta: 15.0,
            mutation_eta: 20.0,
            mutation_prob: None,
            top_n: 10,
            hypervolume_tol: None,
        }
    }
}

/// One evaluated candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// Position in the unit hypercube.
    pub x: Vec<f64>,
    pub objectives: Vec<f64>,
    pub violations: Vec<f64>,
    pub total_violation: f64,
}

impl Design {
    pub fn feasible(&self) -> bool {
        self.total_violation == 0.0
    }
}

/// Run metadata returned alongside the front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeMeta {
    pub algorithm: &'static str,
    pub seed: u64,
    pub n_evaluations: usize,
    pub generations_run: usize,
    /// False when the run was cancelled before the generation budget.
    pub completed: bool,
}

/// Final population, ranked.
#[derive(Debug, Clone)]
pub struct OptimizeResult {
    /// The first non-dominated front.
    pub front: Vec<Design>,
    /// Best `top_n` designs by (rank, crowding).
    pub top: Vec<Design>,
    pub meta: OptimizeMeta,
}

/// Constraint-dominance (Deb 2002): feasible beats infeasible, less-violating
/// beats more-violating, and two feasible designs compare by Pareto
/// dominance.
pub fn constraint_dominates(a: &Design, b: &Design) -> bool {
    match (a.feasible(), b.feasible()) {
        (true, false) => true,
        (false, true) => false,
        (false, false) => a.total_violation < b.total_violation,
        (true, true) => {
            let mut strictly_better = false;
            for (x, y) in a.objectives.iter().zip(&b.objectives) {
                if x > y {
                    return false;
                }
                if x < y {
                    strictly_better = true;
                }
            }
            strictly_better
        }
    }
}

/// Fast non-dominated sort; returns fronts as index lists in stable order.
pub fn fast_non_dominated_sort(designs: &[Design]) -> Vec<Vec<usize>> {
    let n = designs.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut first = Vec::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if constraint_dominates(&designs[i], &designs[j]) {
                dominated_by[i].push(j);
            } else if constraint_dominates(&designs[j], &designs[i]) {
                domination_count[i] += 1;
            }
        }
        if domination_count[i] == 0 {
            first.push(i);
        }
    }

    fronts.push(first);
    let mut f = 0;
    while !fronts[f].is_empty() {
        let mut next = Vec::new();
        for &i in &fronts[f] {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        f += 1;
        fronts.push(next);
    }
    fronts.pop();
    fronts
}

/// Crowding distance of every member of one front (parallel array to
/// `front`). Boundary members get +∞; objectives whose range is zero or
/// unbounded contribute nothing, so no NaN can appear.
pub fn crowding_distance(designs: &[Design], front: &[usize]) -> Vec<f64> {
    let n = front.len();
    let mut distance = vec![0.0f64; n];
    if n == 0 {
        return distance;
    }
    let n_obj = designs[front[0]].objectives.len();

    for m in 0..n_obj {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            designs[front[a]].objectives[m]
                .partial_cmp(&designs[front[b]].objectives[m])
                .unwrap()
                .then(front[a].cmp(&front[b]))
        });
        distance[order[0]] = f64::INFINITY;
        distance[order[n - 1]] = f64::INFINITY;
        let lo = designs[front[order[0]]].objectives[m];
        let hi = designs[front[order[n - 1]]].objectives[m];
        let range = hi - lo;
        if !range.is_finite() || range <= 0.0 {
            continue;
        }
        for w in 1..n - 1 {
            let prev = designs[front[order[w - 1]]].objectives[m];
            let next = designs[front[order[w + 1]]].objectives[m];
            distance[order[w]] += (next - prev) / range;
        }
    }
    distance
}

/// Hypervolume of a two-objective front w.r.t. a reference point (both
/// objectives minimized; points beyond the reference are ignored).
pub fn hypervolume_2d(points: &[(f64, f64)], reference: (f64, f64)) -> f64 {
    let mut pts: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|p| p.0 < reference.0 && p.1 < reference.1 && p.0.is_finite() && p.1.is_finite())
        .collect();
    pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    let mut hv = 0.0;
    let mut prev_y = reference.1;
    for (x, y) in pts {
        if y < prev_y {
            hv += (reference.0 - x) * (prev_y - y);
            prev_y = y;
        }
    }
    hv
}

struct Ranked {
    design: Design,
    rank: usize,
    crowding: f64,
}

/// Rank a population and annotate crowding distances. Returns individuals
/// ordered front by front (stable within a front).
fn rank_population(designs: Vec<Design>) -> Vec<Ranked> {
    let fronts = fast_non_dominated_sort(&designs);
    let mut crowding = vec![0.0f64; designs.len()];
    for front in &fronts {
        let d = crowding_distance(&designs, front);
        for (slot, &idx) in front.iter().enumerate() {
            crowding[idx] = d[slot];
        }
    }
    let mut rank = vec![0usize; designs.len()];
    for (r, front) in fronts.iter().enumerate() {
        for &idx in front {
            rank[idx] = r;
        }
    }
    let mut out: Vec<Ranked> = designs
        .into_iter()
        .enumerate()
        .map(|(i, design)| Ranked {
            design,
            rank: rank[i],
            crowding: crowding[i],
        })
        .collect();
    // Stable: (rank asc, crowding desc, original order).
    let mut order: Vec<usize> = (0..out.len()).collect();
    order.sort_by(|&a, &b| {
        out[a]
            .rank
            .cmp(&out[b].rank)
            .then(out[b].crowding.partial_cmp(&out[a].crowding).unwrap())
            .then(a.cmp(&b))
    });
    let mut reordered = Vec::with_capacity(out.len());
    for &i in &order {
        reordered.push(Ranked {
            design: out[i].design.clone(),
            rank: out[i].rank,
            crowding: out[i].crowding,
        });
    }
    reordered
}

fn tournament<'a>(parents: &'a [Ranked], rng: &mut ChaCha8Rng) -> &'a Ranked {
    let i = rng.gen_range(0..parents.len());
    let j = rng.gen_range(0..parents.len());
    let (a, b) = (&parents[i], &parents[j]);
    if a.rank != b.rank {
        if a.rank < b.rank {
            a
        } else {
            b
        }
    } else if a.crowding >= b.crowding {
        a
    } else {
        b
    }
}

/// Simulated binary crossover (SBX) on the unit hypercube.
fn sbx(
    p1: &[f64],
    p2: &[f64],
    eta: f64,
    prob: f64,
    rng: &mut ChaCha8Rng,
) -> (Vec<f64>, Vec<f64>) {
    let mut c1 = p1.to_vec();
    let mut c2 = p2.to_vec();
    if rng.gen::<f64>() > prob {
        return (c1, c2);
    }
    for g in 0..p1.len() {
        if rng.gen::<f64>() > 0.5 {
            continue;
        }
        let (y1, y2) = (p1[g], p2[g]);
        if (y1 - y2).abs() < 1e-14 {
            continue;
        }
        let u: f64 = rng.gen();
        let beta = if u <= 0.5 {
            (2.0 * u).powf(1.0 / (eta + 1.0))
        } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
        };
        c1[g] = (0.5 * ((1.0 + beta) * y1 + (1.0 - beta) * y2)).clamp(0.0, 1.0);
        c2[g] = (0.5 * ((1.0 - beta) * y1 + (1.0 + beta) * y2)).clamp(0.0, 1.0);
    }
    (c1, c2)
}

/// Polynomial mutation on the unit hypercube.
fn polynomial_mutation(x: &mut [f64], eta: f64, prob: f64, rng: &mut ChaCha8Rng) {
    for g in x.iter_mut() {
        if rng.gen::<f64>() > prob {
            continue;
        }
        let u: f64 = rng.gen();
        let delta = if u < 0.5 {
            (2.0 * u).powf(1.0 / (eta + 1.0)) - 1.0
        } else {
            1.0 - (2.0 * (1.0 - u)).powf(1.0 / (eta + 1.0))
        };
        *g = (*g + delta).clamp(0.0, 1.0);
    }
}

/// Run NSGA-II. Evaluations inside one generation execute in parallel;
/// sorting and selection are sequential. A cancel flag is observed between
/// generations and yields a partial result (`completed = false`).
pub fn optimize(
    ctx: &EvaluationContext,
    cfg: &NsgaConfig,
    cancel: Option<&AtomicBool>,
) -> OptimizeResult {
    let dim = ctx.space.dimension();
    let mutation_prob = cfg.mutation_prob.unwrap_or(1.0 / dim as f64);
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let mut n_evaluations = 0usize;

    // Seed population.
    let xs: Vec<Vec<f64>> = (0..cfg.population)
        .map(|_| (0..dim).map(|_| rng.gen::<f64>()).collect())
        .collect();
    let mut parents = rank_population(evaluate_batch(ctx, xs, &mut n_evaluations));

    let mut completed = true;
    let mut generations_run = 0usize;
    let mut hv_prev: Option<f64> = None;
    let mut hv_reference: Option<(f64, f64)> = None;
    let mut hv_stall = 0usize;

    for gen in 0..cfg.generations {
        if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
            completed = false;
            break;
        }

        // Breed the child population sequentially (single RNG stream).
        let mut child_xs: Vec<Vec<f64>> = Vec::with_capacity(cfg.population);
        while child_xs.len() < cfg.population {
            let p1 = tournament(&parents, &mut rng);
            let p2 = tournament(&parents, &mut rng);
            let (mut c1, mut c2) =
                sbx(&p1.design.x, &p2.design.x, cfg.crossover_eta, cfg.crossover_prob, &mut rng);
            polynomial_mutation(&mut c1, cfg.mutation_eta, mutation_prob, &mut rng);
            polynomial_mutation(&mut c2, cfg.mutation_eta, mutation_prob, &mut rng);
            child_xs.push(c1);
            if child_xs.len() < cfg.population {
                child_xs.push(c2);
            }
        }

        let children = evaluate_batch(ctx, child_xs, &mut n_evaluations);

        // Union in canonical order: parents first, children after.
        let mut union: Vec<Design> = parents.into_iter().map(|r| r.design).collect();
        union.extend(children);
        let ranked = rank_population(union);
        parents = ranked.into_iter().take(cfg.population).collect();
        generations_run = gen + 1;

        let best_rank0 = parents.iter().filter(|r| r.rank == 0).count();
        debug!(
            "generation {generations_run}: front size {best_rank0}, evaluations {n_evaluations}"
        );

        // Optional hypervolume convergence check (two objectives).
        if let Some(tol) = cfg.hypervolume_tol {
            if ctx.objectives.len() == 2 {
                let pts: Vec<(f64, f64)> = parents
                    .iter()
                    .filter(|r| r.rank == 0 && r.design.feasible())
                    .map(|r| (r.design.objectives[0], r.design.objectives[1]))
                    .filter(|p| p.0.is_finite() && p.1.is_finite())
                    .collect();
                if pts.is_empty() {
                    continue;
                }
                let reference = *hv_reference.get_or_insert_with(|| {
                    let mx = pts.iter().fold((f64::MIN, f64::MIN), |a, p| {
                        (a.0.max(p.0), a.1.max(p.1))
                    });
                    (mx.0 * 1.1 + 1e-9, mx.1 * 1.1 + 1e-9)
                });
                let hv = hypervolume_2d(&pts, reference);
                if let Some(prev) = hv_prev {
                    if (hv - prev).abs() < tol {
                        hv_stall += 1;
                    } else {
                        hv_stall = 0;
                    }
                }
                hv_prev = Some(hv);
                if hv_stall >= 3 {
                    debug!("hypervolume converged after {generations_run} generations");
                    break;
                }
            }
        }
    }

    let front: Vec<Design> = parents
        .iter()
        .filter(|r| r.rank == 0)
        .map(|r| r.design.clone())
        .collect();
    let top: Vec<Design> = parents
        .iter()
        .take(cfg.top_n)
        .map(|r| r.design.clone())
        .collect();

    OptimizeResult {
        front,
        top,
        meta: OptimizeMeta {
            algorithm: "NSGA-II",
            seed: cfg.seed,
            n_evaluations,
            generations_run,
            completed,
        },
    }
}

/// Evaluate a batch of candidates in parallel, preserving candidate order
/// so reductions stay canonical.
fn evaluate_batch(
    ctx: &EvaluationContext,
    xs: Vec<Vec<f64>>,
    n_evaluations: &mut usize,
) -> Vec<Design> {
    *n_evaluations += xs.len();
    xs.into_par_iter()
        .map(|x| {
            let e = ctx.evaluate(&x);
            Design {
                x,
                objectives: e.objectives,
                violations: e.violations,
                total_violation: e.total_violation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(objectives: Vec<f64>, violation: f64) -> Design {
        Design {
            x: vec![0.0],
            objectives,
            violations: vec![],
            total_violation: violation,
        }
    }

    #[test]
    fn test_constraint_dominance_rules() {
        let feasible = design(vec![5.0, 5.0], 0.0);
        let infeasible = design(vec![1.0, 1.0], 0.3);
        let worse_infeasible = design(vec![0.0, 0.0], 0.9);
        assert!(constraint_dominates(&feasible, &infeasible));
        assert!(!constraint_dominates(&infeasible, &feasible));
        assert!(constraint_dominates(&infeasible, &worse_infeasible));

        let better = design(vec![1.0, 2.0], 0.0);
        let worse = design(vec![2.0, 2.0], 0.0);
        let traded = design(vec![0.5, 3.0], 0.0);
        assert!(constraint_dominates(&better, &worse));
        assert!(!constraint_dominates(&better, &traded));
        assert!(!constraint_dominates(&traded, &better));
    }

    #[test]
    fn test_non_dominated_sort_fronts() {
        let pop = vec![
            design(vec![1.0, 4.0], 0.0), // front 0
            design(vec![2.0, 2.0], 0.0), // front 0
            design(vec![4.0, 1.0], 0.0), // front 0
            design(vec![3.0, 3.0], 0.0), // dominated by (2,2)
            design(vec![5.0, 5.0], 0.0), // dominated by everything
            design(vec![0.0, 0.0], 0.7), // infeasible, last
        ];
        let fronts = fast_non_dominated_sort(&pop);
        assert_eq!(fronts[0], vec![0, 1, 2]);
        assert_eq!(fronts[1], vec![3]);
        assert_eq!(fronts[2], vec![4]);
        assert_eq!(fronts[3], vec![5]);
    }

    #[test]
    fn test_crowding_boundaries_are_infinite() {
        let pop = vec![
            design(vec![1.0, 4.0], 0.0),
            design(vec![2.0, 2.0], 0.0),
            design(vec![4.0, 1.0], 0.0),
        ];
        let front = vec![0, 1, 2];
        let d = crowding_distance(&pop, &front);
        assert!(d[0].is_infinite());
        assert!(d[2].is_infinite());
        assert!(d[1].is_finite() && d[1] > 0.0);
    }

    #[test]
    fn test_hypervolume_2d() {
        let hv = hypervolume_2d(&[(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)], (4.0, 4.0));
        // Rectangles: (4−1)(4−3) + (4−2)(3−2) + (4−3)(2−1) = 3 + 2 + 1.
        assert!((hv - 6.0).abs() < 1e-12, "hv = {hv}");
        assert_eq!(hypervolume_2d(&[], (1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_sbx_and_mutation_stay_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let p1 = vec![0.1, 0.9, 0.5];
        let p2 = vec![0.8, 0.2, 0.5];
        for _ in 0..200 {
            let (mut c1, c2) = sbx(&p1, &p2, 15.0, 0.9, &mut rng);
            polynomial_mutation(&mut c1, 20.0, 0.5, &mut rng);
            for v in c1.iter().chain(&c2) {
                assert!((0.0..=1.0).contains(v), "out of bounds: {v}");
            }
        }
    }
}
