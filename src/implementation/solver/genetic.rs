// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The genetic back-end: a seeded evolutionary search over sets of pairwise
//! item-disjoint cycles, scored by the number of distinct participants they
//! cover. It comes with the usual machinery -- elitism, roulette selection,
//! conflict-avoiding crossover, add/remove mutation -- plus two safeguards
//! against premature convergence: the mutation rate escalates after a
//! stagnation window, and fresh chromosomes are injected whenever the
//! population diversity drops below a floor.
//!
//! The random source is owned by the solver and seeded from the
//! configuration: a fixed seed makes the whole search reproducible.

use std::time::Instant;

use fxhash::FxHashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::{
    Completion, Cycle, CycleEnumerator, Error, GeneticParams, Instance, ItemIdx, Selection,
    SolveContext, SolveStatus, Solver, SolverStats, UserIdx,
};

/// A chromosome: indices into the cycle pool, pairwise item-disjoint, in the
/// order they were appended.
type Chromosome = Vec<usize>;

pub struct GeneticSolver;

impl Solver for GeneticSolver {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn solve(&mut self, ctx: &SolveContext) -> Result<Completion, Error> {
        let start = Instant::now();
        let pool = CycleEnumerator::new(
            ctx.graph,
            ctx.instance,
            ctx.config.max_cycle_length,
            ctx.cutoff,
        )
        .materialise(None)?;

        let cycles = pool.cycles;
        if cycles.is_empty() {
            let status = if pool.cancelled {
                SolveStatus::Cancelled
            } else {
                SolveStatus::Feasible
            };
            return Ok(Completion::empty(status));
        }

        let mut rng = StdRng::seed_from_u64(ctx.config.seed);
        let mut search = Search::new(ctx.instance, &cycles, &ctx.config.genetic);
        let mut cancelled = pool.cancelled;

        let mut population = search.initial_population(search.params.population_size, &mut rng);
        let mut mutation_rate = search.params.mutation_rate;
        let mut stagnation = 0usize;

        for _generation in 0..search.params.generations {
            if ctx.cutoff.must_stop() {
                cancelled = true;
                break;
            }

            // rank the current population, remember the best ever
            population.sort_by_key(|chromosome| std::cmp::Reverse(search.fitness(chromosome)));
            if search.remember_best(&population[0]) {
                stagnation = 0;
            } else {
                stagnation += 1;
            }

            // elites survive untouched
            let mut next: Vec<Chromosome> = population
                .iter()
                .take(search.params.elite_size)
                .cloned()
                .collect();

            // breed the rest from roulette-selected parents
            let nb_parents =
                (search.params.population_size as f64 * search.params.crossover_rate) as usize;
            let parents = search.select_parents(&population, nb_parents, &mut rng);
            while next.len() < search.params.population_size {
                let (a, b) = pick_two(&parents, &mut rng);
                let mut child = search.crossover(a, b);
                search.mutate(&mut child, mutation_rate, &mut rng);
                next.push(child);
            }
            population = next;

            // stagnation escalates the mutation rate, up to the ceiling
            if stagnation > search.params.stagnation_window {
                mutation_rate = (mutation_rate * 1.5).min(search.params.mutation_ceiling);
                stagnation = 0;
            }

            // a population that collapsed onto a few individuals gets fresh
            // blood injected
            if search.diversity(&population) < search.params.diversity_floor {
                let injected = (search.params.population_size as f64
                    * search.params.injection_fraction) as usize;
                population.extend(search.initial_population(injected, &mut rng));
                population.truncate(search.params.population_size);
            }
        }

        // the last generation deserves its evaluation too
        for chromosome in &population {
            search.remember_best(chromosome);
        }

        let best = search.best.unwrap_or_default();
        let picked: Vec<Cycle> = best.iter().map(|c| cycles[*c].clone()).collect();
        let status = if cancelled {
            SolveStatus::Cancelled
        } else {
            SolveStatus::Feasible
        };
        Ok(Completion {
            status,
            selection: Selection::Cycles(picked),
            stats: SolverStats {
                cycles_found: cycles.len(),
                solver_time_seconds: start.elapsed().as_secs_f64(),
                ilp_num_variables: None,
                ilp_num_constraints: None,
                diagnostics: Vec::new(),
            },
        })
    }
}

/// The working state of one evolutionary search over a fixed cycle pool.
struct Search<'a> {
    params: &'a GeneticParams,
    /// per pool cycle, its items (borrowed from the pool)
    items: Vec<&'a [ItemIdx]>,
    /// per pool cycle, the distinct owners involved
    owners: Vec<Vec<UserIdx>>,
    /// per pool cycle, its sorted item list (the diversity fingerprint)
    fingerprint: Vec<Vec<usize>>,
    best: Option<Chromosome>,
    best_fitness: Option<usize>,
}

impl<'a> Search<'a> {
    fn new(instance: &Instance, cycles: &'a [Cycle], params: &'a GeneticParams) -> Self {
        let items: Vec<&[ItemIdx]> = cycles.iter().map(|c| c.items()).collect();
        let owners: Vec<Vec<UserIdx>> = cycles
            .iter()
            .map(|c| c.owners(instance).into_iter().collect())
            .collect();
        let fingerprint: Vec<Vec<usize>> = cycles
            .iter()
            .map(|c| {
                let mut sorted: Vec<usize> = c.items().iter().map(|it| it.id()).collect();
                sorted.sort_unstable();
                sorted
            })
            .collect();
        Search {
            params,
            items,
            owners,
            fingerprint,
            best: None,
            best_fitness: None,
        }
    }

    /// The number of distinct participants covered by a chromosome.
    fn fitness(&self, chromosome: &Chromosome) -> usize {
        let mut players = FxHashSet::default();
        for cycle in chromosome {
            players.extend(self.owners[*cycle].iter().copied());
        }
        players.len()
    }

    /// Updates the best-ever record; true on a strict improvement.
    fn remember_best(&mut self, chromosome: &Chromosome) -> bool {
        let fitness = self.fitness(chromosome);
        if self.best_fitness.map(|b| fitness > b).unwrap_or(true) {
            self.best_fitness = Some(fitness);
            self.best = Some(chromosome.clone());
            true
        } else {
            false
        }
    }

    /// Builds chromosomes by walking a freshly shuffled pool and keeping
    /// whatever does not conflict with what was already kept.
    fn initial_population(&self, count: usize, rng: &mut StdRng) -> Vec<Chromosome> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        let mut population = Vec::with_capacity(count);
        for _ in 0..count {
            order.shuffle(rng);
            let mut chromosome = Chromosome::new();
            let mut used = FxHashSet::default();
            for cycle in &order {
                if self.disjoint(*cycle, &used) {
                    used.extend(self.items[*cycle].iter().copied());
                    chromosome.push(*cycle);
                }
            }
            population.push(chromosome);
        }
        population
    }

    fn disjoint(&self, cycle: usize, used: &FxHashSet<ItemIdx>) -> bool {
        self.items[cycle].iter().all(|it| !used.contains(it))
    }

    /// Fitness-proportional (roulette) sampling with replacement; uniform
    /// sampling when every chromosome scores zero.
    fn select_parents(
        &self,
        population: &[Chromosome],
        count: usize,
        rng: &mut StdRng,
    ) -> Vec<Chromosome> {
        let weights: Vec<f64> = population
            .iter()
            .map(|c| self.fitness(c) as f64)
            .collect();
        let total: f64 = weights.iter().sum();
        let mut parents = Vec::with_capacity(count.max(2));
        for _ in 0..count.max(2) {
            let pick = if total == 0.0 {
                rng.gen_range(0..population.len())
            } else {
                let mut shot = rng.gen_range(0.0..total);
                let mut pick = population.len() - 1;
                for (i, w) in weights.iter().enumerate() {
                    if shot < *w {
                        pick = i;
                        break;
                    }
                    shot -= w;
                }
                pick
            };
            parents.push(population[pick].clone());
        }
        parents
    }

    /// Conflict-avoiding union: parent a's cycles first, then whatever of
    /// parent b still fits. The child is disjoint by construction.
    fn crossover(&self, a: &Chromosome, b: &Chromosome) -> Chromosome {
        let mut child = Chromosome::new();
        let mut used = FxHashSet::default();
        for cycle in a.iter().chain(b.iter()) {
            if self.disjoint(*cycle, &used) {
                used.extend(self.items[*cycle].iter().copied());
                child.push(*cycle);
            }
        }
        child
    }

    /// With probability `rate`, either grafts a random non-conflicting cycle
    /// from the pool onto the chromosome or drops a random one of its
    /// cycles. Both degenerate to a no-op when impossible.
    fn mutate(&self, chromosome: &mut Chromosome, rate: f64, rng: &mut StdRng) {
        if !rng.gen_bool(rate.clamp(0.0, 1.0)) {
            return;
        }
        if rng.gen_bool(0.5) {
            let mut used = FxHashSet::default();
            for cycle in chromosome.iter() {
                used.extend(self.items[*cycle].iter().copied());
            }
            let candidates: Vec<usize> = (0..self.items.len())
                .filter(|cycle| self.disjoint(*cycle, &used))
                .collect();
            if let Some(pick) = candidates.choose(rng) {
                chromosome.push(*pick);
            }
        } else if !chromosome.is_empty() {
            let victim = rng.gen_range(0..chromosome.len());
            chromosome.remove(victim);
        }
    }

    /// The fraction of distinct individuals in the population, two
    /// chromosomes being equal when they carry the same set of cycles
    /// (regardless of order).
    fn diversity(&self, population: &[Chromosome]) -> f64 {
        let mut distinct: FxHashSet<Vec<Vec<usize>>> = FxHashSet::default();
        for chromosome in population {
            let mut key: Vec<Vec<usize>> = chromosome
                .iter()
                .map(|cycle| self.fingerprint[*cycle].clone())
                .collect();
            key.sort_unstable();
            distinct.insert(key);
        }
        distinct.len() as f64 / population.len() as f64
    }
}

/// Two distinct picks from the parent pool, uniformly.
fn pick_two<'p>(parents: &'p [Chromosome], rng: &mut StdRng) -> (&'p Chromosome, &'p Chromosome) {
    let first = rng.gen_range(0..parents.len());
    let mut second = rng.gen_range(0..parents.len() - 1);
    if second >= first {
        second += 1;
    }
    (&parents[first], &parents[second])
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_genetic {
    use super::*;
    use crate::{
        normalise, NoCutoff, RawInstance, RawItem, RawUser, SolveConfig, SolveContext, WantGraph,
    };

    fn instance(wants: &[(&str, &[&str])]) -> crate::Instance {
        let mut raw = RawInstance::default();
        for (i, (item, list)) in wants.iter().enumerate() {
            let owner = format!("user{}", i);
            raw.items.insert(
                item.to_string(),
                RawItem {
                    owner: owner.clone(),
                    name: item.to_string(),
                },
            );
            let mut user = RawUser::default();
            user.offers.insert(
                item.to_string(),
                list.iter().map(|w| w.to_string()).collect(),
            );
            raw.users.insert(owner, user);
        }
        normalise(&raw).0
    }

    fn solve_with_seed(instance: &crate::Instance, seed: u64) -> Completion {
        let graph = WantGraph::build(instance);
        let mut config = SolveConfig::default();
        config.seed = seed;
        // a small search is plenty for these instances
        config.genetic.population_size = 20;
        config.genetic.generations = 30;
        let ctx = SolveContext {
            instance,
            graph: &graph,
            config: &config,
            cutoff: &NoCutoff,
        };
        GeneticSolver.solve(&ctx).unwrap()
    }

    #[test]
    fn finds_the_obvious_pairings() {
        let instance = instance(&[("a", &["b"]), ("b", &["a"]), ("c", &["d"]), ("d", &["c"])]);
        let completion = solve_with_seed(&instance, 42);
        assert_eq!(SolveStatus::Feasible, completion.status);
        match completion.selection {
            Selection::Cycles(cycles) => assert_eq!(2, cycles.len()),
            _ => panic!("genetic produces cycles"),
        }
    }

    #[test]
    fn is_deterministic_for_a_fixed_seed() {
        let instance = instance(&[
            ("a", &["b", "c"]),
            ("b", &["a", "c"]),
            ("c", &["a", "b"]),
            ("d", &["a"]),
        ]);
        let one = solve_with_seed(&instance, 7);
        let two = solve_with_seed(&instance, 7);
        assert_eq!(one.selection, two.selection);
    }

    #[test]
    fn an_instance_without_cycles_yields_nothing() {
        let instance = instance(&[("a", &["b"]), ("b", &[] as &[&str])]);
        let completion = solve_with_seed(&instance, 0);
        assert_eq!(0, completion.selection.nb_selected());
        assert_eq!(SolveStatus::Feasible, completion.status);
    }

    #[test]
    fn crossover_children_are_disjoint() {
        let instance = instance(&[("a", &["b"]), ("b", &["a", "c"]), ("c", &["b"])]);
        let graph = WantGraph::build(&instance);
        let pool = CycleEnumerator::new(&graph, &instance, 8, &NoCutoff)
            .materialise(None)
            .unwrap();
        let params = GeneticParams::default();
        let search = Search::new(&instance, &pool.cycles, &params);

        // both 2-cycles share item b: a child may only keep one of them
        let all: Chromosome = (0..pool.cycles.len()).collect();
        let child = search.crossover(&all, &all);
        assert_eq!(1, child.len());
    }
}
