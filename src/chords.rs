//! Just-intonation chord and triad enumeration under combinatorial limit
//! constraints.
//!
//! The 4-note enumerators walk combinations-with-replacement of the valid
//! number set and emit interval-space points (and optionally `i:j:k:l`
//! labels); the triad enumerator rebuilds a valid-interval set by brute-force
//! ratio scanning and dedups geometric duplicates through a canonical integer
//! label. None of these ever fail: an empty search space yields an empty
//! result.

use std::collections::BTreeSet;

use itertools::Itertools;
use num_rational::Ratio;
use rapidhash::RapidHashSet;

use crate::ratio::{
    fold_gcd, integer_limit, odd_limit, odd_part, p_smooth_max_exponent, primes_up_to, ratio_f64,
    Complexity,
};
use crate::utils::cents;

/// Which predicate admits an integer (or ratio) into the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitMode {
    Odd,
    Integer,
    Prime,
}

impl LimitMode {
    pub fn from_name(name: &str) -> Option<LimitMode> {
        match name {
            "odd" => Some(LimitMode::Odd),
            "integer" => Some(LimitMode::Integer),
            "prime" => Some(LimitMode::Prime),
            _ => None,
        }
    }
}

/// The set of integers admissible under `limit_value` in the given mode.
///
/// Odd mode scans `1..=max(2·limit, 100)`. That cutoff is a search-bound
/// assumption, not a proof: integers beyond it cannot satisfy the odd-limit
/// predicate for the ranges this crate is used with, but nothing here
/// verifies that. Integer mode is simply `1..=limit`. Prime mode has no
/// valid-number notion, so it yields the empty set and the chord enumerators
/// built on it return nothing.
pub fn valid_numbers(limit_value: i64, mode: LimitMode) -> BTreeSet<i64> {
    let mut valid = BTreeSet::new();
    match mode {
        LimitMode::Odd => {
            let max_num_to_check = (limit_value * 2).max(100);
            for num in 1..=max_num_to_check {
                if odd_part(num) <= limit_value {
                    valid.insert(num);
                }
            }
        }
        LimitMode::Integer => {
            valid.extend(1..=limit_value);
        }
        LimitMode::Prime => {}
    }
    valid
}

/// How the octave-omission filter decides two voices form an octave.
///
/// The two chord enumerators intentionally use different tests and must keep
/// doing so: the points enumerator treats any power-of-two ratio as an octave
/// (float log2-closeness), while the label enumerator only rejects exact
/// doublings. `octave_omission_rules_differ_between_call_sites` pins the
/// difference.
#[derive(Debug, Clone, Copy)]
enum OctaveTest {
    /// log2 of the voice ratio is within relative tolerance 1e-9 of an
    /// integer, so 4/1, 8/1, ... count as octaves too.
    LogClose,
    /// Exact integer doubling only.
    Doubling,
}

fn has_octave(combo: &[i64], test: OctaveTest) -> bool {
    for a_idx in 0..combo.len() {
        for b_idx in (a_idx + 1)..combo.len() {
            let (a, b) = (combo[a_idx], combo[b_idx]);
            match test {
                OctaveTest::LogClose => {
                    let ratio = b as f64 / a as f64;
                    if ratio > 1.0 {
                        let log = ratio.log2();
                        let nearest = log.round();
                        if (log - nearest).abs() <= 1e-9 * log.abs().max(nearest.abs()) {
                            return true;
                        }
                    }
                }
                OctaveTest::Doubling => {
                    if b == a * 2 {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// One enumerated 4-note chord as a point in interval space.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordPoint {
    /// Consecutive interval sizes (c1, c2, c3) in cents.
    pub cents: [f64; 3],
    pub complexity: f64,
}

/// One enumerated 4-note chord with its `i:j:k:l` label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledChord {
    pub cents: [f64; 3],
    /// Ascending colon-joined integers, group-coprime.
    pub label: String,
    pub complexity: f64,
}

/// Shared filter/scoring pipeline of the two 4-note chord enumerators.
///
/// Yields accepted quadruples with their interval cents and the max
/// complexity over the three consecutive reduced ratios.
#[allow(clippy::too_many_arguments)]
fn enumerate_chords(
    limit_value: i64,
    equave: Ratio<i64>,
    mode: LimitMode,
    measure: Option<Complexity>,
    hide_unison_voices: bool,
    omit_octaves: bool,
    octave_test: OctaveTest,
) -> Vec<([i64; 4], [f64; 3], f64)> {
    let valid = valid_numbers(limit_value, mode);
    if valid.is_empty() {
        return vec![];
    }
    let sorted: Vec<i64> = valid.into_iter().collect();

    let mut out = vec![];
    for combo in sorted.iter().copied().combinations_with_replacement(4) {
        // Input is sorted ascending, so duplicates are adjacent.
        if hide_unison_voices && combo.windows(2).any(|w| w[0] == w[1]) {
            continue;
        }
        if omit_octaves && has_octave(&combo, octave_test) {
            continue;
        }

        let (i, j, k, l) = (combo[0], combo[1], combo[2], combo[3]);

        // Chord must fit inside one equave span.
        if Ratio::new(l, i) > equave {
            continue;
        }
        // Non-primitive quadruples are duplicates of a simpler chord.
        if fold_gcd(&[i, j, k, l]) != 1 {
            continue;
        }
        if mode == LimitMode::Odd
            && (odd_limit(Ratio::new(j, i)) > limit_value
                || odd_limit(Ratio::new(k, j)) > limit_value
                || odd_limit(Ratio::new(l, k)) > limit_value)
        {
            continue;
        }

        let interval_cents = [
            cents(j as f64 / i as f64),
            cents(k as f64 / j as f64),
            cents(l as f64 / k as f64),
        ];
        let score = |n: i64, d: i64| measure.map_or(0.0, |m| m.score(Ratio::new(n, d)));
        let complexity = score(j, i).max(score(k, j)).max(score(l, k));

        out.push(([i, j, k, l], interval_cents, complexity));
    }
    out
}

/// Enumerates 4-note chords under the limit as bare interval-space points.
pub fn limit_chord_points(
    limit_value: i64,
    equave: Ratio<i64>,
    mode: LimitMode,
    measure: Option<Complexity>,
    hide_unison_voices: bool,
    omit_octaves: bool,
) -> Vec<ChordPoint> {
    enumerate_chords(
        limit_value,
        equave,
        mode,
        measure,
        hide_unison_voices,
        omit_octaves,
        OctaveTest::LogClose,
    )
    .into_iter()
    .map(|(_, cents, complexity)| ChordPoint { cents, complexity })
    .collect()
}

/// Enumerates 4-note chords under the limit, labelled `i:j:k:l`.
pub fn limit_chord_labels(
    limit_value: i64,
    equave: Ratio<i64>,
    mode: LimitMode,
    measure: Option<Complexity>,
    hide_unison_voices: bool,
    omit_octaves: bool,
) -> Vec<LabeledChord> {
    enumerate_chords(
        limit_value,
        equave,
        mode,
        measure,
        hide_unison_voices,
        omit_octaves,
        OctaveTest::Doubling,
    )
    .into_iter()
    .map(|([i, j, k, l], cents, complexity)| LabeledChord {
        cents,
        label: format!("{}:{}:{}:{}", i, j, k, l),
        complexity,
    })
    .collect()
}

/// One enumerated JI triad.
#[derive(Debug, Clone, PartialEq)]
pub struct Triad {
    /// The two lower interval sizes in cents.
    pub cents: (f64, f64),
    /// Canonical `a:b:c` form: gcd-reduced, ascending.
    pub label: String,
}

/// Enumerates JI triads whose three pairwise intervals all satisfy the limit
/// predicate and whose span stays within the equave.
///
/// The valid-interval set is rebuilt by brute-force scanning all (n, d)
/// ratio candidates up to a mode-dependent bound (odd/integer: 3·limit,
/// prime: 3·prime_limit·max_exponent — a heuristic bound, not a proof). The
/// set construction is isolated here so a number-theoretic generator can
/// replace it later without touching the pairing/dedup logic below.
pub fn ji_triads(
    limit_value: i64,
    equave: Ratio<i64>,
    mode: LimitMode,
    prime_limit: i64,
    max_exponent: u32,
) -> Vec<Triad> {
    if limit_value < 1 && mode != LimitMode::Prime {
        return vec![];
    }

    let primes = match mode {
        LimitMode::Prime => primes_up_to(prime_limit),
        _ => vec![],
    };
    let admissible = |r: Ratio<i64>| -> bool {
        match mode {
            LimitMode::Odd => odd_limit(r) <= limit_value,
            LimitMode::Integer => integer_limit(r) <= limit_value,
            LimitMode::Prime => {
                p_smooth_max_exponent(*r.numer(), &primes) <= max_exponent as f64
                    && p_smooth_max_exponent(*r.denom(), &primes) <= max_exponent as f64
            }
        }
    };

    let scan_bound = match mode {
        LimitMode::Odd | LimitMode::Integer => limit_value * 3,
        LimitMode::Prime => prime_limit * max_exponent as i64 * 3,
    };

    let mut valid: BTreeSet<Ratio<i64>> = BTreeSet::new();
    valid.insert(Ratio::from_integer(1));
    for n in 1..=scan_bound {
        for d in 1..=scan_bound {
            let r = Ratio::new(n, d);
            if admissible(r) {
                valid.insert(r);
            }
        }
    }
    // The equave itself is always a candidate interval.
    if admissible(equave) {
        valid.insert(equave);
    }

    let sorted: Vec<Ratio<i64>> = valid.into_iter().collect();
    let equave_cents = cents(ratio_f64(equave));

    let unison = Ratio::from_integer(1);
    let mut triads = vec![];
    let mut seen_labels: RapidHashSet<String> = RapidHashSet::default();

    for (idx, &r1) in sorted.iter().enumerate() {
        for &r2 in &sorted[idx..] {
            // Third interval closing the triad: r1 then r3 stacks up to r2.
            let r3 = r2 / r1;
            if !admissible(r3) {
                continue;
            }
            if r1 < unison || r3 < unison {
                continue;
            }

            let cx = cents(ratio_f64(r1));
            let cy = cents(ratio_f64(r3));
            if cx + cy > equave_cents + 1e-9 {
                continue;
            }

            // Canonical integer form over the pair's common denominator.
            // Different (r1, r2) pairs can map to the same triad shape, so
            // dedup on the reduced ascending label.
            let a = r1.denom() * r2.denom();
            let b = r1.numer() * r2.denom();
            let c = r2.numer() * r1.denom();
            let g = fold_gcd(&[a, b, c]);
            let mut reduced = [a / g, b / g, c / g];
            reduced.sort_unstable();
            let label = format!("{}:{}:{}", reduced[0], reduced[1], reduced[2]);

            if seen_labels.insert(label.clone()) {
                triads.push(Triad {
                    cents: (cx, cy),
                    label,
                });
            }
        }
    }
    triads
}
