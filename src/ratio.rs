//! Exact rational arithmetic and interval complexity norms.
//!
//! Everything downstream (chord enumeration, triad enumeration) scores
//! intervals through this module. Ratios are [`Ratio<i64>`] which is reduced
//! by construction, so the reduced-form invariant (denominator > 0, gcd = 1)
//! holds everywhere without re-normalization.

use num_integer::gcd;
use num_rational::Ratio;

/// Denominator cap used when recovering an exact ratio from a float.
///
/// Matches the reduction every norm applies before scoring: any float that
/// reaches a norm is first snapped to the best rational approximation with a
/// denominator no larger than this.
pub const MAX_REDUCE_DENOMINATOR: i64 = 10_000;

/// The available interval complexity norms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    /// log2(n·d)
    Tenney,
    /// log2(max(n, d))
    Weil,
    /// Sum of all prime factors (with multiplicity) of n and d.
    Wilson,
    /// (Sum of prime factors) − (count of prime factors) + 1.
    Gradus,
}

impl Complexity {
    /// Parses a measure name. Unknown names yield `None`, which callers score
    /// as 0 — an unrecognized measure is an explicit fallback, not an error.
    pub fn from_name(name: &str) -> Option<Complexity> {
        match name {
            "Tenney" => Some(Complexity::Tenney),
            "Weil" => Some(Complexity::Weil),
            "Wilson" => Some(Complexity::Wilson),
            "Gradus" => Some(Complexity::Gradus),
            _ => None,
        }
    }

    /// Complexity of a reduced ratio under this norm.
    ///
    /// A degenerate (zero-numerator) ratio scores the fallback value 1.0
    /// instead of feeding 0 to a logarithm.
    pub fn score(self, ratio: Ratio<i64>) -> f64 {
        let n = ratio.numer().abs();
        let d = *ratio.denom();
        if n == 0 {
            return 1.0;
        }
        match self {
            Complexity::Tenney => ((n * d) as f64).log2(),
            Complexity::Weil => (n.max(d) as f64).log2(),
            Complexity::Wilson => {
                let s: i64 = prime_factors(n).iter().sum::<i64>()
                    + prime_factors(d).iter().sum::<i64>();
                s as f64
            }
            Complexity::Gradus => {
                let fact_n = prime_factors(n);
                let fact_d = prime_factors(d);
                let s: i64 = fact_n.iter().sum::<i64>() + fact_d.iter().sum::<i64>();
                let count = (fact_n.len() + fact_d.len()) as i64;
                (s - count + 1) as f64
            }
        }
    }
}

/// Scores `ratio` under the measure named `measure`, 0.0 if unrecognized.
pub fn complexity(measure: &str, ratio: Ratio<i64>) -> f64 {
    Complexity::from_name(measure).map_or(0.0, |m| m.score(ratio))
}

/// Largest odd divisor of `n`; 0 maps to 0.
pub fn odd_part(mut n: i64) -> i64 {
    if n == 0 {
        return 0;
    }
    while n % 2 == 0 {
        n /= 2;
    }
    n
}

/// Odd limit of a ratio: the larger of the odd parts of numerator and
/// denominator after reduction. Degenerate (zero) ratios fail safe to 1.
pub fn odd_limit(ratio: Ratio<i64>) -> i64 {
    let n = ratio.numer().abs();
    if n == 0 {
        return 1;
    }
    odd_part(n).max(odd_part(*ratio.denom()))
}

/// Integer limit of a ratio: max(numerator, denominator) after reduction.
/// Degenerate (zero) ratios fail safe to 1.
pub fn integer_limit(ratio: Ratio<i64>) -> i64 {
    let n = ratio.numer().abs();
    if n == 0 {
        return 1;
    }
    n.max(*ratio.denom())
}

/// Ordered prime factors of `n` with multiplicity, by trial division.
pub fn prime_factors(mut n: i64) -> Vec<i64> {
    let mut factors = vec![];
    let mut d = 2;
    while d * d <= n {
        while n % d == 0 {
            factors.push(d);
            n /= d;
        }
        d += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// All primes ≤ `p`, ascending.
pub fn primes_up_to(p: i64) -> Vec<i64> {
    let mut primes = vec![];
    for num in 2..=p {
        let mut is_prime = true;
        let mut i = 2;
        while i * i <= num {
            if num % i == 0 {
                is_prime = false;
                break;
            }
            i += 1;
        }
        if is_prime {
            primes.push(num);
        }
    }
    primes
}

/// Largest exponent of any prime in `primes` dividing `n`.
///
/// Returns [`f64::INFINITY`] if a residual factor survives the given primes,
/// i.e. `n` is not smooth with respect to them. `primes` should come from
/// [`primes_up_to`] for the intended prime limit.
pub fn p_smooth_max_exponent(n: i64, primes: &[i64]) -> f64 {
    let mut max_exp = 0u32;
    let mut rest = n;
    for &p in primes {
        if rest == 1 {
            break;
        }
        if rest % p == 0 {
            let mut exp = 0u32;
            while rest % p == 0 {
                exp += 1;
                rest /= p;
            }
            max_exp = max_exp.max(exp);
        }
    }
    if rest > 1 {
        return f64::INFINITY;
    }
    max_exp as f64
}

/// Best rational approximation of `x` with denominator ≤
/// [`MAX_REDUCE_DENOMINATOR`], via continued-fraction convergents with a
/// final semiconvergent check.
///
/// Exact for every ratio of integers within the cap. Non-finite or
/// non-positive input fails safe to 1/1.
pub fn reduce_ratio(x: f64) -> Ratio<i64> {
    reduce_ratio_capped(x, MAX_REDUCE_DENOMINATOR)
}

pub fn reduce_ratio_capped(x: f64, max_den: i64) -> Ratio<i64> {
    if !x.is_finite() || x <= 0.0 || max_den < 1 {
        return Ratio::from_integer(1);
    }

    let (mut p0, mut q0, mut p1, mut q1) = (0i64, 1i64, 1i64, 0i64);
    let mut r = x;
    loop {
        let a = r.floor();
        if a >= (i64::MAX / (2 * max_den.max(1))) as f64 {
            break;
        }
        let a = a as i64;
        let q2 = q0 + a * q1;
        if q2 > max_den {
            break;
        }
        let p2 = p0 + a * p1;
        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;

        let frac = r - a as f64;
        // Remainder below float noise: p1/q1 is already exact.
        if frac < 1e-12 {
            return Ratio::new(p1, q1);
        }
        r = 1.0 / frac;
    }

    // Broke before the first convergent: x is astronomically large, round it.
    if q1 == 0 {
        return Ratio::from_integer(x as i64);
    }

    // Best semiconvergent under the cap vs. the last full convergent.
    let k = (max_den - q0) / q1;
    let semi = Ratio::new(p0 + k * p1, q0 + k * q1);
    let conv = Ratio::new(p1, q1);
    let err = |c: Ratio<i64>| (*c.numer() as f64 / *c.denom() as f64 - x).abs();
    if err(conv) <= err(semi) {
        conv
    } else {
        semi
    }
}

/// The ratio as a float, for cents conversion and display.
pub fn ratio_f64(r: Ratio<i64>) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

/// gcd of a slice, 0 for an empty slice.
pub fn fold_gcd(values: &[i64]) -> i64 {
    values.iter().fold(0, |acc, &v| gcd(acc, v))
}
