//! Isoharmonic series generation and EDO step mapping.
//!
//! Companions to the enumerators: these format and locate the chords the
//! rest of the crate discovers (nearest equal-temperament steps, arithmetic
//! series of ratios, canonical `a:b:c` segment strings).

use num_integer::lcm;
use num_rational::Ratio;

use crate::ratio::reduce_ratio;

/// Nearest step of an `edo`-tone equal temperament to a pitch at `cents`,
/// with the signed error (step position minus target) in cents.
pub fn edo_step(cents: f64, edo: u32) -> (String, f64) {
    let step_size = 1200.0 / edo as f64;
    let step = (cents / step_size).round_ties_even() as i64;
    let error = step as f64 * step_size - cents;
    (step.to_string(), error)
}

/// 12-EDO special case of [`edo_step`], keeping the raw step number.
pub fn edo12_step(cents: f64) -> (i64, f64) {
    let step = (cents / 100.0).round_ties_even() as i64;
    (step, step as f64 * 100.0 - cents)
}

/// Isoharmonic (arithmetic) series around `isoharmonic` with common
/// difference `fundamental`: `partials_below` terms downward, the
/// isoharmonic itself, then `partials_above` terms upward, ascending.
pub fn iso_series(
    fundamental: Ratio<i64>,
    isoharmonic: Ratio<i64>,
    partials_above: u32,
    partials_below: u32,
) -> Vec<Ratio<i64>> {
    let mut series = Vec::with_capacity((partials_above + partials_below + 1) as usize);
    let mut current = isoharmonic;
    for _ in 0..partials_below {
        current -= fundamental;
        series.insert(0, current);
    }
    series.push(isoharmonic);
    current = isoharmonic;
    for _ in 0..partials_above {
        current += fundamental;
        series.push(current);
    }
    series
}

/// Least common denominator of a set of denominators.
pub fn find_lcd(denominators: &[i64]) -> i64 {
    denominators.iter().fold(1, |acc, &d| lcm(acc, d))
}

/// Formats a ratio series as colon-separated integers over their least
/// common denominator: `4:5:6:7` when no scaling is needed, otherwise
/// `(4:5:6:7)/4`.
pub fn format_series_segment(series: &[Ratio<i64>]) -> String {
    if series.is_empty() {
        return String::new();
    }
    let denominators: Vec<i64> = series.iter().map(|r| *r.denom()).collect();
    let lcd = find_lcd(&denominators);
    let joined = series
        .iter()
        .map(|r| (*r.numer() * (lcd / *r.denom())).to_string())
        .collect::<Vec<_>>()
        .join(":");
    if lcd == 1 {
        joined
    } else {
        format!("({})/{}", joined, lcd)
    }
}

/// `n/d` display form of the best rational approximation of `value`.
pub fn simplify_ratio(value: f64) -> String {
    let r = reduce_ratio(value);
    format!("{}/{}", r.numer(), r.denom())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::cents;

    #[test]
    fn test_edo_steps() {
        let (step, error) = edo12_step(cents(1.5));
        assert_eq!(step, 7);
        assert!((error - (700.0 - cents(1.5))).abs() < 1e-9);

        let (step, error) = edo_step(386.3137, 31);
        assert_eq!(step, "10");
        assert!((error - (10.0 * 1200.0 / 31.0 - 386.3137)).abs() < 1e-9);

        let (step, _) = edo_step(-150.0, 12);
        assert_eq!(step, "-2");
    }

    #[test]
    fn test_iso_series() {
        let series = iso_series(Ratio::new(1, 4), Ratio::new(5, 4), 2, 1);
        assert_eq!(
            series,
            vec![
                Ratio::from_integer(1),
                Ratio::new(5, 4),
                Ratio::new(3, 2),
                Ratio::new(7, 4),
            ]
        );
    }

    #[test]
    fn test_format_series_segment() {
        let series = iso_series(Ratio::new(1, 4), Ratio::new(5, 4), 2, 1);
        assert_eq!(format_series_segment(&series), "(4:5:6:7)/4");

        let harmonics: Vec<Ratio<i64>> = (2..=4).map(Ratio::from_integer).collect();
        assert_eq!(format_series_segment(&harmonics), "2:3:4");
        assert_eq!(format_series_segment(&[]), "");
    }

    #[test]
    fn test_find_lcd() {
        assert_eq!(find_lcd(&[2, 3, 4]), 12);
        assert_eq!(find_lcd(&[1]), 1);
    }

    #[test]
    fn test_simplify_ratio() {
        assert_eq!(simplify_ratio(1.5), "3/2");
        assert_eq!(simplify_ratio(2.0), "2/1");
        assert_eq!(simplify_ratio(1.0 / 3.0), "1/3");
    }
}
