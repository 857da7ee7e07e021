//! Harmonic entropy fields and just-intonation chord enumeration, compiled
//! to WebAssembly for the chord-tetrahedron explorer.
//!
//! The numerical core lives in [`entropy_field`], [`chords`], [`ratio`] and
//! [`series`]; this module only adapts it to the JS boundary. "No data" is
//! always encoded as an empty buffer or array, never a thrown exception.

pub mod chords;
pub mod entropy_field;
pub mod ratio;
pub mod series;
pub mod utils;

use js_sys::Array;
use num_rational::Ratio;
use wasm_bindgen::prelude::*;

use crate::chords::LimitMode;
use crate::ratio::Complexity;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

/// Installs the panic hook on module load so panics surface in the browser
/// console instead of as opaque `unreachable` traps.
#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn equave_ratio(num: u32, den: u32) -> Option<Ratio<i64>> {
    if num == 0 || den == 0 {
        return None;
    }
    Some(Ratio::new(num as i64, den as i64))
}

/// Generates the 4-note harmonic-entropy field at the given grid resolution.
///
/// The equave crosses the boundary as an exact numerator/denominator pair
/// (typically 2/1). Returns a flat buffer holding four resolution³ volumes
/// back to back: `[c1 grid, c2 grid, c3 grid, entropy]`, each row-major (the
/// coordinate grids in logical c1,c2,c3 axis order; the entropy volume in
/// its (c3,c2,c1) storage order — see [`entropy_field::EntropyField`]).
/// Masked entropy cells are NaN. An empty buffer means the bounded search
/// produced no data, which callers must treat as a normal outcome.
#[wasm_bindgen(js_name = generateEntropyField)]
pub fn generate_entropy_field(equave_num: u32, equave_den: u32, resolution: usize) -> Vec<f64> {
    let Some(equave) = equave_ratio(equave_num, equave_den) else {
        return vec![];
    };
    match entropy_field::entropy_field(equave, resolution, &entropy_field::FieldParams::default())
    {
        Some(field) => {
            let mut out = Vec::with_capacity(4 * field.entropy.len());
            out.extend(field.c1.iter());
            out.extend(field.c2.iter());
            out.extend(field.c3.iter());
            out.extend(field.entropy.iter());
            out
        }
        None => {
            log("generateEntropyField: bounded quadruple search found no data");
            vec![]
        }
    }
}

/// Enumerates 4-note chords under a limit as a flat buffer of
/// `[c1, c2, c3, complexity]` per chord.
///
/// `limit_mode` is `"odd"` or `"integer"`; `complexity_measure` is one of
/// `"Tenney"`, `"Weil"`, `"Wilson"`, `"Gradus"` (anything else scores 0).
#[wasm_bindgen(js_name = generateLimitChordPoints)]
#[allow(clippy::too_many_arguments)]
pub fn generate_limit_chord_points(
    limit_value: u32,
    equave_num: u32,
    equave_den: u32,
    limit_mode: &str,
    complexity_measure: &str,
    hide_unison_voices: bool,
    omit_octaves: bool,
) -> Vec<f64> {
    let (Some(equave), Some(mode)) = (
        equave_ratio(equave_num, equave_den),
        LimitMode::from_name(limit_mode),
    ) else {
        return vec![];
    };
    let points = chords::limit_chord_points(
        limit_value as i64,
        equave,
        mode,
        Complexity::from_name(complexity_measure),
        hide_unison_voices,
        omit_octaves,
    );
    let mut out = Vec::with_capacity(points.len() * 4);
    for p in points {
        out.extend_from_slice(&p.cents);
        out.push(p.complexity);
    }
    out
}

/// Like [`generate_limit_chord_points`] but labelled: each element of the
/// returned array is `[c1, c2, c3, label, complexity]` with `label` an
/// ascending `"i:j:k:l"` string.
#[wasm_bindgen(js_name = generateLimitChordLabels)]
#[allow(clippy::too_many_arguments)]
pub fn generate_limit_chord_labels(
    limit_value: u32,
    equave_num: u32,
    equave_den: u32,
    limit_mode: &str,
    complexity_measure: &str,
    hide_unison_voices: bool,
    omit_octaves: bool,
) -> Array {
    let out = Array::new();
    let (Some(equave), Some(mode)) = (
        equave_ratio(equave_num, equave_den),
        LimitMode::from_name(limit_mode),
    ) else {
        return out;
    };
    let labelled = chords::limit_chord_labels(
        limit_value as i64,
        equave,
        mode,
        Complexity::from_name(complexity_measure),
        hide_unison_voices,
        omit_octaves,
    );
    for chord in labelled {
        let entry = Array::new();
        entry.push(&JsValue::from_f64(chord.cents[0]));
        entry.push(&JsValue::from_f64(chord.cents[1]));
        entry.push(&JsValue::from_f64(chord.cents[2]));
        entry.push(&JsValue::from_str(&chord.label));
        entry.push(&JsValue::from_f64(chord.complexity));
        out.push(&entry);
    }
    out
}

/// Enumerates JI triads under a limit. Each element of the returned array is
/// `[cx, cy, label]` where the cents pair is the lower two intervals of the
/// triad and `label` is the canonical ascending `"a:b:c"` form.
///
/// `limit_mode` adds `"prime"` here, which uses `prime_limit` and
/// `max_exponent` instead of `limit_value`.
#[wasm_bindgen(js_name = generateTriads)]
pub fn generate_triads(
    limit_value: i32,
    equave_num: u32,
    equave_den: u32,
    limit_mode: &str,
    prime_limit: u32,
    max_exponent: u32,
) -> Array {
    let out = Array::new();
    let (Some(equave), Some(mode)) = (
        equave_ratio(equave_num, equave_den),
        LimitMode::from_name(limit_mode),
    ) else {
        return out;
    };
    let triads = chords::ji_triads(
        limit_value as i64,
        equave,
        mode,
        prime_limit as i64,
        max_exponent,
    );
    for triad in triads {
        let entry = Array::new();
        entry.push(&JsValue::from_f64(triad.cents.0));
        entry.push(&JsValue::from_f64(triad.cents.1));
        entry.push(&JsValue::from_str(&triad.label));
        out.push(&entry);
    }
    out
}

/// Nearest step of an `edo`-tone equal temperament to `cents`. Returns
/// `[step, error]` where `step` is a display string and `error` is in cents.
#[wasm_bindgen(js_name = edoStep)]
pub fn edo_step(cents: f64, edo: u32) -> Array {
    if edo == 0 {
        return Array::new();
    }
    let (step, error) = series::edo_step(cents, edo);
    let out = Array::new();
    out.push(&JsValue::from_str(&step));
    out.push(&JsValue::from_f64(error));
    out
}

/// 12-EDO special case of [`edo_step`]: returns `[step, error]` as numbers.
#[wasm_bindgen(js_name = edo12Step)]
pub fn edo12_step(cents: f64) -> Vec<f64> {
    let (step, error) = series::edo12_step(cents);
    vec![step as f64, error]
}

/// Formats the isoharmonic series around `iso` with common difference
/// `fundamental` as a colon-separated segment (see
/// [`series::format_series_segment`]).
#[wasm_bindgen(js_name = isoSeriesSegment)]
pub fn iso_series_segment(
    fundamental_num: u32,
    fundamental_den: u32,
    iso_num: u32,
    iso_den: u32,
    partials_above: u32,
    partials_below: u32,
) -> String {
    if fundamental_den == 0 || iso_den == 0 {
        return String::new();
    }
    let fundamental = Ratio::new(fundamental_num as i64, fundamental_den as i64);
    let iso = Ratio::new(iso_num as i64, iso_den as i64);
    let series = series::iso_series(fundamental, iso, partials_above, partials_below);
    series::format_series_segment(&series)
}

/// `n/d` display form of the best rational approximation of `value`.
#[wasm_bindgen(js_name = simplifyRatio)]
pub fn simplify_ratio(value: f64) -> String {
    series::simplify_ratio(value)
}
