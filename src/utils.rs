pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    //
    // For more details see
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Size of one ratio in cents (1200 cents per doubling).
///
/// The ratio must be positive; every generator in this crate only produces
/// ratios of positive integers.
pub fn cents(ratio: f64) -> f64 {
    1200.0 * ratio.log2()
}

pub fn cents_to_hz(base: f64, cents: f64) -> f64 {
    base * 2.0f64.powf(cents / 1200.0)
}

pub fn hz_to_cents(base: f64, hz: f64) -> f64 {
    1200.0 * (hz / base).log2()
}
