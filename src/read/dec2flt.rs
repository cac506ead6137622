use crate::scan::accumulate_digits;

/// Largest mantissa that converts to `f64` without rounding.
const MAX_EXACT_MANTISSA: u64 = 1 << 53;

/// Largest digit count whose value always fits in `u64`.
const MAX_FAST_DIGITS: usize = 19;

const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Float literal split into its cleaned parts: ASCII digits only, no
/// underscores, no sign characters.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Decimal<'t> {
    pub(crate) negative: bool,
    pub(crate) integer: &'t str,
    pub(crate) fraction: &'t str,
    pub(crate) exponent_negative: bool,
    pub(crate) exponent: &'t str,
}

impl Decimal<'_> {
    pub(crate) fn to_f64(self) -> Option<f64> {
        let magnitude = match self.fast_path() {
            Some(value) => value,
            None => self.slow_path()?,
        };
        Some(if self.negative { -magnitude } else { magnitude })
    }

    /// Clinger's fast path: an exactly representable mantissa scaled by an
    /// exactly representable power of ten rounds correctly in one operation.
    fn fast_path(self) -> Option<f64> {
        let integer = self.integer.trim_start_matches('0');
        if integer.len() + self.fraction.len() > MAX_FAST_DIGITS || self.exponent.len() > 4 {
            return None;
        }

        let mantissa = accumulate_digits(
            accumulate_digits(0, integer.as_bytes()),
            self.fraction.as_bytes(),
        );
        if mantissa == 0 {
            return Some(0.0);
        }
        if mantissa > MAX_EXACT_MANTISSA {
            return None;
        }

        let written = i64::try_from(accumulate_digits(0, self.exponent.as_bytes())).ok()?;
        let written = if self.exponent_negative { -written } else { written };
        let exponent = written - i64::try_from(self.fraction.len()).ok()?;

        #[allow(clippy::cast_precision_loss)]
        let mantissa = mantissa as f64;
        let scale = POW10.get(usize::try_from(exponent.unsigned_abs()).ok()?)?;
        Some(if exponent < 0 {
            mantissa / scale
        } else {
            mantissa * scale
        })
    }

    fn slow_path(self) -> Option<f64> {
        let mut buffer = String::with_capacity(
            self.integer.len() + self.fraction.len() + self.exponent.len() + 4,
        );
        buffer.push_str(if self.integer.is_empty() { "0" } else { self.integer });
        if !self.fraction.is_empty() {
            buffer.push('.');
            buffer.push_str(self.fraction);
        }
        if !self.exponent.is_empty() {
            buffer.push('e');
            if self.exponent_negative {
                buffer.push('-');
            }
            buffer.push_str(self.exponent);
        }
        lexical_core::parse::<f64>(buffer.as_bytes()).ok()
    }
}
