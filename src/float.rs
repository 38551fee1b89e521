/// The storage precision for one component of a pair.
///
/// The pair types exist to emulate roughly double precision out of
/// narrower components, so storage is fixed at `f32`; the splitting
/// constants elsewhere are derived from this type's mantissa width
/// rather than written out.
pub type Float = f32;

/// Bump a floating-point value up to the next greater representable
/// floating-point value.
pub fn next_float_up(v: Float) -> Float {
    if v.is_infinite() && v > 0.0 {
        return v;
    }
    let v = if v == -0.0 { 0.0 } else { v };
    let ui = v.to_bits();
    let ui = if v >= 0.0 { ui + 1 } else { ui - 1 };
    Float::from_bits(ui)
}

/// Bump a floating-point value down to the next smaller representable
/// floating-point value.
pub fn next_float_down(v: Float) -> Float {
    if v.is_infinite() && v < 0.0 {
        return v;
    }
    let v = if v == 0.0 { -0.0 } else { v };
    let ui = v.to_bits();
    let ui = if v > 0.0 { ui - 1 } else { ui + 1 };
    Float::from_bits(ui)
}

/// The distance from `|v|` to the next representable value above it.
///
/// This is the rounding unit that the pair types' non-overlapping
/// invariant is stated against: a normalized pair keeps its remainder
/// at or below one ulp of its value component.
pub fn ulp(v: Float) -> Float {
    let av = v.abs();
    next_float_up(av) - av
}
