use burn::prelude::*;
use burn::tensor::{DType, Element, bf16, f16};

/// A small divisor offset for the float element of `B`, sitting half way (in log10)
/// between the type's epsilon and a value derived from its smallest exponent.
pub fn div_eps_f32<B: Backend>() -> f32 {
    match <B::FloatElem as Element>::dtype() {
        // 4.0693917e-16
        DType::F64 => eps_between(f64::MIN_EXP as f32, f64::EPSILON as f32),
        // 7.1209995e-4
        DType::F16 => eps_between(f16::MIN_EXP as f32, f16::EPSILON.to_f32()),
        // 2.0885676e-5
        DType::BF16 => eps_between(bf16::MIN_EXP as f32, bf16::EPSILON.to_f32()),
        // 8.1584695e-8
        _ => eps_between(f32::MIN_EXP as f32, f32::EPSILON),
    }
}

fn eps_between(min_exp: f32, epsilon: f32) -> f32 {
    let raw_exp = -(-min_exp * 2.3f32).powf(0.35f32);
    let eps_exp = epsilon.log10();
    10f32.powf((raw_exp + eps_exp) / 2f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_eps_is_tiny_but_positive() {
        let eps = div_eps_f32::<burn::backend::NdArray<f32>>();
        assert!(eps > 0.0);
        assert!((eps - 8.1584695e-8).abs() < 1e-10);
    }
}
