//! List prices for Groq-hosted models, in USD per token.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Input and output price per token. Unknown models are priced like the default 70B model.
pub fn model_cost(model: &str) -> (Decimal, Decimal) {
    match model {
        "llama3-8b-8192" | "llama-3.1-8b-instant" => (dec!(0.00000005), dec!(0.00000008)),
        "mixtral-8x7b-32768" => (dec!(0.00000024), dec!(0.00000024)),
        "gemma2-9b-it" => (dec!(0.0000002), dec!(0.0000002)),
        _ => (dec!(0.00000059), dec!(0.00000079)),
    }
}
