use praxis_core::models::cost::ModelPricing;
use praxis_core::models::token_count::{TokenCount, TokenUsage};

/// Approximate list prices per million tokens, matched by model id substring.
/// First match wins.
const PRICING: &[(&str, ModelPricing)] = &[
    (
        "claude-opus-4",
        ModelPricing {
            input_per_million: 15.0,
            output_per_million: 75.0,
        },
    ),
    (
        "claude-sonnet-4",
        ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        },
    ),
    (
        "claude-haiku",
        ModelPricing {
            input_per_million: 0.80,
            output_per_million: 4.0,
        },
    ),
    (
        "nova-pro",
        ModelPricing {
            input_per_million: 0.80,
            output_per_million: 3.20,
        },
    ),
];

/// Token counts reported by a Converse response. Negative counts read as zero.
pub fn extract_token_usage(usage: &aws_sdk_bedrockruntime::types::TokenUsage) -> TokenCount {
    TokenCount {
        input: usage.input_tokens.max(0) as u64,
        output: usage.output_tokens.max(0) as u64,
    }
}

/// Cost for a token count. Unknown models are priced at zero.
pub fn usage_for(model_id: &str, tokens: TokenCount) -> TokenUsage {
    get_pricing(model_id)
        .map(|pricing| pricing.usage(tokens))
        .unwrap_or(TokenUsage {
            tokens,
            cost_usd: 0.0,
        })
}

pub fn get_pricing(model_id: &str) -> Option<ModelPricing> {
    PRICING
        .iter()
        .find(|(family, _)| model_id.contains(family))
        .map(|(_, pricing)| *pricing)
}
