use praxis_bedrock::tokens::{get_pricing, usage_for};
use praxis_core::models::token_count::TokenCount;

#[test]
fn known_models_are_priced() {
    let pricing = get_pricing("us.anthropic.claude-sonnet-4-20250514-v1:0").unwrap();
    assert_eq!(pricing.input_per_million, 3.0);

    let usage = usage_for(
        "us.anthropic.claude-sonnet-4-20250514-v1:0",
        TokenCount {
            input: 1_000_000,
            output: 100_000,
        },
    );
    assert!((usage.cost_usd - 4.5).abs() < 1e-9);
}

#[test]
fn unknown_models_cost_nothing() {
    assert!(get_pricing("meta.llama3").is_none());
    let usage = usage_for(
        "meta.llama3",
        TokenCount {
            input: 10,
            output: 10,
        },
    );
    assert_eq!(usage.cost_usd, 0.0);
    assert_eq!(usage.tokens.total(), 20);
}
