use ghostpen_core::tokens::UsageCounters;

/// Pricing for a Claude model, in USD per million tokens.
#[derive(Clone, Debug)]
pub struct ClaudeModelInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub input_cost_per_mtok: f64,
    pub output_cost_per_mtok: f64,
    pub cache_read_cost_per_mtok: f64,
    pub cache_write_cost_per_mtok: f64,
}

impl ClaudeModelInfo {
    pub fn calculate_cost(&self, usage: &UsageCounters) -> f64 {
        (usage.input as f64 * self.input_cost_per_mtok
            + usage.cache_write as f64 * self.cache_write_cost_per_mtok
            + usage.cache_read as f64 * self.cache_read_cost_per_mtok
            + usage.output as f64 * self.output_cost_per_mtok)
            / 1_000_000.0
    }
}

pub static CLAUDE_SONNET_4_20250514: ClaudeModelInfo = ClaudeModelInfo {
    name: "claude-sonnet-4-20250514",
    display_name: "Claude Sonnet 4",
    input_cost_per_mtok: 3.0,
    output_cost_per_mtok: 15.0,
    cache_read_cost_per_mtok: 0.30,
    cache_write_cost_per_mtok: 3.75,
};

pub static CLAUDE_SONNET_4: ClaudeModelInfo = ClaudeModelInfo {
    name: "claude-sonnet-4",
    display_name: "Claude Sonnet 4 (alias)",
    input_cost_per_mtok: 3.0,
    output_cost_per_mtok: 15.0,
    cache_read_cost_per_mtok: 0.30,
    cache_write_cost_per_mtok: 3.75,
};

pub static CLAUDE_HAIKU_4_5: ClaudeModelInfo = ClaudeModelInfo {
    name: "claude-haiku-4-5",
    display_name: "Claude Haiku 4.5",
    input_cost_per_mtok: 1.0,
    output_cost_per_mtok: 5.0,
    cache_read_cost_per_mtok: 0.10,
    cache_write_cost_per_mtok: 1.25,
};

pub static CLAUDE_OPUS_4_6: ClaudeModelInfo = ClaudeModelInfo {
    name: "claude-opus-4-6",
    display_name: "Claude Opus 4.6",
    input_cost_per_mtok: 5.0,
    output_cost_per_mtok: 25.0,
    cache_read_cost_per_mtok: 0.50,
    cache_write_cost_per_mtok: 6.25,
};

static ALL_MODELS: &[&ClaudeModelInfo] = &[
    &CLAUDE_SONNET_4_20250514,
    &CLAUDE_SONNET_4,
    &CLAUDE_HAIKU_4_5,
    &CLAUDE_OPUS_4_6,
];

pub fn find_model(name: &str) -> Option<&'static ClaudeModelInfo> {
    ALL_MODELS.iter().find(|m| m.name == name).copied()
}

/// Default model and fallback price row.
pub fn default_model() -> &'static ClaudeModelInfo {
    &CLAUDE_SONNET_4_20250514
}

/// Price row for `name`, degrading to the default row for unknown models.
pub fn pricing_for(name: &str) -> &'static ClaudeModelInfo {
    find_model(name).unwrap_or_else(default_model)
}

pub fn all_models() -> &'static [&'static ClaudeModelInfo] {
    ALL_MODELS
}
