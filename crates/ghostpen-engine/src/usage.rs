use ghostpen_core::tokens::UsageCounters;
use ghostpen_llm::models::pricing_for;

/// Token totals across every model call in a session.
#[derive(Clone, Debug)]
pub struct UsageTracker {
    model: String,
    totals: UsageCounters,
    calls: u32,
}

impl UsageTracker {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            totals: UsageCounters::default(),
            calls: 0,
        }
    }

    pub fn record(&mut self, usage: &UsageCounters) {
        self.totals += *usage;
        self.calls += 1;
    }

    pub fn totals(&self) -> UsageCounters {
        self.totals
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// USD, priced on the session model (default row when unknown).
    pub fn cost(&self) -> f64 {
        pricing_for(&self.model).calculate_cost(&self.totals)
    }

    pub fn summary(&self) -> String {
        let t = &self.totals;
        format!(
            "Tokens: {} in, {} out, {} cache write, {} cache read ({} calls)\nCost: ${:.4}",
            t.input,
            t.output,
            t.cache_write,
            t.cache_read,
            self.calls,
            self.cost()
        )
    }
}
