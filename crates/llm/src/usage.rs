//! Token usage accounting.
//!
//! Every generation call returns its own [`UsageStats`]. Aggregates across
//! calls live in a [`UsageLedger`], which is fed from those results and
//! guarded by a mutex; provider clients keep no per-call state.

use crate::types::ProviderName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Normalized token counts of a single generation call.
///
/// `total_tokens` is always `prompt_tokens + completion_tokens`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Tokens in the prompt
    pub prompt_tokens: u64,

    /// Tokens in the completion
    pub completion_tokens: u64,

    /// Prompt plus completion tokens
    pub total_tokens: u64,

    /// Tokens spent on internal reasoning
    pub reasoning_tokens: u64,
}

impl UsageStats {
    /// Create usage stats; the total is derived.
    pub fn new(prompt_tokens: u64, completion_tokens: u64, reasoning_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            reasoning_tokens,
        }
    }
}

/// Running totals for one provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    /// Successful calls recorded
    pub calls: u64,

    /// Calls whose provider reported no usage
    pub calls_without_usage: u64,

    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub reasoning_tokens: u64,

    /// Usage of the most recently recorded call
    pub last: Option<UsageStats>,
}

impl UsageTotals {
    fn add(&mut self, usage: Option<&UsageStats>) {
        self.calls += 1;
        match usage {
            Some(u) => {
                self.prompt_tokens = self.prompt_tokens.saturating_add(u.prompt_tokens);
                self.completion_tokens = self.completion_tokens.saturating_add(u.completion_tokens);
                self.total_tokens = self.total_tokens.saturating_add(u.total_tokens);
                self.reasoning_tokens = self.reasoning_tokens.saturating_add(u.reasoning_tokens);
                self.last = Some(*u);
            }
            None => self.calls_without_usage += 1,
        }
    }
}

/// Synchronized per-provider usage totals.
#[derive(Debug, Default)]
pub struct UsageLedger {
    totals: Mutex<HashMap<ProviderName, UsageTotals>>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the usage returned by one call.
    pub fn record(&self, provider: ProviderName, usage: Option<&UsageStats>) {
        self.lock().entry(provider).or_default().add(usage);
    }

    /// Totals for one provider.
    pub fn totals(&self, provider: ProviderName) -> UsageTotals {
        self.lock().get(&provider).copied().unwrap_or_default()
    }

    /// Totals for every provider that recorded a call.
    pub fn snapshot(&self) -> HashMap<ProviderName, UsageTotals> {
        self.lock().clone()
    }

    // The map stays consistent even if a holder panicked mid-update.
    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderName, UsageTotals>> {
        self.totals.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_usage_total_is_derived() {
        let usage = UsageStats::new(120, 30, 10);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.reasoning_tokens, 10);
    }

    #[test]
    fn test_large_counts_sum_exactly() {
        let prompt = u64::from(u32::MAX);
        let usage = UsageStats::new(prompt, 10, 0);
        assert_eq!(usage.total_tokens, prompt + 10);
    }

    #[test]
    fn test_usage_serializes_camel_case() {
        let value = serde_json::to_value(UsageStats::new(1, 2, 0)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "promptTokens": 1,
                "completionTokens": 2,
                "totalTokens": 3,
                "reasoningTokens": 0
            })
        );
    }

    #[test]
    fn test_ledger_accumulates_per_provider() {
        let ledger = UsageLedger::new();
        ledger.record(ProviderName::OpenAI, Some(&UsageStats::new(10, 5, 1)));
        ledger.record(ProviderName::OpenAI, Some(&UsageStats::new(20, 5, 0)));
        ledger.record(ProviderName::OpenAI, None);
        ledger.record(ProviderName::Gemini, Some(&UsageStats::new(7, 3, 0)));

        let openai = ledger.totals(ProviderName::OpenAI);
        assert_eq!(openai.calls, 3);
        assert_eq!(openai.calls_without_usage, 1);
        assert_eq!(openai.total_tokens, 40);
        assert_eq!(openai.reasoning_tokens, 1);
        assert_eq!(openai.last, Some(UsageStats::new(20, 5, 0)));

        assert_eq!(ledger.totals(ProviderName::Gemini).total_tokens, 10);
        assert_eq!(ledger.snapshot().len(), 2);
    }

    #[test]
    fn test_ledger_is_consistent_across_threads() {
        let ledger = Arc::new(UsageLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        ledger.record(ProviderName::OpenAI, Some(&UsageStats::new(1, 1, 0)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let totals = ledger.totals(ProviderName::OpenAI);
        assert_eq!(totals.calls, 800);
        assert_eq!(totals.total_tokens, 1600);
    }
}
