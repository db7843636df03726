use super::{Storage, StorageKind};
use crate::error::Result;
use crate::record::UsageRecord;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Summed token counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTotals {
    /// Number of recorded calls
    pub calls: u64,
    /// Prompt tokens
    pub input_tokens: u64,
    /// Completion tokens
    pub output_tokens: u64,
}

impl UsageTotals {
    /// Input plus output tokens
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    fn accumulate(&mut self, record: &UsageRecord) {
        self.calls += 1;
        self.input_tokens += record.input_tokens;
        self.output_tokens += record.output_tokens;
    }
}

/// Token usage log of one identity
#[derive(Debug)]
pub struct Usage(Storage<UsageRecord>);

impl StorageKind for Usage {
    const SCOPE: &'static str = "usage";
    type Record = UsageRecord;

    fn from_storage(storage: Storage<UsageRecord>) -> Self {
        Self(storage)
    }

    fn storage(&self) -> &Storage<UsageRecord> {
        &self.0
    }

    fn storage_mut(&mut self) -> &mut Storage<UsageRecord> {
        &mut self.0
    }
}

impl Deref for Usage {
    type Target = Storage<UsageRecord>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Usage {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Usage {
    /// Record one model call
    pub async fn record(
        &mut self,
        model: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<()> {
        self.0
            .add(UsageRecord::new(model, input_tokens, output_tokens))
            .await
    }

    /// Totals across every model
    pub async fn totals(&mut self) -> Result<UsageTotals> {
        let mut totals = UsageTotals::default();
        for record in self.0.items().await? {
            totals.accumulate(record);
        }
        Ok(totals)
    }

    /// Prompt tokens across every model
    pub async fn total_input_tokens(&mut self) -> Result<u64> {
        Ok(self.totals().await?.input_tokens)
    }

    /// Completion tokens across every model
    pub async fn total_output_tokens(&mut self) -> Result<u64> {
        Ok(self.totals().await?.output_tokens)
    }

    /// Totals per model, sorted by model name
    pub async fn totals_by_model(&mut self) -> Result<BTreeMap<String, UsageTotals>> {
        let mut by_model: BTreeMap<String, UsageTotals> = BTreeMap::new();
        for record in self.0.items().await? {
            by_model
                .entry(record.model.clone())
                .or_default()
                .accumulate(record);
        }
        Ok(by_model)
    }
}
