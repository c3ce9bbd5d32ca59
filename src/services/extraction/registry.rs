//! Rule Registry
//!
//! Ordered, statically built list of extraction rules. Patches are folded in
//! registration order, so a later rule overrides an earlier one on any field
//! both report.

use std::sync::Arc;

use crate::domain::ports::ExtractionRule;

use super::rules::{
    BoundsRule, BranchCountRule, ComponentCountRule, DeepestBranchRule, ErrorMarkerRule,
    LpTimeRule, PricingRule, RootSetsRule, RootValueRule, RuntimeRule, SinglePricingRule,
    SolutionRule, WarningMarkerRule,
};

/// Registry of extraction rules in evaluation order.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn ExtractionRule>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The full rule set for the coloring solver's log format.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(RuntimeRule)
            .register(BoundsRule)
            .register(SolutionRule)
            .register(ComponentCountRule)
            .register(ErrorMarkerRule)
            .register(WarningMarkerRule)
            .register(BranchCountRule)
            .register(DeepestBranchRule)
            .register(RootValueRule)
            .register(RootSetsRule)
            .register(PricingRule)
            .register(SinglePricingRule)
            .register(LpTimeRule);
        registry
    }

    /// Append a rule; it runs after every rule already registered.
    pub fn register(&mut self, rule: impl ExtractionRule + 'static) -> &mut Self {
        tracing::trace!(rule = rule.name(), "registering extraction rule");
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ExtractionRule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
