use serde::{Deserialize, Serialize};

/// Node labels and relationship types the extractor is allowed to emit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schema {
    pub nodes: Vec<String>,
    pub relationships: Vec<String>,
}

const CLAIM_NODES: [&str; 21] = [
    "Claim",
    "Claim_Amount",
    "Loss_Payment",
    "Loss_Reserve",
    "Expense_Payment",
    "Expense_Reserve",
    "Claim_Coverage",
    "Policy_Coverage_Detail",
    "Policy",
    "Policy_Amount",
    "Agreement_Party_Role",
    "Premium",
    "Catastrophe",
    "in:Claim",
    "in:PolicyCoverageDetail",
    "in:Policy",
    "in:Catastrophe",
    "in:ExpensePayment",
    "in:ExpenseReserve",
    "in:LossPayment",
    "in:LossReserve",
];

const CLAIM_RELATIONSHIPS: [&str; 7] = [
    "in:against",
    "in:hasCatastrophe",
    "in:hasExpensePayment",
    "in:hasExpenseReserve",
    "in:hasLossPayment",
    "in:hasLossReserve",
    "in:hasPolicy",
];

impl Default for Schema {
    fn default() -> Self {
        Self::insurance_claims()
    }
}

impl Schema {
    pub fn new<N, R>(nodes: N, relationships: R) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            relationships: relationships.into_iter().map(Into::into).collect(),
        }
    }

    /// Claims-and-policies vocabulary, mixing SQL table names with `in:` ontology terms.
    pub fn insurance_claims() -> Self {
        Self::new(CLAIM_NODES, CLAIM_RELATIONSHIPS)
    }

    pub fn canonical_node(&self, label: &str) -> Option<&str> {
        canonical(&self.nodes, label)
    }

    pub fn canonical_relationship(&self, rel_type: &str) -> Option<&str> {
        canonical(&self.relationships, rel_type)
    }
}

fn canonical<'a>(allowed: &'a [String], candidate: &str) -> Option<&'a str> {
    let candidate = candidate.trim();
    allowed
        .iter()
        .find(|known| known.eq_ignore_ascii_case(candidate))
        .map(String::as_str)
}
