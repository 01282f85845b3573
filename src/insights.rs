use serde::Serialize;
use serde_json::Value;

use crate::agent::{extract_json, AgentClient};
use crate::error::{Result, TallyError};
use crate::models::{InsightResponse, Transaction};
use crate::reports;

pub const NO_TRANSACTIONS_MESSAGE: &str = "No transactions to analyze. Add some transactions first.";
pub const REQUEST_FAILED_MESSAGE: &str = "Failed to get insights from the agent. Please try again.";
pub const PARSE_FAILED_MESSAGE: &str =
    "Could not understand the agent's response. Please try again.";

const RESPONSE_SCHEMA: &str = r#"{
  "result": {
    "categorized_transactions": [
      { "id": string, "description": string, "amount": number, "category": string, "suggested_category": string | null }
    ],
    "summary": {
      "total_income": number,
      "total_expenses": number,
      "net_balance": number,
      "savings_rate": number | null,
      "top_category": string | null
    },
    "insights": string,
    "tips": [string],
    "confidence": number,
    "metadata": object
  }
}"#;

#[derive(Serialize)]
struct PromptPayload<'a> {
    total_income: f64,
    total_expenses: f64,
    net_balance: f64,
    transaction_count: usize,
    transactions: &'a [Transaction],
}

/// Prompt asking the agent to analyze `transactions` and answer in the
/// `RESPONSE_SCHEMA` shape.
pub fn build_prompt(transactions: &[Transaction]) -> Result<String> {
    let totals = reports::totals(transactions);
    let payload = PromptPayload {
        total_income: totals.income,
        total_expenses: totals.expenses,
        net_balance: totals.net,
        transaction_count: transactions.len(),
        transactions,
    };
    let data = serde_json::to_string_pretty(&payload)?;

    Ok(format!(
        "You are a personal finance assistant. Analyze the following budget data. \
         Amounts are non-negative; the \"type\" field says whether each entry is income or an expense.\n\n\
         Transaction data:\n{data}\n\n\
         Check each transaction's category and suggest a better one where it fits poorly, \
         summarize income, expenses and savings, write a short narrative about spending \
         patterns, and give practical tips for saving money.\n\n\
         Respond with JSON only, no prose, using exactly this structure:\n{RESPONSE_SCHEMA}"
    ))
}

/// Pull an `InsightResponse` out of the extracted reply value. Requires a
/// `result` key.
pub fn parse_insights(value: Option<Value>) -> Result<InsightResponse> {
    let mut value = value.ok_or_else(|| {
        TallyError::UnparseableResponse("reply carried no JSON".to_string())
    })?;
    let result = value
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| TallyError::UnparseableResponse("reply has no `result` field".to_string()))?;
    serde_json::from_value(result).map_err(|e| TallyError::UnparseableResponse(e.to_string()))
}

/// Fixed banner text for a failed insights request.
pub fn user_message(err: &TallyError) -> &'static str {
    match err {
        TallyError::NoTransactions => NO_TRANSACTIONS_MESSAGE,
        TallyError::UnparseableResponse(_) => PARSE_FAILED_MESSAGE,
        _ => REQUEST_FAILED_MESSAGE,
    }
}

/// Request/loading/error state around one insights request at a time.
pub struct InsightsPanel<A> {
    agent: A,
    agent_id: String,
    loading: bool,
    error: Option<String>,
    insights: Option<InsightResponse>,
}

impl<A: AgentClient> InsightsPanel<A> {
    pub fn new(agent: A, agent_id: impl Into<String>) -> Self {
        Self {
            agent,
            agent_id: agent_id.into(),
            loading: false,
            error: None,
            insights: None,
        }
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn insights(&self) -> Option<&InsightResponse> {
        self.insights.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Ask the agent for insights on `transactions`. On failure the banner is
    /// set and previously shown insights are kept.
    pub async fn request(&mut self, transactions: &[Transaction]) -> Result<&InsightResponse> {
        if transactions.is_empty() {
            self.error = Some(NO_TRANSACTIONS_MESSAGE.to_string());
            return Err(TallyError::NoTransactions);
        }

        self.loading = true;
        self.error = None;
        let outcome = self.fetch(transactions).await;
        self.loading = false;

        match outcome {
            Ok(insights) => Ok(&*self.insights.insert(insights)),
            Err(e) => {
                log::warn!("insights request failed: {e}");
                self.error = Some(user_message(&e).to_string());
                Err(e)
            }
        }
    }

    async fn fetch(&self, transactions: &[Transaction]) -> Result<InsightResponse> {
        let prompt = build_prompt(transactions)?;
        let reply = self.agent.send(&self.agent_id, &prompt).await?;
        parse_insights(extract_json(&reply))
    }
}
