//! Prompt templates for the two model calls.
//!
//! The query prompt lists every collection with its fields so the model can
//! pick one; the summary prompt sees a single result document at a time.

use mongodb::bson::Document;

use crate::models::document_to_json;

/// One-shot example sent alongside every question
pub const ONE_SHOT_EXAMPLE: &str = "Q: Show top 5 accounts by limit.\nA: {\"collection\": \"accounts\", \"query\": [{ \"$sort\": { \"limit\": -1 } }, { \"$limit\": 5 }]}";

pub const QUERY_SYSTEM_PROMPT: &str = r#"You are a MongoDB AI assistant. Your task is to output ONLY a valid JSON object with:
{
  "collection": "<collection_name>",
  "query": [ aggregation_pipeline_array ]
}

Valid collections in the `sample_analytics` database:

1. `accounts`
   - `account_id` (int)
   - `limit` (number): amount of money in the account
   - `products` (array of strings): may include "InvestmentStock", "InvestmentFund", "Derivatives", "Commodity"
   - `customer_id` (string)

2. `customers`
   - `username` (string): register number
   - `name` (string)
   - `email` (string)
   - `birthdate` (date)
   - `address` (object): { "street": ..., "city": ..., "state": ..., "zip": ..., "country": ... }
   - `accounts` (array of account_ids)

3. `transactions`
   - `_id`
   - `account_id` (int)
   - `transaction_count` (int)
   - `bucket_start_date` (ISODate)
   - `bucket_end_date` (ISODate)
   - `transactions`: array of nested transactions (up to 66)

RULES:
- Only return a valid JSON object.
- Never return explanations or extra text.
- Do not wrap the JSON in markdown code fences.
- Use $match for filters like amount > 1000.
- Use numeric filters, not "$1000" strings.

Example:
Q: List all transactions above $1000
A:
{
  "collection": "transactions",
  "query": [
    { "$match": { "transactions.amount": { "$gt": 1000 } } }
  ]
}"#;

pub const SUMMARY_SYSTEM_PROMPT: &str = "You have a MongoDB question and its query output below. Convert the results into a simple natural language answer.\nOnly include the answer, nothing else.";

/// User turn for the query-generation call
pub fn query_user_prompt(question: &str, sample: &str) -> String {
    format!("Now answer:\nQuestion: {question}\nSample: {sample}")
}

/// User turn for summarizing one result document
pub fn summary_user_prompt(question: &str, document: &Document) -> String {
    let results = document_to_json(document);
    format!("Question: {question}\nQuery Output: {results}\nAnswer:")
}
