use mongodb::bson::{Bson, Document};
use serde_json::Value;

use crate::error::{NlqError, Result};
use crate::models::GeneratedQuery;

/// Parse model output into a [`GeneratedQuery`].
///
/// The text must be exactly one JSON object with a string `collection` and an
/// array `query` whose stages are objects. Anything else, including prose
/// around otherwise valid JSON, is a [`NlqError::Parse`] that keeps the raw
/// text. Stages are converted as extended JSON, so `{"$date": ...}` and
/// `{"$oid": ...}` values reach the database typed. A malformed extended JSON
/// value (say a `$date` that is not RFC 3339) is a parse error too, and the
/// pipeline is never sent.
pub fn parse_generated_query(raw: &str) -> Result<GeneratedQuery> {
    let fail = |reason: String| NlqError::Parse {
        raw: raw.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| fail(e.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(fail("expected a JSON object".to_string()));
    };

    let collection = match object.remove("collection") {
        Some(Value::String(name)) => name,
        Some(_) => return Err(fail("`collection` must be a string".to_string())),
        None => return Err(fail("missing key `collection`".to_string())),
    };

    let stages = match object.remove("query") {
        Some(Value::Array(stages)) => stages,
        Some(_) => return Err(fail("`query` must be an array".to_string())),
        None => return Err(fail("missing key `query`".to_string())),
    };

    let pipeline = stages
        .into_iter()
        .enumerate()
        .map(|(i, stage)| match Bson::try_from(stage) {
            Ok(Bson::Document(doc)) => Ok(doc),
            Ok(_) => Err(fail(format!("stage {i} is not an object"))),
            Err(e) => Err(fail(format!("stage {i}: {e}"))),
        })
        .collect::<Result<Vec<Document>>>()?;

    Ok(GeneratedQuery {
        collection,
        pipeline,
    })
}
