// ABOUTME: Post-deploy invocation of a function version and judgement of its response.
// ABOUTME: Exposes LambdaInvoker, Expectation, and the invocation result type.

mod error;
mod expectation;
mod invoker;

pub use error::InvokeError;
pub use expectation::{Expectation, PayloadExpectation, StatusRange};
pub use invoker::LambdaInvoker;

use bytes::Bytes;
use serde::Serialize;

/// Response of one synchronous invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub function_name: String,
    pub status_code: i32,
    #[serde(serialize_with = "serialize_payload")]
    pub payload: Bytes,
    pub function_error: Option<String>,
    pub executed_version: Option<String>,
}

impl InvocationResult {
    /// Payload as text, replacing invalid UTF-8.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

fn serialize_payload<S>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(payload))
}
