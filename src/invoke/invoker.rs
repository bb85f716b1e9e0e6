// ABOUTME: LambdaInvoker loads verification payloads and invokes function versions.
// ABOUTME: Transport failures and behavioural mismatches are reported as distinct errors.

use bytes::Bytes;
use std::path::Path;

use super::error::InvokeError;
use super::expectation::Expectation;
use super::InvocationResult;
use crate::cloud::InvokeOps;
use crate::types::FunctionName;

/// Invokes functions through an [`InvokeOps`] client.
pub struct LambdaInvoker<'a, C: InvokeOps + ?Sized> {
    cloud: &'a C,
}

impl<'a, C: InvokeOps + ?Sized> LambdaInvoker<'a, C> {
    pub fn new(cloud: &'a C) -> Self {
        Self { cloud }
    }

    /// Read a payload file. Empty or whitespace-only files are rejected.
    pub async fn load_payload(path: &Path) -> Result<Bytes, InvokeError> {
        let contents =
            tokio::fs::read(path)
                .await
                .map_err(|e| InvokeError::PayloadUnreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;

        if contents.iter().all(u8::is_ascii_whitespace) {
            return Err(InvokeError::EmptyPayloadFile(path.to_path_buf()));
        }

        Ok(Bytes::from(contents))
    }

    /// Synchronously invoke `function` at `qualifier` (version number or alias).
    pub async fn invoke(
        &self,
        function: &FunctionName,
        qualifier: &str,
        payload: Bytes,
    ) -> Result<InvocationResult, InvokeError> {
        tracing::debug!(function = %function, qualifier, "invoking");

        let raw = self
            .cloud
            .invoke(function, qualifier, payload)
            .await
            .map_err(|e| InvokeError::InvokeLambdaFailed {
                function_name: function.to_string(),
                message: e.to_string(),
            })?;

        Ok(InvocationResult {
            function_name: function.to_string(),
            status_code: raw.status_code,
            payload: raw.payload,
            function_error: raw.function_error,
            executed_version: raw.executed_version,
        })
    }

    /// Judge a result against an expectation.
    pub fn verify(result: &InvocationResult, expectation: &Expectation) -> Result<(), InvokeError> {
        expectation
            .check(result)
            .map_err(|reason| InvokeError::VerificationFailed {
                function_name: result.function_name.clone(),
                reason,
            })
    }

    /// Invoke and verify in one step.
    pub async fn invoke_and_verify(
        &self,
        function: &FunctionName,
        qualifier: &str,
        payload: Bytes,
        expectation: &Expectation,
    ) -> Result<InvocationResult, InvokeError> {
        let result = self.invoke(function, qualifier, payload).await?;
        Self::verify(&result, expectation)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCloud;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn whitespace_payload_is_empty() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), " \n\t").unwrap();

        let err = LambdaInvoker::<FakeCloud>::load_payload(file.path())
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::EmptyPayloadFile(_)));
    }

    #[tokio::test]
    async fn missing_payload_is_unreadable() {
        let err = LambdaInvoker::<FakeCloud>::load_payload(Path::new("/nonexistent/payload.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::PayloadUnreadable { .. }));
    }

    #[tokio::test]
    async fn payload_is_returned_verbatim() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"ping":true}"#).unwrap();

        let payload = LambdaInvoker::<FakeCloud>::load_payload(file.path())
            .await
            .unwrap();
        assert_eq!(&payload[..], br#"{"ping":true}"#);
    }
}
