// ABOUTME: Invoke command implementation.
// ABOUTME: Calls a deployed function once and checks it against the configured expectation.

use super::single;
use bytes::Bytes;
use lamina::cloud::AwsCloud;
use lamina::config::Config;
use lamina::error::Result;
use lamina::invoke::LambdaInvoker;
use lamina::output::Output;
use std::path::Path;

pub async fn invoke(
    config: &Config,
    product: Option<&str>,
    qualifier: Option<&str>,
    payload: Option<&Path>,
    output: &mut Output,
) -> Result<()> {
    let entry = single(config, product)?;
    let function = entry.function_name();
    let qualifier = qualifier.unwrap_or(entry.alias.as_str());

    let payload_path = match payload {
        Some(path) => Some(path.to_path_buf()),
        None => entry.verify.payload.as_deref().map(|p| config.resolve_path(p)),
    };
    let payload = match payload_path {
        Some(ref path) => LambdaInvoker::<AwsCloud>::load_payload(path).await?,
        None => Bytes::from_static(b"{}"),
    };

    output.progress(&format!("  → Invoking {}:{}...", function, qualifier));

    let cloud = AwsCloud::from_env(config.region.clone()).await;
    let invoker = LambdaInvoker::new(&cloud);
    let result = invoker
        .invoke_and_verify(&function, qualifier, payload, &entry.verify.expect)
        .await?;

    output.success(&result.payload_text());
    Ok(())
}
