//! Serve Command
//!
//! Usage:
//!   autodoc serve [--host <addr>] [--port <port>]

use std::path::Path;

use super::{load_config, pipeline_with, runtime};
use crate::ai::{LlmProvider, create_provider};
use crate::cli::Output;
use crate::server::DocServer;
use crate::types::Result;

pub fn run(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    out: &Output,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let provider = create_provider(&config.llm)?;
    let rt = runtime()?;

    out.header("autodoc server");
    out.field("model", &config.llm.model);
    out.field("data", &config.pipeline.data_dir.display().to_string());
    out.field(
        "socket",
        &format!("ws://{}:{}/ws/generate", config.server.host, config.server.port),
    );
    report_health(provider.as_ref(), &rt.block_on(provider.health_check()), out);

    let pipeline = pipeline_with(provider, &config);
    rt.block_on(DocServer::new(config.server, pipeline).serve())?;
    out.info("Server stopped");
    Ok(())
}

/// An unreachable model does not stop the server; runs will record the failure
fn report_health(provider: &dyn LlmProvider, health: &Result<bool>, out: &Output) {
    match health {
        Ok(true) => out.success(&format!("{} reachable", provider.name())),
        Ok(false) => out.warning(&format!("{} did not answer the health check", provider.name())),
        Err(e) => out.warning(&format!("{} health check failed: {}", provider.name(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::scripted::ScriptedProvider;
    use crate::types::DocError;

    #[tokio::test]
    async fn test_health_outcomes_do_not_abort() {
        let provider = ScriptedProvider::new();
        let out = Output::new(true);

        let health = provider.health_check().await;
        assert!(matches!(health, Ok(true)));
        report_health(&provider, &health, &out);
        report_health(&provider, &Err(DocError::LlmApi("refused".into())), &out);
    }
}
