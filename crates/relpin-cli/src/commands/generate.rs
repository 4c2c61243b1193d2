use super::EXIT_SUCCESS;
use relpin_core::{CoreError, Engine, GenerateOptions};
use relpin_runtime::{HostConfig, OtpInstallation};
use std::path::Path;
use tracing::debug;

pub fn run(
    template: &Path,
    out: &Path,
    version_override: Option<String>,
) -> Result<u8, CoreError> {
    let config = HostConfig::load()?;
    debug!("host configuration: {config:?}");
    let engine = Engine::new(Box::new(OtpInstallation::new(config)));
    let result = engine.generate(template, out, &GenerateOptions { version_override })?;
    for dep in &result.report.unlisted_dependencies {
        debug!("{} needs {}, not in the release", dep.app, dep.dependency);
    }
    Ok(EXIT_SUCCESS)
}
