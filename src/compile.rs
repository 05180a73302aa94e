use std::{
    fs,
    io::BufRead,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    str::FromStr,
};

use semver::Version;

use crate::{
    error::{Result, SolcError},
    remappings::Remapping,
    utils,
};

/// The name of the `solc` binary on the system
pub const SOLC: &str = "solc";

/// The name of the version manager binary on the system
pub const SOLC_SELECT: &str = "solc-select";

/// The combined-json selectors requested for every artifact
pub const COMBINED_JSON: &str = "abi,bin,bin-runtime,srcmap,srcmap-runtime,ast";

/// Abstraction over the `solc` command line utility and the `solc-select`
/// version manager that switches which version it runs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Solc {
    /// Path to the `solc` executable
    pub solc: PathBuf,
    /// Path to the `solc-select` executable
    pub solc_select: PathBuf,
}

impl Default for Solc {
    fn default() -> Self {
        let solc = std::env::var("SOLC_PATH").unwrap_or_else(|_| SOLC.to_string());
        Solc { solc: solc.into(), solc_select: SOLC_SELECT.into() }
    }
}

impl Solc {
    /// A new instance which points to `solc`
    pub fn new(solc: impl Into<PathBuf>) -> Self {
        Solc { solc: solc.into(), solc_select: SOLC_SELECT.into() }
    }

    /// Returns the version of the configured `solc`
    pub fn version(&self) -> Result<Version> {
        version_from_output(
            Command::new(&self.solc)
                .arg("--version")
                .stdin(Stdio::piped())
                .stderr(Stdio::piped())
                .stdout(Stdio::piped())
                .output()
                .map_err(|err| SolcError::io(err, &self.solc))?,
        )
    }

    /// Makes sure `solc` runs as the concrete version named by the given
    /// pragma text, switching via `solc-select` only when it differs from
    /// the version activated last.
    ///
    /// The switch is verified by re-reading `solc --version` rather than
    /// waiting for the version manager to settle. On a successful switch
    /// `active` is updated to the new version.
    pub fn ensure_version(&self, pragma: &str, active: &mut Option<Version>) -> Result<Version> {
        let clean = utils::clean_version(pragma).ok_or(SolcError::PragmaNotFound)?;
        let required = parse_lenient(clean)?;
        if active.as_ref() == Some(&required) {
            return Ok(required)
        }

        let wanted = required.to_string();
        if !self.run_solc_select(&["use", &wanted])? {
            // not installed yet
            tracing::info!("solc {wanted} not found, installing");
            self.run_solc_select(&["install", &wanted])?;
            if !self.run_solc_select(&["use", &wanted])? {
                return Err(SolcError::VersionNotFound(wanted))
            }
        }

        let reported = self.version()?;
        if (reported.major, reported.minor, reported.patch) !=
            (required.major, required.minor, required.patch)
        {
            // the switch may have moved `solc` off the previously active
            // version even though it did not land on the required one
            *active = None;
            return Err(SolcError::VersionNotFound(required.to_string()))
        }
        *active = Some(required.clone());
        Ok(required)
    }

    /// Compiles a single file in combined-json mode and writes whatever
    /// solc printed on stdout to the artifact path.
    ///
    /// The exit status is deliberately not inspected, matching the driver's
    /// best-effort behavior: a failed compile leaves an empty artifact,
    /// which a later run treats as not yet built. stderr is only surfaced
    /// in debug logs.
    pub fn compile_file(
        &self,
        file: &Path,
        remappings: &[Remapping],
        allowed_path: &Path,
        artifact: &Path,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.solc);
        cmd.arg("--combined-json").arg(COMBINED_JSON);
        for remapping in remappings {
            cmd.arg(remapping.to_string());
        }
        cmd.arg(file).arg("--allow-paths").arg(allowed_path);

        tracing::debug!("compiling {} with {:?}", file.display(), cmd);
        let output = cmd
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .stdout(Stdio::piped())
            .output()
            .map_err(|err| SolcError::io(err, &self.solc))?;
        if !output.stderr.is_empty() {
            tracing::debug!(
                "solc stderr for {}: {}",
                file.display(),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        fs::write(artifact, &output.stdout).map_err(|err| SolcError::io(err, artifact))?;
        Ok(())
    }

    /// Runs `solc-select` with the given args, returns whether it exited
    /// successfully.
    fn run_solc_select(&self, args: &[&str]) -> Result<bool> {
        let output = Command::new(&self.solc_select)
            .args(args)
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .stdout(Stdio::piped())
            .output()
            .map_err(|err| SolcError::io(err, &self.solc_select))?;
        if !output.status.success() {
            tracing::debug!(
                "solc-select {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(output.status.success())
    }
}

impl AsRef<Path> for Solc {
    fn as_ref(&self) -> &Path {
        &self.solc
    }
}

/// Parses a version that may omit the patch segment, `0.8` => `0.8.0`.
fn parse_lenient(version: &str) -> Result<Version> {
    let version = version.trim_end_matches('.');
    match Version::from_str(version) {
        Ok(version) => Ok(version),
        Err(err) => {
            if version.matches('.').count() == 1 {
                Ok(Version::from_str(&format!("{version}.0"))?)
            } else {
                Err(err.into())
            }
        }
    }
}

fn version_from_output(output: Output) -> Result<Version> {
    if output.status.success() {
        let version = output
            .stdout
            .lines()
            .last()
            .ok_or_else(|| SolcError::solc("version not found in solc output"))?
            .map_err(|err| SolcError::solc(err.to_string()))?;
        // NOTE: semver doesn't like `+` in g++ in build metadata which is invalid semver
        Ok(Version::from_str(&version.trim_start_matches("Version: ").replace(".g++", ".gcc"))?)
    } else {
        Err(SolcError::solc(String::from_utf8_lossy(&output.stderr).to_string()))
    }
}
