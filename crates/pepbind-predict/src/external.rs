//! External command-line predictors (NetMHC family).
//!
//! The tool is given a temporary file with one peptide per line and is
//! expected to print whitespace-separated rows `peptide strength [percentile]`
//! on stdout, one per input peptide, in input order. Blank lines, `#`
//! comments and rows that do not start with a peptide and a number (headers,
//! banners) are ignored.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use pepbind_common::{Allele, BindError, BindRecord, Method, Peptide, Result};

use crate::dispatch::FixedLengthPredictor;
use crate::predictor::check_batch;

/// Argument template used when none is configured.
pub const DEFAULT_ARGS: [&str; 6] = ["-a", "{allele}", "-l", "{length}", "-f", "{input}"];

/// Peptide lengths accepted when none are configured.
pub const DEFAULT_LENGTHS: [usize; 4] = [8, 9, 10, 11];

/// Wrapper for a third-party predictor executable.
#[derive(Debug, Clone)]
pub struct CommandPredictor {
    method: Method,
    executable: PathBuf,
    args: Vec<String>,
    lengths: BTreeSet<usize>,
}

impl CommandPredictor {
    pub fn new<P: AsRef<Path>>(method: Method, executable: P) -> Self {
        Self {
            method,
            executable: executable.as_ref().to_path_buf(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            lengths: DEFAULT_LENGTHS.into_iter().collect(),
        }
    }

    /// Replace the argument template. `{allele}`, `{length}` and `{input}`
    /// are substituted per invocation.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_lengths<I: IntoIterator<Item = usize>>(mut self, lengths: I) -> Self {
        self.lengths = lengths.into_iter().collect();
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn render_args(&self, allele: &Allele, length: usize, input: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        self.args
            .iter()
            .map(|a| {
                a.replace("{allele}", allele.name())
                    .replace("{length}", &length.to_string())
                    .replace("{input}", &input)
            })
            .collect()
    }

    fn failed(&self, allele: &Allele, reason: impl Into<String>) -> BindError {
        BindError::PredictorFailed {
            method: self.method,
            allele: allele.to_string(),
            reason: reason.into(),
        }
    }
}

impl FixedLengthPredictor for CommandPredictor {
    fn method(&self) -> Method {
        self.method
    }

    fn is_installed(&self) -> bool {
        resolve_executable(&self.executable).is_some()
    }

    fn supports_length(&self, length: usize) -> bool {
        self.lengths.contains(&length)
    }

    fn predict_uniform(
        &self,
        allele: &Allele,
        length: usize,
        peptides: &[Peptide],
    ) -> Result<Vec<BindRecord>> {
        let mut input = tempfile::Builder::new()
            .prefix("pepbind-")
            .suffix(".pep")
            .tempfile()?;
        for peptide in peptides {
            writeln!(input, "{}", peptide)?;
        }
        input.flush()?;

        let args = self.render_args(allele, length, input.path());
        info!(
            method = %self.method,
            %allele,
            length,
            n = peptides.len(),
            "Running {:?}",
            self.executable
        );

        let output = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|e| self.failed(allele, format!("could not start {:?}: {}", self.executable, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(allele, format!("exited with {}: {}", output.status, stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = parse_rows(&stdout)?;
        debug!(method = %self.method, parsed = records.len(), "Parsed predictor output");

        check_batch(self.method, allele, peptides, &records)?;
        Ok(records)
    }
}

/// Parse `peptide strength [percentile]` rows, skipping anything else.
fn parse_rows(stdout: &str) -> Result<Vec<BindRecord>> {
    let mut records = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(seq), Some(strength)) = (fields.next(), fields.next()) else {
            continue;
        };
        let (Ok(peptide), Ok(strength)) = (Peptide::new(seq), strength.parse::<f64>()) else {
            continue;
        };
        let percentile = fields.next().and_then(|f| f.parse::<f64>().ok());

        records.push(BindRecord::new(peptide, strength, percentile)?);
    }
    Ok(records)
}

/// Locate an executable given as a path or a bare name on `PATH`.
fn resolve_executable(executable: &Path) -> Option<PathBuf> {
    if executable.components().count() > 1 || executable.is_absolute() {
        return executable.is_file().then(|| executable.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(executable))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_rows_skips_noise() {
        let stdout = "\
# netMHCpan version 4.1
Peptide   Affinity(nM)  %Rank

GILGFVFTL 12.3 0.05
SIINFEKL  5012.0
-----------------------------
";
        let records = parse_rows(stdout).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].peptide().as_str(), "GILGFVFTL");
        assert_eq!(records[0].percentile(), Some(0.05));
        assert_eq!(records[1].strength(), 5012.0);
        assert_eq!(records[1].percentile(), None);
    }

    #[test]
    fn test_parse_rows_rejects_invalid_values() {
        // A row that parses but carries an impossible strength fails the batch
        assert!(parse_rows("GILGFVFTL -3.0 0.5\n").is_err());
    }

    #[test]
    fn test_render_args_substitutes_placeholders() {
        let p = CommandPredictor::new(Method::NetMhc, "netMHC");
        let allele = Allele::new("HLA-A*02:01").unwrap();
        let args = p.render_args(&allele, 9, Path::new("/tmp/in.pep"));
        assert_eq!(args, vec!["-a", "HLA-A*02:01", "-l", "9", "-f", "/tmp/in.pep"]);
    }

    #[test]
    fn test_missing_executable_is_not_installed() {
        let p = CommandPredictor::new(Method::NetMhc, "/nonexistent/bin/netMHC");
        assert!(!p.is_installed());
        let p = CommandPredictor::new(Method::NetMhc, "definitely-not-a-real-netmhc-binary");
        assert!(!p.is_installed());
    }

    #[test]
    fn test_supported_lengths() {
        let p = CommandPredictor::new(Method::NetMhcStabPan, "netMHCstabpan").with_lengths([9]);
        assert!(p.supports_length(9));
        assert!(!p.supports_length(8));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_executable_and_checks_batch() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-netmhc");
        // Echo each input peptide with a fixed affinity
        std::fs::write(
            &script,
            "#!/bin/sh\necho '# fake predictor'\nwhile read p; do echo \"$p 42.0 1.5\"; done < \"$2\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let predictor = CommandPredictor::new(Method::NetMhc, &script).with_args(["-f", "{input}"]);
        assert!(predictor.is_installed());

        let allele = Allele::new("HLA-A*02:01").unwrap();
        let peptides = Peptide::parse_all(["GILGFVFTL", "YWDRNTQIY"]).unwrap();
        let records = predictor.predict_uniform(&allele, 9, &peptides).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].peptide().as_str(), "YWDRNTQIY");
        assert_eq!(records[1].strength(), 42.0);
        assert_eq!(records[1].percentile(), Some(1.5));
    }
}
