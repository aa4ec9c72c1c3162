//! Compiler configuration.
//!
//! Grounded in the teacher's `config::CompilerConfig` builder shape
//! (`with_*` methods, `Default` impl), scoped down to what a batch Pascal
//! compiler actually needs: where to write output, and which files in a
//! directory count as input (§10.3).

use std::path::PathBuf;

/// Configuration for a compilation run.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Directory to write generated `.vm` files into. `None` writes
    /// alongside each source file.
    pub out_dir: Option<PathBuf>,

    /// Source file extension recognized in directory-batch mode.
    pub source_extension: String,

    /// Whether an unsupported `case` statement is a hard error rather than
    /// a silently skipped statement. Always `true`: Open Question 3
    /// resolved `case` as unconditionally unsupported, so this knob has
    /// exactly one valid value and exists to document that decision rather
    /// than to be toggled.
    pub case_as_error: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            out_dir: None,
            source_extension: "pas".to_string(),
            case_as_error: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    /// Resolve the output path for a given source file.
    pub fn output_path_for(&self, source_path: &std::path::Path) -> PathBuf {
        let file_name = source_path.with_extension("vm");
        match &self.out_dir {
            Some(dir) => dir.join(file_name.file_name().unwrap_or_default()),
            None => file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_config_uses_pas_extension_and_sibling_output() {
        let config = CompilerConfig::default();
        assert_eq!(config.source_extension, "pas");
        assert_eq!(config.output_path_for(Path::new("prog.pas")), PathBuf::from("prog.vm"));
    }

    #[test]
    fn with_out_dir_redirects_output() {
        let config = CompilerConfig::new().with_out_dir("build");
        assert_eq!(config.output_path_for(Path::new("src/prog.pas")), PathBuf::from("build/prog.vm"));
    }

    #[test]
    fn case_as_error_is_always_true() {
        assert!(CompilerConfig::default().case_as_error);
    }
}
