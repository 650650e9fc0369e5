//! Fully-formed description of one external command.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// An argument vector plus the environment overlay and working directory it
/// should run with.
///
/// The overlay is merged over the inherited environment at spawn time; the
/// orchestrator never mutates its own process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
    env: BTreeMap<String, String>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    /// Create an invocation from a complete argument vector (`argv[0]` is the program).
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set one overlay variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Merge a whole overlay map; later values win.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Run the command from `dir` instead of the inherited working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Full argument vector.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Program name (`argv[0]`), if any.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Environment overlay.
    pub fn overlay(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Working directory override.
    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }
}

/// Renders the argument list verbatim, separated by spaces.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_in_order() {
        let inv = Invocation::new(["cmake", ".."])
            .arg("-G")
            .args(["Ninja", "-DGUI=ON"]);
        assert_eq!(inv.argv(), ["cmake", "..", "-G", "Ninja", "-DGUI=ON"]);
        assert_eq!(inv.program(), Some("cmake"));
        assert_eq!(inv.to_string(), "cmake .. -G Ninja -DGUI=ON");
    }

    #[test]
    fn overlay_later_values_win() {
        let inv = Invocation::new(["pkg-config"])
            .env("PKG_CONFIG_PATH", "/a")
            .envs([("PKG_CONFIG_PATH", "/b"), ("CC", "clang")]);
        assert_eq!(inv.overlay().get("PKG_CONFIG_PATH").map(String::as_str), Some("/b"));
        assert_eq!(inv.overlay().len(), 2);
    }

    #[test]
    fn empty_invocation_has_no_program() {
        let inv = Invocation::new(Vec::<String>::new());
        assert_eq!(inv.program(), None);
    }
}
