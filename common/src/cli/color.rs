//! Terminal color policy for log output.
//!
//! The explicit choice wins. In `Auto`, `NO_COLOR` or `EMACS` in the
//! environment disable colors, otherwise colors follow TTY detection.

use std::env;
use std::fmt;
use std::str::FromStr;

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorWhen {
    /// Enable colors only when output is a TTY.
    #[default]
    Auto,

    /// Always enable colors.
    Always,

    /// Never enable colors.
    Never,
}

impl ColorWhen {
    // ---
    /// Returns whether ANSI color should be used for the given stream.
    pub fn should_color(self, stream: atty::Stream) -> bool {
        match self {
            ColorWhen::Always => true,
            ColorWhen::Never => false,
            ColorWhen::Auto => !env_disables_color() && atty::is(stream),
        }
    }

    /// Convenience helper for stderr, where logs are written.
    pub fn should_color_stderr(self) -> bool {
        self.should_color(atty::Stream::Stderr)
    }
}

fn env_disables_color() -> bool {
    // ---
    env::var_os("NO_COLOR").is_some() || env::var_os("EMACS").is_some()
}

impl FromStr for ColorWhen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorWhen::Auto),
            "always" => Ok(ColorWhen::Always),
            "never" => Ok(ColorWhen::Never),
            other => Err(format!(
                "invalid color choice '{other}' (expected auto, always or never)"
            )),
        }
    }
}

impl fmt::Display for ColorWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorWhen::Auto => "auto",
            ColorWhen::Always => "always",
            ColorWhen::Never => "never",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn with_env_var<F: FnOnce()>(key: &str, val: &str, f: F) {
        // ---
        let prev = env::var_os(key);
        env::set_var(key, val);
        f();
        match prev {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }

    #[test]
    fn no_color_disables_in_auto() {
        // ---
        with_env_var("NO_COLOR", "1", || {
            assert!(!ColorWhen::Auto.should_color_stderr());
        });
    }

    #[test]
    fn emacs_disables_in_auto() {
        // ---
        with_env_var("EMACS", "t", || {
            assert!(!ColorWhen::Auto.should_color_stderr());
        });
    }

    #[test]
    fn explicit_choices_ignore_environment() {
        // ---
        with_env_var("NO_COLOR", "1", || {
            assert!(ColorWhen::Always.should_color_stderr());
            assert!(!ColorWhen::Never.should_color_stderr());
        });
    }

    #[test]
    fn parses_case_insensitively() {
        // ---
        assert_eq!("AUTO".parse::<ColorWhen>(), Ok(ColorWhen::Auto));
        assert_eq!("always".parse::<ColorWhen>(), Ok(ColorWhen::Always));
        assert_eq!("Never".parse::<ColorWhen>(), Ok(ColorWhen::Never));
        assert!("sometimes".parse::<ColorWhen>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        // ---
        for choice in [ColorWhen::Auto, ColorWhen::Always, ColorWhen::Never] {
            assert_eq!(choice.to_string().parse::<ColorWhen>(), Ok(choice));
        }
    }
}
