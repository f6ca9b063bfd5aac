//! Interactive prompting for first-run provisioning.
//!
//! Generic over the input/output streams so tests drive the flows with
//! in-memory cursors. All retry loops are iterative and terminate with
//! a `Prompt` error when the input stream closes, so piped input can
//! never spin forever on invalid values.

use std::io::{BufRead, Write};

use valhalla_core::admin::normalize_admin_ids;
use valhalla_core::error::{DeployError, Result};
use valhalla_runtime::ContainerRuntime;

/// Prompt driver over arbitrary read/write streams.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompter over the process stdin/stdout.
    pub fn stdio() -> Self {
        Prompter {
            input: std::io::stdin().lock(),
            output: std::io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line to the user (not a prompt).
    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    /// Read one trimmed line; EOF is a `Prompt` error.
    fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Err(DeployError::Prompt(format!(
                "input closed while waiting for {label}"
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Prompt until a non-empty value arrives. An existing value is
    /// offered as the default and accepted on empty input.
    pub fn required(&mut self, label: &str, existing: Option<&str>) -> Result<String> {
        loop {
            let shown = match existing {
                Some(value) => format!("{label} [{value}]"),
                None => label.to_string(),
            };
            let answer = self.ask(&shown)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if let Some(value) = existing {
                return Ok(value.to_string());
            }
            self.say(&format!("{label} is required."))?;
        }
    }

    /// Prompt where blank input reuses the existing value or, when
    /// there is none, synthesizes one with `generate`.
    pub fn generate_or_accept(
        &mut self,
        label: &str,
        existing: Option<&str>,
        generate: impl Fn() -> String,
    ) -> Result<String> {
        let hint = match existing {
            Some(_) => format!("{label} [keep current]"),
            None => format!("{label} [auto-generate]"),
        };
        let answer = self.ask(&hint)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        Ok(match existing {
            Some(value) => value.to_string(),
            None => generate(),
        })
    }

    /// Required prompt with admin-ID validation; diagnostics and
    /// re-prompting on malformed input.
    pub fn admin_ids(&mut self, existing: Option<&str>) -> Result<String> {
        loop {
            let raw = self.required("ADMIN_IDS (comma-separated numeric IDs)", existing)?;
            match normalize_admin_ids(&raw) {
                Ok(normalized) => return Ok(normalized),
                Err(e) => self.say(&e.to_string())?,
            }
        }
    }

    /// Yes/no question with a default.
    pub fn yes_no(&mut self, label: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self
                .ask(&format!("{label} [{hint}]"))?
                .to_ascii_lowercase();
            match answer.as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer y or n.")?,
            }
        }
    }

    /// Required choice between the two supported engines, looping
    /// until a valid literal arrives (case-insensitive).
    pub fn choose_runtime(&mut self) -> Result<ContainerRuntime> {
        loop {
            let answer = self.ask("Container runtime (docker/podman)")?;
            match answer.parse::<ContainerRuntime>() {
                Ok(runtime) => return Ok(runtime),
                Err(()) => self.say("Please enter \"docker\" or \"podman\".")?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_required_accepts_value() {
        let mut p = prompter("123456:token\n");
        assert_eq!(p.required("BOT_TOKEN", None).unwrap(), "123456:token");
    }

    #[test]
    fn test_required_reprompts_on_empty() {
        let mut p = prompter("\n\nvalue\n");
        assert_eq!(p.required("BOT_TOKEN", None).unwrap(), "value");
    }

    #[test]
    fn test_required_empty_takes_existing_default() {
        let mut p = prompter("\n");
        assert_eq!(p.required("MYSQL_HOST", Some("mysql")).unwrap(), "mysql");
    }

    #[test]
    fn test_required_override_beats_default() {
        let mut p = prompter("db.internal\n");
        assert_eq!(
            p.required("MYSQL_HOST", Some("mysql")).unwrap(),
            "db.internal"
        );
    }

    #[test]
    fn test_required_eof_is_prompt_error() {
        let mut p = prompter("");
        assert!(matches!(
            p.required("BOT_TOKEN", None).unwrap_err(),
            DeployError::Prompt(_)
        ));
    }

    #[test]
    fn test_generate_or_accept_blank_generates() {
        let mut p = prompter("\n");
        let value = p
            .generate_or_accept("MYSQL_PASSWORD", None, || "generated".to_string())
            .unwrap();
        assert_eq!(value, "generated");
    }

    #[test]
    fn test_generate_or_accept_blank_keeps_existing() {
        let mut p = prompter("\n");
        let value = p
            .generate_or_accept("MYSQL_PASSWORD", Some("kept"), || "generated".to_string())
            .unwrap();
        assert_eq!(value, "kept");
    }

    #[test]
    fn test_generate_or_accept_explicit_value_wins() {
        let mut p = prompter("hunter2\n");
        let value = p
            .generate_or_accept("MYSQL_PASSWORD", Some("kept"), || "generated".to_string())
            .unwrap();
        assert_eq!(value, "hunter2");
    }

    #[test]
    fn test_admin_ids_loops_until_valid() {
        let mut p = prompter("abc\n12,x\n123, 456\n");
        assert_eq!(p.admin_ids(None).unwrap(), "123,456");
        let transcript = String::from_utf8(p.output).unwrap();
        assert!(transcript.contains("comma-separated numeric IDs"));
        assert!(transcript.contains("Invalid input"));
    }

    #[test]
    fn test_admin_ids_eof_terminates_loop() {
        // Piped garbage then EOF must not spin forever
        let mut p = prompter("abc\n");
        assert!(matches!(
            p.admin_ids(None).unwrap_err(),
            DeployError::Prompt(_)
        ));
    }

    #[test]
    fn test_yes_no_default() {
        let mut p = prompter("\n");
        assert!(p.yes_no("Install docker?", true).unwrap());
        let mut p = prompter("\n");
        assert!(!p.yes_no("Install docker?", false).unwrap());
    }

    #[test]
    fn test_yes_no_answers() {
        let mut p = prompter("maybe\nno\n");
        assert!(!p.yes_no("Install docker?", true).unwrap());
    }

    #[test]
    fn test_choose_runtime_case_insensitive() {
        let mut p = prompter("PODMAN\n");
        assert_eq!(p.choose_runtime().unwrap(), ContainerRuntime::Podman);
    }

    #[test]
    fn test_choose_runtime_loops_on_invalid() {
        let mut p = prompter("lxc\nkubernetes\ndocker\n");
        assert_eq!(p.choose_runtime().unwrap(), ContainerRuntime::Docker);
        let transcript = String::from_utf8(p.output).unwrap();
        assert!(transcript.contains("docker"));
    }
}
