//! Server process handoff for the container entrypoint.
//!
//! Computes the server command line from environment variables and
//! replaces the current process image with it. Replacing (rather than
//! spawning a child) is deliberate: the entrypoint becomes the server
//! process, so the container runtime's lifecycle signals reach the
//! server directly.

use valhalla_core::error::{DeployError, Result};

/// Role that runs the WSGI application server.
pub const DEFAULT_SERVICE: &str = "app";

/// Default gunicorn request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u32 = 120;

/// Computed command line for the service process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ServerCommand {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Database endpoint the entrypoint must wait for.
///
/// `MYSQL_HOST` defaults to the compose service name, `MYSQL_PORT` to
/// the standard MySQL port.
pub fn database_endpoint<E>(env: &E) -> Result<(String, u16)>
where
    E: Fn(&str) -> Option<String>,
{
    let host = env("MYSQL_HOST").unwrap_or_else(|| "mysql".to_string());
    let port = match env("MYSQL_PORT") {
        Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
            DeployError::Validation(format!("MYSQL_PORT is not a port number: {raw:?}"))
        })?,
        None => 3306,
    };
    Ok((host, port))
}

/// Compute the command to exec, branching on the `SERVICE` role.
///
/// The default role builds a gunicorn invocation; any other role value
/// becomes a module-style `python3 -m <role>` invocation.
pub fn server_command<E>(env: &E) -> Result<ServerCommand>
where
    E: Fn(&str) -> Option<String>,
{
    let service = env("SERVICE").unwrap_or_else(|| DEFAULT_SERVICE.to_string());
    if service != DEFAULT_SERVICE {
        return Ok(ServerCommand::new("python3").arg("-m").arg(service));
    }

    let host = env("FLASK_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = env("FLASK_PORT").unwrap_or_else(|| "5000".to_string());
    let timeout = parse_count(env, "GUNICORN_TIMEOUT")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    let mut cmd = ServerCommand::new("gunicorn");

    // An async worker count switches the worker class entirely.
    match parse_count(env, "ASYNC_WORKERS")? {
        Some(async_workers) => {
            cmd = cmd
                .arg("--worker-class")
                .arg("gevent")
                .arg("--workers")
                .arg(async_workers.to_string());
        }
        None => {
            let workers =
                parse_count(env, "WORKERS")?.unwrap_or_else(default_worker_count);
            cmd = cmd.arg("--workers").arg(workers.to_string());
        }
    }

    cmd = cmd
        .arg("--bind")
        .arg(format!("{host}:{port}"))
        .arg("--timeout")
        .arg(timeout.to_string());

    // TLS only when both halves of the bundle are configured
    if let (Some(cert), Some(key)) = (env("SSL_CERT_PATH"), env("SSL_KEY_PATH")) {
        cmd = cmd
            .arg("--certfile")
            .arg(cert)
            .arg("--keyfile")
            .arg(key);
    }

    Ok(cmd.arg("app:app"))
}

/// Gunicorn's recommended default: two workers per core plus one.
fn default_worker_count() -> u32 {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1);
    2 * cores + 1
}

fn parse_count<E>(env: &E, key: &str) -> Result<Option<u32>>
where
    E: Fn(&str) -> Option<String>,
{
    match env(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| {
                DeployError::Validation(format!("{key} is not a number: {raw:?}"))
            }),
    }
}

/// Replace the current process image with the server command.
///
/// On Unix this only returns on failure; the returned error carries
/// the exec failure. Exiting 0 afterwards is unreachable by design.
#[cfg(unix)]
pub fn exec_server(cmd: &ServerCommand) -> DeployError {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(&cmd.program)
        .args(&cmd.args)
        .exec();
    DeployError::Other(format!("exec {} failed: {err}", cmd.program))
}

#[cfg(not(unix))]
pub fn exec_server(cmd: &ServerCommand) -> DeployError {
    DeployError::Other(format!(
        "process replacement is not supported on this platform ({})",
        cmd.program
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_database_endpoint_defaults() {
        let env = env_of(&[]);
        assert_eq!(
            database_endpoint(&env).unwrap(),
            ("mysql".to_string(), 3306)
        );
    }

    #[test]
    fn test_database_endpoint_overrides() {
        let env = env_of(&[("MYSQL_HOST", "db.internal"), ("MYSQL_PORT", "3307")]);
        assert_eq!(
            database_endpoint(&env).unwrap(),
            ("db.internal".to_string(), 3307)
        );
    }

    #[test]
    fn test_database_endpoint_bad_port() {
        let env = env_of(&[("MYSQL_PORT", "lots")]);
        assert!(matches!(
            database_endpoint(&env).unwrap_err(),
            DeployError::Validation(_)
        ));
    }

    #[test]
    fn test_default_role_builds_gunicorn() {
        let env = env_of(&[("WORKERS", "4")]);
        let cmd = server_command(&env).unwrap();
        assert_eq!(cmd.program, "gunicorn");
        assert_eq!(
            cmd.args,
            vec![
                "--workers",
                "4",
                "--bind",
                "0.0.0.0:5000",
                "--timeout",
                "120",
                "app:app",
            ]
        );
    }

    #[test]
    fn test_worker_count_default_is_parallelism_derived() {
        let env = env_of(&[]);
        let cmd = server_command(&env).unwrap();
        let idx = cmd.args.iter().position(|a| a == "--workers").unwrap();
        let workers: u32 = cmd.args[idx + 1].parse().unwrap();
        assert_eq!(workers, default_worker_count());
        assert!(workers >= 3);
    }

    #[test]
    fn test_async_workers_switch_worker_class() {
        let env = env_of(&[("ASYNC_WORKERS", "8"), ("WORKERS", "4")]);
        let cmd = server_command(&env).unwrap();
        let args: Vec<&str> = cmd.args.iter().map(|s| s.as_str()).collect();
        assert!(args.starts_with(&["--worker-class", "gevent", "--workers", "8"]));
    }

    #[test]
    fn test_tls_flags_require_both_paths() {
        let env = env_of(&[("SSL_CERT_PATH", "/certs/fullchain.pem")]);
        let cmd = server_command(&env).unwrap();
        assert!(!cmd.args.iter().any(|a| a == "--certfile"));

        let env = env_of(&[
            ("SSL_CERT_PATH", "/certs/fullchain.pem"),
            ("SSL_KEY_PATH", "/certs/privkey.pem"),
        ]);
        let cmd = server_command(&env).unwrap();
        let args: Vec<&str> = cmd.args.iter().map(|s| s.as_str()).collect();
        assert!(args.windows(2).any(|w| w == ["--certfile", "/certs/fullchain.pem"]));
        assert!(args.windows(2).any(|w| w == ["--keyfile", "/certs/privkey.pem"]));
    }

    #[test]
    fn test_timeout_override() {
        let env = env_of(&[("GUNICORN_TIMEOUT", "300")]);
        let cmd = server_command(&env).unwrap();
        let args: Vec<&str> = cmd.args.iter().map(|s| s.as_str()).collect();
        assert!(args.windows(2).any(|w| w == ["--timeout", "300"]));
    }

    #[test]
    fn test_bind_uses_flask_host_port() {
        let env = env_of(&[("FLASK_HOST", "127.0.0.1"), ("FLASK_PORT", "443")]);
        let cmd = server_command(&env).unwrap();
        let args: Vec<&str> = cmd.args.iter().map(|s| s.as_str()).collect();
        assert!(args.windows(2).any(|w| w == ["--bind", "127.0.0.1:443"]));
    }

    #[test]
    fn test_non_default_role_is_module_invocation() {
        let env = env_of(&[("SERVICE", "bot")]);
        let cmd = server_command(&env).unwrap();
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["-m", "bot"]);
    }

    #[test]
    fn test_invalid_workers_rejected() {
        let env = env_of(&[("WORKERS", "many")]);
        assert!(matches!(
            server_command(&env).unwrap_err(),
            DeployError::Validation(_)
        ));
    }

    #[test]
    fn test_blank_override_falls_back_to_default() {
        let env = env_of(&[("GUNICORN_TIMEOUT", "  ")]);
        let cmd = server_command(&env).unwrap();
        let args: Vec<&str> = cmd.args.iter().map(|s| s.as_str()).collect();
        assert!(args.windows(2).any(|w| w == ["--timeout", "120"]));
    }

    #[test]
    fn test_target_is_last_arg() {
        let env = env_of(&[]);
        let cmd = server_command(&env).unwrap();
        assert_eq!(cmd.args.last().unwrap(), "app:app");
    }
}
