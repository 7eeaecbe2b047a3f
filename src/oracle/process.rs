//! Evaluator sessions backed by a long-lived child process.
//!
//! Line protocol: for every evaluation the session writes the genome's
//! tokens, separated by single spaces, as one line on the child's stdin and
//! reads one line from its stdout, which must parse as a number. The child
//! is killed when the session is torn down or dropped.

use std::ffi::OsString;
use std::fmt::Display;
use std::future::Future;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::session::{EvaluatorSession, SessionFactory};
use crate::error::SessionError;
use crate::search::{Genome, Token};

/// Environment variable carrying the worker slot index to the child.
pub const WORKER_ENV: &str = "BEAMSEARCH_WORKER";

/// Starts one child process per worker slot.
///
/// # Examples
///
/// ```no_run
/// use u_beamsearch::oracle::{CommandFactory, OracleConfig, PoolOracle};
///
/// let factory = CommandFactory::new("python3").arg("evaluate.py");
/// let oracle: PoolOracle<String, _> =
///     PoolOracle::new(factory, OracleConfig::default()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CommandFactory {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandFactory {
    /// A factory running `program` without arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl<T: Token + Display> SessionFactory<T> for CommandFactory {
    type Session = ProcessSession;

    fn spawn(
        &self,
        worker: usize,
    ) -> impl Future<Output = Result<ProcessSession, SessionError>> + Send {
        let child = Command::new(&self.program)
            .args(&self.args)
            .env(WORKER_ENV, worker.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn();
        async move {
            let mut child = child.map_err(|e| SessionError::Spawn(e.to_string()))?;
            let stdin = child
                .stdin
                .take()
                .ok_or_else(|| SessionError::Spawn("child has no stdin".into()))?;
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| SessionError::Spawn("child has no stdout".into()))?;
            Ok(ProcessSession {
                child,
                stdin,
                stdout: BufReader::new(stdout).lines(),
            })
        }
    }
}

/// A running child process speaking the line protocol.
#[derive(Debug)]
pub struct ProcessSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl<T: Token + Display> EvaluatorSession<T> for ProcessSession {
    fn evaluate(
        &mut self,
        genome: &Genome<T>,
    ) -> impl Future<Output = Result<f64, SessionError>> + Send {
        let mut request = genome
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        request.push('\n');

        async move {
            self.stdin.write_all(request.as_bytes()).await?;
            self.stdin.flush().await?;
            let line = self.stdout.next_line().await?.ok_or(SessionError::Closed)?;
            line.trim()
                .parse::<f64>()
                .map_err(|_| SessionError::Protocol(line))
        }
    }

    fn shutdown(mut self) -> impl Future<Output = ()> + Send {
        async move {
            let _ = self.child.kill().await;
        }
    }
}
