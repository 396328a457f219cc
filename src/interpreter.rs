use crate::builtin::{Cd, Exit, Help, HistoryFactory, Pwd};
use crate::command::{Command, CommandFactory, ExitCode};
use crate::env::Environment;
use crate::expand;
use crate::external::{OsSpawner, SpawnRequest, Spawner};
use crate::history::History;
use crate::lexer;
use crate::parser::{self, ParseError};
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Factory allows creating instances of ExecutableCommand.
///
/// One per built-in type; the `CommandFactory` impl lives next to the
/// builtins.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal interactive command interpreter.
///
/// Each input line flows strictly forward: raw line → tokens → expanded
/// tokens → [`Command`] descriptor → dispatch. Built-ins run in-process
/// through a list of [`CommandFactory`] objects; everything else becomes a
/// [`SpawnRequest`] for the [`Spawner`]. The interpreter owns the
/// [`Environment`] and the in-memory history of the session.
///
/// Example
/// ```no_run
/// use tinysh::Interpreter;
/// let mut sh = Interpreter::default();
/// sh.repl().unwrap();
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
    spawner: Box<dyn Spawner>,
    history: Rc<RefCell<History>>,
}

impl Interpreter {
    /// Create an interpreter with a custom set of built-in factories and a
    /// custom spawner. The history handle is shared with the `history`
    /// builtin factory, when one is present.
    pub fn new(
        builtins: Vec<Box<dyn CommandFactory>>,
        spawner: Box<dyn Spawner>,
        history: Rc<RefCell<History>>,
    ) -> Self {
        Self {
            env: Environment::new(),
            builtins,
            spawner,
            history,
        }
    }

    /// The interpreter's environment, exposed for embedding and tests.
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Execute one parsed command and report its exit status.
    ///
    /// Built-in dispatch takes priority: a name recognized by any factory
    /// runs synchronously in this process and ignores the descriptor's
    /// redirections. Every other name is launched externally; redirect and
    /// load failures surface only as the returned status.
    pub fn execute(&mut self, cmd: Command) -> anyhow::Result<ExitCode> {
        let args = cmd.args();
        for factory in &self.builtins {
            if let Some(builtin) = factory.try_create(&self.env, cmd.name(), &args) {
                debug!("running builtin `{}`", cmd.name());
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                let code = builtin.execute(&mut lock, &mut self.env)?;
                lock.flush()?;
                return Ok(code);
            }
        }

        debug!("launching external `{}`", cmd.name());
        let request = SpawnRequest::from(&cmd);
        Ok(self.spawner.spawn_and_wait(&request, &self.env))
    }

    /// Run one raw input line through the full pipeline.
    ///
    /// Returns `Ok(None)` when the line was skipped: blank input, operator
    /// only input, or a syntax error (which is reported on the error
    /// stream). Skipped lines are never recorded in history.
    pub fn eval_line(&mut self, line: &str) -> anyhow::Result<Option<ExitCode>> {
        let tokens = lexer::tokenize(line);
        let tokens = expand::expand_tokens(&self.env, tokens);

        let cmd = match parser::parse(tokens) {
            Ok(cmd) => cmd,
            Err(ParseError::EmptyCommand) => return Ok(None),
            Err(err @ ParseError::MissingRedirectTarget(_)) => {
                eprintln!("{}", err);
                return Ok(None);
            }
        };

        self.history.borrow_mut().record(line);

        let status = self.execute(cmd)?;
        Ok(Some(status))
    }

    /// The interactive Read-Eval-Print Loop.
    ///
    /// Terminates cleanly on `exit` or end-of-input; every other condition
    /// is local to the offending line.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            if self.env.should_exit {
                break;
            }

            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match self.eval_line(&line) {
                        Ok(Some(status)) => debug!("exit status {}", status),
                        Ok(None) => {}
                        Err(err) => eprintln!("{:#}", err),
                    }
                }
                // Ctrl-C abandons the current line; the loop survives.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    eprintln!("error: {}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    fn prompt(&self) -> String {
        format!("tinysh:{}$ ", self.env.current_dir.display())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of built-ins (`cd`,
    /// `pwd`, `help`, `exit`, `history`) and the OS-backed spawner.
    fn default() -> Self {
        let history = Rc::new(RefCell::new(History::new()));
        Self::new(
            vec![
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Help>::default()),
                Box::new(Factory::<Exit>::default()),
                Box::new(HistoryFactory::new(Rc::clone(&history))),
            ],
            Box::new(OsSpawner),
            history,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::Redirect;
    use std::path::PathBuf;

    /// Records every request it receives and returns a scripted status;
    /// no process is ever created.
    struct FakeSpawner {
        calls: Rc<RefCell<Vec<SpawnRequest>>>,
        status: ExitCode,
    }

    impl Spawner for FakeSpawner {
        fn spawn_and_wait(&self, request: &SpawnRequest, _env: &Environment) -> ExitCode {
            self.calls.borrow_mut().push(request.clone());
            self.status
        }
    }

    fn fake_interpreter(status: ExitCode) -> (Interpreter, Rc<RefCell<Vec<SpawnRequest>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let history = Rc::new(RefCell::new(History::new()));
        let interp = Interpreter::new(
            vec![
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Help>::default()),
                Box::new(Factory::<Exit>::default()),
                Box::new(HistoryFactory::new(Rc::clone(&history))),
            ],
            Box::new(FakeSpawner {
                calls: Rc::clone(&calls),
                status,
            }),
            history,
        );
        (interp, calls)
    }

    fn command(argv: &[&str]) -> Command {
        Command {
            argv: argv.iter().map(|a| a.to_string()).collect(),
            ..Command::default()
        }
    }

    #[test]
    fn builtins_never_reach_the_spawner() {
        let (mut interp, calls) = fake_interpreter(0);

        let status = interp.execute(command(&["help"])).unwrap();

        assert_eq!(status, 0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn unknown_names_go_to_the_spawner() {
        let (mut interp, calls) = fake_interpreter(42);

        let status = interp.execute(command(&["frobnicate", "--fast"])).unwrap();

        assert_eq!(status, 42);
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].argv, vec!["frobnicate", "--fast"]);
    }

    #[test]
    fn redirections_travel_as_data() {
        let (mut interp, calls) = fake_interpreter(0);

        let cmd = Command {
            argv: vec!["sort".into()],
            input_path: Some(PathBuf::from("in")),
            output_path: Some(PathBuf::from("out")),
            append: true,
        };
        interp.execute(cmd).unwrap();

        let calls = calls.borrow();
        assert_eq!(
            calls[0].redirects,
            vec![
                Redirect::Input(PathBuf::from("in")),
                Redirect::Output {
                    path: PathBuf::from("out"),
                    append: true,
                },
            ]
        );
    }

    #[test]
    fn builtins_ignore_redirections_on_the_descriptor() {
        let (mut interp, calls) = fake_interpreter(0);

        let cmd = Command {
            argv: vec!["help".into()],
            output_path: Some(PathBuf::from("/nonexistent/dir/out")),
            ..Command::default()
        };
        let status = interp.execute(cmd).unwrap();

        // In-process dispatch: no spawn, and the bogus redirect target is
        // never opened.
        assert_eq!(status, 0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn eval_line_runs_the_whole_pipeline() {
        let (mut interp, calls) = fake_interpreter(0);

        let status = interp.eval_line("frob \"two words\" > out.txt").unwrap();

        assert_eq!(status, Some(0));
        let calls = calls.borrow();
        assert_eq!(calls[0].argv, vec!["frob", "two words"]);
        assert_eq!(
            calls[0].redirects,
            vec![Redirect::Output {
                path: PathBuf::from("out.txt"),
                append: false,
            }]
        );
    }

    #[test]
    fn eval_line_expands_variables_before_parsing() {
        let (mut interp, calls) = fake_interpreter(0);
        interp.env_mut().set_var("TINYSH_TEST_TARGET", "report.txt");

        interp.eval_line("frob $TINYSH_TEST_TARGET").unwrap();

        assert_eq!(calls.borrow()[0].argv, vec!["frob", "report.txt"]);
    }

    #[test]
    fn blank_lines_are_skipped_silently() {
        let (mut interp, calls) = fake_interpreter(0);

        assert_eq!(interp.eval_line("   \t ").unwrap(), None);
        assert!(calls.borrow().is_empty());
        assert!(interp.history.borrow().is_empty());
    }

    #[test]
    fn syntax_errors_discard_the_command() {
        let (mut interp, calls) = fake_interpreter(0);

        assert_eq!(interp.eval_line("cmd <").unwrap(), None);
        assert!(calls.borrow().is_empty());
        assert!(interp.history.borrow().is_empty());
    }

    #[test]
    fn operator_only_input_is_skipped() {
        let (mut interp, calls) = fake_interpreter(0);

        assert_eq!(interp.eval_line("> x").unwrap(), None);
        assert!(calls.borrow().is_empty());
        assert!(interp.history.borrow().is_empty());
    }

    #[test]
    fn history_records_only_successful_parses() {
        let (mut interp, _calls) = fake_interpreter(0);

        interp.eval_line("frob one").unwrap();
        interp.eval_line("   ").unwrap();
        interp.eval_line("cmd <").unwrap();
        interp.eval_line("frob two").unwrap();
        interp.eval_line("frob three").unwrap();

        let history = interp.history.borrow();
        let lines: Vec<&str> = history.iter().collect();
        assert_eq!(lines, vec!["frob one", "frob two", "frob three"]);
    }

    #[test]
    fn failed_launches_do_not_stop_the_interpreter() {
        let (mut interp, _calls) = fake_interpreter(127);

        assert_eq!(interp.eval_line("no-such-program").unwrap(), Some(127));
        assert_eq!(interp.eval_line("another-one").unwrap(), Some(127));
    }

    #[test]
    fn exit_raises_the_environment_flag() {
        let (mut interp, calls) = fake_interpreter(0);

        let status = interp.eval_line("exit").unwrap();

        assert_eq!(status, Some(0));
        assert!(interp.env_mut().should_exit);
        assert!(calls.borrow().is_empty());
    }
}
