use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{
    diagnostics::{OleanderError, Result},
    runtime::Interpreter,
    value::Value,
};

/// Flag flipped by the `quit` builtin, reached through the interpreter's
/// user data slot.
struct ReplState {
    quit: bool,
}

fn repl_quit(interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value> {
    if let Some(state) = interpreter
        .user_data_mut()
        .and_then(|data| data.downcast_mut::<ReplState>())
    {
        state.quit = true;
    }
    Ok(Value::None)
}

/// Net bracket depth of the accumulated input. Positive means an open
/// `(`, `[`, or `{` is still unmatched and the statement continues on the
/// next line.
fn bracket_depth(source: &str) -> i32 {
    let mut depth = 0;
    for ch in source.chars() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

pub struct Repl {
    interpreter: Interpreter,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        let mut interpreter = Interpreter::new();
        interpreter.set_user_data(Box::new(ReplState { quit: false }));
        interpreter.register_native("quit", 0, Some(0), repl_quit);
        Self { interpreter }
    }

    fn quit_requested(&self) -> bool {
        self.interpreter
            .user_data()
            .and_then(|data| data.downcast_ref::<ReplState>())
            .is_some_and(|state| state.quit)
    }

    /// Drive the read-eval-print loop until end of input or `quit()`. Each
    /// input is one unit: an error is reported and the session carries on
    /// with the interpreter state intact.
    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().map_err(readline_error)?;
        loop {
            let mut source = match editor.readline(">>> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(readline_error(err)),
            };
            while bracket_depth(&source) > 0 {
                match editor.readline("... ") {
                    Ok(line) => {
                        source.push('\n');
                        source.push_str(&line);
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                    Err(err) => return Err(readline_error(err)),
                }
            }
            if source.trim().is_empty() {
                continue;
            }
            editor.add_history_entry(&source).ok();
            match self.interpreter.run("<repl>", &source) {
                Ok(value) => println!("{value}"),
                Err(OleanderError::Diagnostic(diag)) => eprintln!("{diag}"),
                Err(other) => eprintln!("error: {other}"),
            }
            if self.quit_requested() {
                break;
            }
        }
        Ok(())
    }
}

fn readline_error(err: ReadlineError) -> OleanderError {
    OleanderError::from(std::io::Error::new(std::io::ErrorKind::Other, err))
}
