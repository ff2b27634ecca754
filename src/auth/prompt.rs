use std::io::{self, BufRead, Write};

/// Source of login input.
pub trait Prompter {
    /// Next username line, `None` once input is closed.
    fn read_username(&mut self) -> io::Result<Option<String>>;

    fn read_password(&mut self) -> io::Result<String>;

    /// Progress line shown between attempts.
    fn notify(&mut self, message: &str);
}

/// Reads from the controlling terminal, prompts on stderr.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_username(&mut self) -> io::Result<Option<String>> {
        let mut stderr = io::stderr();
        write!(stderr, "Username or email: ")?;
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn read_password(&mut self) -> io::Result<String> {
        rpassword::prompt_password("       Password: ")
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}\n", message);
    }
}
