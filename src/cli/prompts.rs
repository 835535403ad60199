//! Interactive questions asked when a flag was not given.

use std::io::{self, BufRead, Stdin, Stdout, Write};

use runway_gallery::proxy::proxy_from_parts;

/// Line-oriented prompter over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line, such as a section heading, before the next question.
    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }

    /// Ask a question and return the trimmed answer (empty at end of input).
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}: ", question)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Ask until a non-empty answer is given.
    pub fn ask_required(&mut self, question: &str) -> io::Result<String> {
        loop {
            let answer = self.ask(question)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if self.at_eof()? {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("no answer for \"{}\"", question),
                ));
            }
        }
    }

    /// Yes/no question. Only "yes" or "y" count as yes.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{} (yes/no)", question))?;
        Ok(matches!(answer.to_lowercase().as_str(), "yes" | "y"))
    }

    /// Pick a proxy: the environment one if confirmed, else `ip` + `port`.
    pub fn choose_proxy(&mut self, env_proxy: Option<String>) -> io::Result<Option<String>> {
        if let Some(proxy) = env_proxy {
            if self.confirm(&format!("Found system proxy {}. Use it?", proxy))? {
                return Ok(Some(proxy));
            }
        }

        writeln!(
            self.output,
            "\nProxy configuration (leave blank if not using a proxy)"
        )?;
        let host = self.ask("Enter proxy IP address (e.g. 192.168.1.100)")?;
        if host.is_empty() {
            return Ok(None);
        }
        let port = self.ask("Enter proxy port (e.g. 8080)")?;
        Ok(proxy_from_parts(&host, &port))
    }

    fn at_eof(&mut self) -> io::Result<bool> {
        Ok(self.input.fill_buf()?.is_empty())
    }
}
