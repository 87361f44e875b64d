use console::style;
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

use super::{Input, Prompt};
use crate::providers::types::content::{ToolResult, ToolUse};

/// Line-oriented prompt over any reader/writer pair.
pub struct StdioPrompt<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl StdioPrompt<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioPrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Prompt for StdioPrompt<R, W> {
    fn get_input(&mut self) -> io::Result<Input> {
        write!(self.writer, "{} ", style("You:").blue().bold())?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            writeln!(self.writer)?;
            return Ok(Input::exit());
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(Input::ask_again());
        }
        Ok(Input::message(line))
    }

    fn ready(&mut self, provider: &str, model: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "Chat with {} {} {}",
            style(provider).yellow().bold(),
            style(format!("({})", model)).dim(),
            style("- use ctrl-d to quit").dim()
        )
    }

    fn render_text(&mut self, speaker: &str, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{} {}", style(format!("{}:", speaker)).yellow(), text)
    }

    fn render_tool_use(&mut self, tool_use: &ToolUse) -> io::Result<()> {
        writeln!(
            self.writer,
            "{} {}({})",
            style("tool:").green(),
            tool_use.name,
            tool_use.input
        )
    }

    fn render_tool_result(&mut self, result: &ToolResult) -> io::Result<()> {
        if result.is_error {
            writeln!(self.writer, "{} {}", style("error:").red(), result.content)
        } else {
            writeln!(self.writer, "{} {}", style("result:").green().dim(), result.content)
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::InputType;
    use serde_json::json;
    use std::io::Cursor;

    fn output(prompt: StdioPrompt<Cursor<&str>, Vec<u8>>) -> String {
        console::strip_ansi_codes(&String::from_utf8_lossy(&prompt.into_writer())).to_string()
    }

    #[test]
    fn test_input_kinds() -> io::Result<()> {
        let mut prompt = StdioPrompt::new(Cursor::new("hello there\r\n   \n"), Vec::new());

        assert_eq!(prompt.get_input()?, Input::message("hello there"));
        assert_eq!(prompt.get_input()?.input_type, InputType::AskAgain);
        assert_eq!(prompt.get_input()?.input_type, InputType::Exit);
        assert_eq!(output(prompt), "You: You: You: \n");
        Ok(())
    }

    #[test]
    fn test_turn_labels() -> io::Result<()> {
        let mut prompt = StdioPrompt::new(Cursor::new(""), Vec::new());
        prompt.render_text("Anthropic Claude", "hi")?;
        prompt.render_tool_use(&ToolUse {
            id: "1".into(),
            name: "list_files".into(),
            input: json!({"path": "."}),
        })?;
        prompt.render_tool_result(&ToolResult::success("1", "[]"))?;
        prompt.render_tool_result(&ToolResult::error("1", "tool 'x' not found"))?;

        assert_eq!(
            output(prompt),
            "Anthropic Claude: hi\ntool: list_files({\"path\":\".\"})\nresult: []\nerror: tool 'x' not found\n"
        );
        Ok(())
    }
}
