//! Line-oriented terminal I/O, generic so tests can script a session.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl Console<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    pub async fn print(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await
    }

    /// Prints `prompt` and reads one line. `None` at end of input.
    pub async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.print(prompt).await?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
