use std::io::{self, Write};

use bns_ai::retrieve::EmptyReason;
use bns_core::error::AppError;
use serde::Serialize;

pub const NO_DOCUMENTS_MESSAGE: &str = "No relevant legal documents found for your query.";

const ANSWER_HEADING: &str = "## Comprehensive legal guidance";
const CROSS_REFERENCE_HEADING: &str = "## Corresponding IPC sections (mapped from BNS)";
const SECTIONS_HEADING: &str = "## Relevant legal sections (from the BNS document)";

const SAVE_CURSOR: &str = "\x1b7";
const RESTORE_CURSOR_AND_CLEAR: &str = "\x1b8\x1b[J";

/// Where one `ask` renders its display regions.
pub trait Surface {
    fn answer_start(&mut self) -> io::Result<()>;
    /// Called with the full sanitized answer so far, never a delta.
    fn answer_update(&mut self, display: &str) -> io::Result<()>;
    fn answer_done(&mut self, answer: &str) -> io::Result<()>;
    fn cross_references(&mut self, listing: &str) -> io::Result<()>;
    fn sections(&mut self, listing: &str) -> io::Result<()>;
    fn no_documents(&mut self, reason: &EmptyReason) -> io::Result<()>;
    fn error(&mut self, error: &AppError) -> io::Result<()>;
}

/// Markdown-ish text for a terminal or a pipe.
///
/// The sanitized answer is not append-only (a closing `</think>` removes text
/// already shown), so in live mode the cursor position is saved where the
/// answer begins and a diverging update restores it and clears to the end of
/// the screen. Without a terminal nothing is streamed and the final answer is
/// written once.
pub struct TextSurface<W: Write, E: Write> {
    out: W,
    err: E,
    live: bool,
    printed: String,
}

impl<W: Write, E: Write> TextSurface<W, E> {
    pub fn new(out: W, err: E, live: bool) -> Self {
        Self {
            out,
            err,
            live,
            printed: String::new(),
        }
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }

    fn redraw(&mut self, display: &str) -> io::Result<()> {
        if let Some(suffix) = display.strip_prefix(self.printed.as_str()) {
            self.out.write_all(suffix.as_bytes())?;
        } else {
            self.clear_answer()?;
            self.out.write_all(display.as_bytes())?;
        }
        self.printed.clear();
        self.printed.push_str(display);
        self.out.flush()
    }

    fn clear_answer(&mut self) -> io::Result<()> {
        self.out.write_all(RESTORE_CURSOR_AND_CLEAR.as_bytes())?;
        self.printed.clear();
        Ok(())
    }
}

impl<W: Write, E: Write> Surface for TextSurface<W, E> {
    fn answer_start(&mut self) -> io::Result<()> {
        writeln!(self.out, "{ANSWER_HEADING}\n")?;
        if self.live {
            self.out.write_all(SAVE_CURSOR.as_bytes())?;
        }
        self.out.flush()
    }

    fn answer_update(&mut self, display: &str) -> io::Result<()> {
        if self.live {
            self.redraw(display)?;
        }
        Ok(())
    }

    fn answer_done(&mut self, answer: &str) -> io::Result<()> {
        if self.live {
            self.redraw(answer)?;
        } else {
            self.out.write_all(answer.as_bytes())?;
        }
        writeln!(self.out)?;
        self.printed.clear();
        self.out.flush()
    }

    fn cross_references(&mut self, listing: &str) -> io::Result<()> {
        writeln!(self.out, "\n{CROSS_REFERENCE_HEADING}\n\n{listing}")
    }

    fn sections(&mut self, listing: &str) -> io::Result<()> {
        writeln!(self.out, "\n{SECTIONS_HEADING}\n\n{listing}")
    }

    fn no_documents(&mut self, _reason: &EmptyReason) -> io::Result<()> {
        writeln!(self.out, "{NO_DOCUMENTS_MESSAGE}")
    }

    fn error(&mut self, error: &AppError) -> io::Result<()> {
        // A partial answer must not stay on screen looking finished.
        if self.live && !self.printed.is_empty() {
            self.clear_answer()?;
            self.out.flush()?;
        }
        write!(self.err, "error: {}", error.message)?;
        if let Some(details) = &error.details {
            write!(self.err, " ({details})")?;
        }
        writeln!(self.err)?;
        if error.retryable {
            writeln!(self.err, "hint: the local model backend may be busy; try again")?;
        }
        self.err.flush()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Answer { text: &'a str, done: bool },
    CrossReferences { text: &'a str },
    Sections { text: &'a str },
    NoDocuments { message: &'a str, reason: &'a EmptyReason },
    Error { error: &'a AppError },
}

/// One NDJSON event per update on stdout.
pub struct JsonSurface<W: Write> {
    out: W,
}

impl<W: Write> JsonSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &Event<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> Surface for JsonSurface<W> {
    fn answer_start(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn answer_update(&mut self, display: &str) -> io::Result<()> {
        self.emit(&Event::Answer {
            text: display,
            done: false,
        })
    }

    fn answer_done(&mut self, answer: &str) -> io::Result<()> {
        self.emit(&Event::Answer {
            text: answer,
            done: true,
        })
    }

    fn cross_references(&mut self, listing: &str) -> io::Result<()> {
        self.emit(&Event::CrossReferences { text: listing })
    }

    fn sections(&mut self, listing: &str) -> io::Result<()> {
        self.emit(&Event::Sections { text: listing })
    }

    fn no_documents(&mut self, reason: &EmptyReason) -> io::Result<()> {
        self.emit(&Event::NoDocuments {
            message: NO_DOCUMENTS_MESSAGE,
            reason,
        })
    }

    fn error(&mut self, error: &AppError) -> io::Result<()> {
        self.emit(&Event::Error { error })
    }
}
