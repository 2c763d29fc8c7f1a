use std::io::{self, BufRead, IsTerminal};
use std::process::ExitCode;

use anyhow::Context;
use bns_ai::advisor::{LegalAdvisor, Preparation};
use bns_core::error::AppError;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::config::AppConfig;
use crate::render::{JsonSurface, Surface, TextSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Situation to analyse; read from stdin when omitted
    pub question: Vec<String>,

    /// Also show the IPC sections corresponding to each retrieved BNS section
    #[arg(long)]
    pub cross_references: bool,

    /// Also show the full text of each retrieved BNS section
    #[arg(long)]
    pub sections: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    Answered,
    NoDocuments,
    Failed { recoverable: bool },
}

impl AskOutcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            AskOutcome::Answered | AskOutcome::NoDocuments => ExitCode::SUCCESS,
            AskOutcome::Failed { recoverable: true } => ExitCode::SUCCESS,
            AskOutcome::Failed { recoverable: false } => ExitCode::FAILURE,
        }
    }
}

pub fn run(config: &AppConfig, args: AskArgs) -> anyhow::Result<ExitCode> {
    let question = if args.question.is_empty() {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read question from stdin")?;
        line
    } else {
        args.question.join(" ")
    };

    let ctx = AppContext::load(config)?;
    let advisor = ctx.advisor();

    let stdout = io::stdout();
    let live = stdout.is_terminal();
    let mut surface: Box<dyn Surface> = match args.format {
        OutputFormat::Text => Box::new(TextSurface::new(stdout.lock(), io::stderr(), live)),
        OutputFormat::Json => Box::new(JsonSurface::new(stdout.lock())),
    };

    let outcome = ask(&advisor, &question, &args, surface.as_mut())?;
    Ok(outcome.exit_code())
}

/// One query: retrieve, assemble, stream the answer, then the optional listings.
pub fn ask(
    advisor: &LegalAdvisor<'_>,
    question: &str,
    args: &AskArgs,
    surface: &mut dyn Surface,
) -> io::Result<AskOutcome> {
    let prepared = match advisor.prepare(question) {
        Ok(Preparation::Ready(prepared)) => prepared,
        Ok(Preparation::NoDocuments(reason)) => {
            tracing::info!(?reason, "no documents for query");
            surface.no_documents(&reason)?;
            return Ok(AskOutcome::NoDocuments);
        }
        Err(e) => return fail(surface, &e),
    };

    surface.answer_start()?;
    let mut write_err: Option<io::Error> = None;
    let answer = advisor.answer(&prepared, &mut |display| {
        if write_err.is_none() {
            write_err = surface.answer_update(display).err();
        }
    });
    if let Some(e) = write_err {
        return Err(e);
    }
    match answer {
        Ok(answer) => surface.answer_done(&answer)?,
        Err(e) => return fail(surface, &e),
    }

    if args.cross_references {
        surface.cross_references(&prepared.context.cross_references)?;
    }
    if args.sections {
        surface.sections(&prepared.context.section_listing)?;
    }
    Ok(AskOutcome::Answered)
}

fn fail(surface: &mut dyn Surface, e: &AppError) -> io::Result<AskOutcome> {
    let recoverable = e.is_recoverable();
    if recoverable {
        tracing::warn!(error = %e, "query aborted");
    } else {
        tracing::error!(error = %e, "query failed");
    }
    surface.error(e)?;
    Ok(AskOutcome::Failed { recoverable })
}
