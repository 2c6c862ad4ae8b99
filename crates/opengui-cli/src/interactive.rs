//! Line-oriented question loop over any reader and writer.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use opengui_core::{value, Answer, Form, Prompt, Session};
use serde_json::{Map, Value};

/// Ask every question `form` produces until the whole tree validates.
///
/// Returns the flattened leaf values. Fails if input runs out first.
pub fn ask<F, R, W>(form: F, values: Map<String, Value>, mut input: R, mut output: W) -> Result<Map<String, Value>>
where
    F: Form,
    R: BufRead,
    W: Write,
{
    let mut session = Session::with_values(form, values).context("Failed to build form")?;

    loop {
        while let Some(path) = session.next() {
            let prompt = session.prompt(&path)?;
            write_prompt(&mut output, &prompt)?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                bail!("Input ended before '{}' was answered", path.join("."));
            }

            let field = session
                .fields()
                .field_at_path(&path)
                .with_context(|| format!("Field '{}' disappeared", path.join(".")))?;
            let answer = Answer::parse(field, &line);

            let answered = session.answer(&path, answer)?;
            for error in &answered.errors {
                writeln!(output, "  ! {}", error)?;
            }
        }

        if let Some(done) = session.finish() {
            return Ok(done);
        }

        if session.next().is_none() {
            let errors = serde_json::to_string(&session.fields().to_dict())?;
            bail!("Form cannot be completed: {}", errors);
        }
        tracing::debug!("Form invalid, asking again");
    }
}

fn write_prompt<W: Write>(output: &mut W, prompt: &Prompt) -> Result<()> {
    let marker = if prompt.required { " *" } else { "" };
    writeln!(output, "{}{}", prompt.label(), marker)?;

    if let Some(description) = prompt.description() {
        writeln!(output, "  {}", description)?;
    }

    if let Some(options) = &prompt.options {
        for (index, option) in options.iter().enumerate() {
            writeln!(output, "  {}) {}", index + 1, value::scalar(option))?;
        }
        if prompt.multi {
            writeln!(output, "  (separate choices with commas)")?;
        }
    }

    match &prompt.default {
        Some(default) => write!(output, "[{}] > ", value::scalar(default))?,
        None => write!(output, "> ")?,
    }
    output.flush()?;
    Ok(())
}
