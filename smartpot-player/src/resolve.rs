use std::io::BufRead;

use anyhow::{bail, Context, Result};

use smartpot_music::{NoteResolver, Pitch, Reference, Tone};

/// Reads a note token from the first line of `reader`
pub fn read_token<R: BufRead>(reader: R) -> Result<String> {
    let line = reader
        .lines()
        .next()
        .context("no note token on stdin")?
        .context("could not read note token")?;

    let token = line.trim();
    if token.is_empty() {
        bail!("no note token on stdin");
    }

    Ok(token.to_string())
}

pub fn resolver_for(reference: Reference, reference_hz: Option<f32>) -> Result<NoteResolver> {
    let resolver = NoteResolver::new(reference);

    match reference_hz {
        Some(hz) => resolver
            .with_reference_hz(hz)
            .with_context(|| format!("bad reference frequency {hz}")),
        None => Ok(resolver),
    }
}

/// One line describing what `token` resolves to, e.g. `A4: offset 57 -> 439.96 Hz`
pub fn describe_note(token: &str, resolver: &NoteResolver) -> Result<String> {
    match resolver.resolve_semitone_offset(token)? {
        Pitch::Rest => Ok(format!("{}: rest", token)),
        Pitch::Offset(offset) => {
            let Tone::Hz(hz) = resolver.resolve_frequency(token)? else {
                bail!("`{}` resolved to an offset but not to a frequency", token);
            };
            Ok(format!("{}: offset {} -> {:.2} Hz", token, offset, hz))
        }
    }
}
