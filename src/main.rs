//! safemark CLI - HTML text codec filter
//!
//! Usage: `safemark <decode|decode-attr|escape-text|escape-attr> [FILE|-]`

use std::io::{self, Read, Write};
use std::process::ExitCode;

use safemark::escape::{encode_attr_onto, escape_text_to_string};

fn usage() -> ExitCode {
    eprintln!("usage: safemark <decode|decode-attr|escape-text|escape-attr> [FILE|-]");
    ExitCode::from(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Decode,
    DecodeAttr,
    EscapeText,
    EscapeAttr,
}

impl Mode {
    fn parse(arg: &str) -> Option<Self> {
        match arg {
            "decode" => Some(Mode::Decode),
            "decode-attr" => Some(Mode::DecodeAttr),
            "escape-text" => Some(Mode::EscapeText),
            "escape-attr" => Some(Mode::EscapeAttr),
            _ => None,
        }
    }

    fn apply(self, input: &str) -> String {
        match self {
            Mode::Decode => safemark::decode_html(input, false).into_owned(),
            Mode::DecodeAttr => safemark::decode_html(input, true).into_owned(),
            Mode::EscapeText => escape_text_to_string(input),
            Mode::EscapeAttr => {
                let mut out = String::with_capacity(input.len() + input.len() / 4);
                encode_attr_onto(input, &mut out);
                out
            }
        }
    }
}

fn main() -> io::Result<ExitCode> {
    let args: Vec<String> = std::env::args().collect();
    // Validate the mode before blocking on stdin.
    let Some(mode) = args.get(1).and_then(|arg| Mode::parse(arg)) else {
        return Ok(usage());
    };

    let input = match args.get(2) {
        Some(path) if path != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let output = mode.apply(&input);

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}
