use std::io::{self, Read, Write};

use clap::Parser;

use diff_tint::{DiffTintError, Mode, Options, Palette, filter_diff};

#[derive(Parser)]
#[command(name = "diff-tint")]
#[command(about = "Recolor unified diffs with token-level and moved-line highlights")]
struct Cli {
    /// Keep one output line per input line, for tools that slice the diff
    /// by line position (e.g. git's interactive add)
    #[arg(short, long)]
    interactive: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut stdout = io::stdout().lock();

    // Verbatim copy, byte for byte, when the filter is switched off
    if std::env::var_os("DIFF_TINT_OFF").is_some() {
        match io::copy(&mut io::stdin().lock(), &mut stdout) {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
            Err(e) => {
                return Err(DiffTintError::WriteFailed {
                    message: e.to_string(),
                }
                .into());
            }
        }
    }

    // Git can emit utf8-illegal sequences; replace rather than fail
    let mut bytes = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut bytes)
        .map_err(|e| DiffTintError::ReadFailed {
            message: e.to_string(),
        })?;
    let input = String::from_utf8_lossy(&bytes);

    let mode = if std::env::var_os("DIFF_TINT_DEBUG").is_some() {
        Mode::Debug
    } else if cli.interactive {
        Mode::Interactive
    } else {
        Mode::Normal
    };
    let options = Options {
        mode,
        palette: Palette::default(),
    };

    let output = filter_diff(&input, &options);

    if let Err(e) = stdout.write_all(output.as_bytes()) {
        // A pager quitting early is not an error
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(DiffTintError::WriteFailed {
            message: e.to_string(),
        }
        .into());
    }

    Ok(())
}
