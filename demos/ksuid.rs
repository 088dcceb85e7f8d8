//! Simple command that prints one or '-n count' new KSUIDs, or the KSUIDs given, in the '-f' format

use std::{io, io::Write, process::ExitCode};

use clap::{Parser, ValueEnum};
use ksuid::Ksuid;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing_subscriber::EnvFilter;

/// Generates or inspects KSUIDs.
#[derive(Parser)]
#[command(name = "ksuid")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of KSUIDs to generate when called with no other arguments
    #[arg(short, default_value_t = 1)]
    n: usize,

    /// Output format of the generated or given KSUIDs
    #[arg(short, value_enum, default_value_t = Format::String)]
    f: Format,

    /// KSUIDs to print in the chosen format
    ids: Vec<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum Format {
    /// Representations and components
    Inspect,
    /// Creation time (RFC 3339, UTC)
    Time,
    /// Timestamp field as a decimal number
    Timestamp,
    /// Raw 16-byte payload
    Payload,
    /// Raw 20-byte binary form
    Raw,
    /// Canonical 27-character string
    String,
}

fn main() -> io::Result<ExitCode> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let ids = if cli.ids.is_empty() {
        match (0..cli.n).map(|_| Ksuid::new_random()).collect::<Result<Vec<_>, _>>() {
            Ok(ids) => ids,
            Err(err) => {
                eprintln!("Error: {}", err);
                return Ok(ExitCode::FAILURE);
            }
        }
    } else {
        match parse_ids(&cli.ids) {
            Ok(ids) => ids,
            Err(message) => {
                eprintln!("Error: {}", message);
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let mut buf = io::BufWriter::new(io::stdout());
    for id in &ids {
        print(&mut buf, cli.f, id)?;
    }
    buf.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn parse_ids(args: &[String]) -> Result<Vec<Ksuid>, String> {
    args.iter()
        .map(|arg| Ksuid::parse(arg).map_err(|err| format!("when parsing '{}': {}", arg, err)))
        .collect()
}

fn print(w: &mut impl Write, format: Format, id: &Ksuid) -> io::Result<()> {
    match format {
        Format::Inspect => writeln!(
            w,
            "REPRESENTATION:\n\n  String: {}\n     Raw: {}\n\nCOMPONENTS:\n\n       Time: {}\n  Timestamp: {}\n    Payload: {}\n",
            id,
            hex::encode_upper(id.as_bytes()),
            format_time(id),
            id.timestamp(),
            hex::encode_upper(id.payload()),
        ),
        Format::Time => writeln!(w, "{}", format_time(id)),
        Format::Timestamp => writeln!(w, "{}", id.timestamp()),
        Format::Payload => w.write_all(id.payload()),
        Format::Raw => w.write_all(id.as_bytes()),
        Format::String => writeln!(w, "{}", id),
    }
}

fn format_time(id: &Ksuid) -> String {
    let time = OffsetDateTime::from(id.time());
    time.format(&Rfc3339)
        .unwrap_or_else(|_| id.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_ids, print, Format};
    use ksuid::Ksuid;

    fn render(format: Format, id: &Ksuid) -> Vec<u8> {
        let mut out = Vec::new();
        print(&mut out, format, id).unwrap();
        out
    }

    /// Prints every format of a known id
    #[test]
    fn prints_every_format_of_a_known_id() {
        let id = Ksuid::parse("0ujtsYcgvSTl8PAuAdqWYSMnLOv").unwrap();

        assert_eq!(render(Format::String, &id), b"0ujtsYcgvSTl8PAuAdqWYSMnLOv\n");
        assert_eq!(render(Format::Timestamp, &id), b"107608047\n");
        assert_eq!(render(Format::Time, &id), b"2017-10-10T04:00:47Z\n");
        assert_eq!(render(Format::Raw, &id), id.as_bytes());
        assert_eq!(render(Format::Payload, &id), id.payload());

        let inspect = String::from_utf8(render(Format::Inspect, &id)).unwrap();
        assert!(inspect.contains("String: 0ujtsYcgvSTl8PAuAdqWYSMnLOv"));
        assert!(inspect.contains("Raw: 0669F7EFB5A1CD34B5F99D1154FB6853345C9735"));
        assert!(inspect.contains("Payload: B5A1CD34B5F99D1154FB6853345C9735"));
    }

    /// Applies the chosen format to generated ids
    #[test]
    fn applies_the_chosen_format_to_generated_ids() {
        let id = Ksuid::new();
        let inspect = String::from_utf8(render(Format::Inspect, &id)).unwrap();
        assert!(inspect.starts_with("REPRESENTATION:"));
        assert!(inspect.contains(&format!("Timestamp: {}", id.timestamp())));
    }

    /// Reports the argument that fails to parse
    #[test]
    fn reports_the_argument_that_fails_to_parse() {
        let args = ["0ujtsYcgvSTl8PAuAdqWYSMnLOv".to_owned(), "bogus".to_owned()];
        let err = parse_ids(&args).unwrap_err();
        assert!(err.contains("'bogus'"));
        assert_eq!(parse_ids(&args[..1]).unwrap().len(), 1);
    }
}
