use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use clap::Parser;
use ign_converter::{Context, Document, FsMap, Registry, document, fsmap, registry};
use ign_telemetry::{TelemetryOptions, Tracing};
use ign_version::SpecVersion;
use snafu::{ResultExt, Snafu, ensure};
use tracing::info;

const APP_NAME: &str = "ign-converter";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize tracing"))]
    InitTracing { source: ign_telemetry::tracing::Error },

    #[snafu(display("failed to read config from stdin"))]
    ReadStdin { source: io::Error },

    #[snafu(display("failed to read config from {path:?}"))]
    ReadInput { source: io::Error, path: PathBuf },

    #[snafu(display("failed to load filesystem mapping"))]
    LoadFsMap { source: fsmap::Error },

    #[snafu(display("failed to load input config"))]
    LoadDocument { source: document::Error },

    #[snafu(display("cannot {direction} a spec {from} config to spec {to}"))]
    WrongDirection {
        direction: Direction,
        from: SpecVersion,
        to: SpecVersion,
    },

    #[snafu(display("failed to translate config"))]
    Translate { source: registry::Error },

    #[snafu(display("failed to encode translated config"))]
    EncodeDocument { source: document::Error },

    #[snafu(display("failed to write config to stdout"))]
    WriteStdout { source: io::Error },

    #[snafu(display("failed to write config to {path:?}"))]
    WriteOutput { source: io::Error, path: PathBuf },
}

#[derive(Clone, Copy, Debug, strum::Display)]
#[strum(serialize_all = "lowercase")]
enum Direction {
    Upgrade,
    Downgrade,
}

/// Translates Ignition configs between spec versions.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Read the config from FILE instead of stdin.
    #[arg(long, env = "IGN_CONVERTER_INPUT", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the translated config to FILE instead of stdout.
    #[arg(long, env = "IGN_CONVERTER_OUTPUT", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Mapping from 2.x filesystem names to mount paths, one `<name> <path>`
    /// pair per line. Only used when upgrading.
    #[arg(
        long,
        env = "IGN_CONVERTER_FSMAP",
        value_name = "FILE",
        conflicts_with = "downtranslate"
    )]
    fsmap: Option<PathBuf>,

    /// Translate to an older spec version.
    #[arg(long)]
    downtranslate: bool,

    /// Spec version to translate to [default: 3.1.0, or 2.4.0 with
    /// --downtranslate].
    #[arg(long, env = "IGN_CONVERTER_TARGET_VERSION", value_name = "VERSION")]
    target_version: Option<SpecVersion>,

    #[command(flatten)]
    telemetry: TelemetryOptions,
}

impl Args {
    fn direction(&self) -> Direction {
        if self.downtranslate {
            Direction::Downgrade
        } else {
            Direction::Upgrade
        }
    }

    fn target(&self) -> SpecVersion {
        self.target_version.unwrap_or(match self.direction() {
            Direction::Upgrade => SpecVersion::V3_1,
            Direction::Downgrade => SpecVersion::V2_4,
        })
    }
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let args = Args::parse();
    let direction = args.direction();
    let to = args.target();

    let _tracing = Tracing::pre_configured(APP_NAME, args.telemetry)
        .init()
        .context(InitTracingSnafu)?;

    let raw = match &args.input {
        Some(path) => fs::read(path).context(ReadInputSnafu { path })?,
        None => {
            let mut raw = Vec::new();
            io::stdin().read_to_end(&mut raw).context(ReadStdinSnafu)?;
            raw
        }
    };
    let fs_map = match &args.fsmap {
        Some(path) => FsMap::from_file(path).context(LoadFsMapSnafu)?,
        None => FsMap::new(),
    };

    let (document, _) = Document::parse(&raw).context(LoadDocumentSnafu)?;
    let from = document.version();
    ensure!(
        match direction {
            Direction::Upgrade => from <= to,
            Direction::Downgrade => from >= to,
        },
        WrongDirectionSnafu {
            direction,
            from,
            to
        }
    );

    info!(%from, %to, %direction, "translating config");
    let translated = Registry::default()
        .translate(document, to, &Context::new(fs_map))
        .context(TranslateSnafu)?;
    let mut encoded = translated.to_json().context(EncodeDocumentSnafu)?;
    encoded.push(b'\n');

    match &args.output {
        Some(path) => fs::write(path, &encoded).context(WriteOutputSnafu { path })?,
        None => io::stdout()
            .lock()
            .write_all(&encoded)
            .context(WriteStdoutSnafu)?,
    }
    Ok(())
}
