//! Soundtrack post-processing.
//!
//! Extracted music comes out as one `.jaga` index per track plus a pile
//! of numbered Ogg chunk files. The index embeds the first Ogg stream
//! directly and lists the chunk files holding the rest, so a complete
//! track is the embedded stream followed by each chunk in order. The
//! actual joining is delegated to `sox`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use byteorder::{BigEndian, ReadBytesExt};
use clap::Args;
use tracing::{info, warn};

/// First page of an Ogg stream, big-endian `OggS`.
const OGG_MAGIC: u32 = 0x4f67_6753;
/// Bytes of track metadata preceding the chunk list.
const INDEX_HEADER_LENGTH: u64 = 32;

/// Arguments for the `combine-sounds` subcommand.
#[derive(Args)]
pub struct SoundsArgs {
    /// Directory holding the extracted music category
    #[arg(long, default_value = "cache/40")]
    pub input: PathBuf,

    /// Directory the combined tracks are written under
    #[arg(long, default_value = "cache")]
    pub output: PathBuf,

    /// Combine tracks even when some chunk files are missing
    #[arg(long)]
    pub include_incomplete: bool,
}

/// A parsed `.jaga` soundtrack index.
struct SoundtrackIndex {
    chunk_ids: Vec<u32>,
    embedded_ogg: Vec<u8>,
}

/// Reads the chunk list and the embedded Ogg stream from an index.
///
/// After the fixed header the index alternates marker and chunk-id
/// words until the marker is the start of the embedded stream itself.
fn parse_index<R: Read + Seek>(reader: &mut R) -> anyhow::Result<SoundtrackIndex> {
    reader.seek(SeekFrom::Start(INDEX_HEADER_LENGTH))?;

    let mut chunk_ids = Vec::new();
    loop {
        let marker = reader.read_u32::<BigEndian>()?;
        if marker == OGG_MAGIC {
            break;
        }
        chunk_ids.push(reader.read_u32::<BigEndian>()?);
    }

    // The magic word just consumed is part of the stream.
    let mut embedded_ogg = OGG_MAGIC.to_be_bytes().to_vec();
    reader.read_to_end(&mut embedded_ogg)?;

    Ok(SoundtrackIndex {
        chunk_ids,
        embedded_ogg,
    })
}

fn combine(track_id: u32, index: &SoundtrackIndex, args: &SoundsArgs, out_dir: &Path) -> anyhow::Result<()> {
    let mut parts = Vec::with_capacity(index.chunk_ids.len());
    let mut missing = Vec::new();
    for chunk_id in &index.chunk_ids {
        let path = args.input.join(format!("{chunk_id}.ogg"));
        if path.exists() {
            parts.push(path);
        } else {
            missing.push(*chunk_id);
        }
    }
    if !missing.is_empty() {
        if !args.include_incomplete {
            warn!(track_id, ?missing, "skipping incomplete track");
            return Ok(());
        }
        warn!(track_id, ?missing, "combining without missing chunks");
    }

    // The embedded stream leads the track; hand it to sox as a file.
    let mut head = tempfile::Builder::new()
        .prefix("rt5-track-")
        .suffix(".ogg")
        .tempfile()
        .context("creating a temporary file for the embedded stream")?;
    head.write_all(&index.embedded_ogg)?;
    head.flush()?;

    let target = out_dir.join(format!("{track_id}.ogg"));
    let status = Command::new("sox")
        .arg("--combine")
        .arg("concatenate")
        .arg(head.path())
        .args(&parts)
        .arg(&target)
        .status()
        .context("running sox; is it installed?")?;
    if !status.success() {
        bail!("sox failed with {status} on track {track_id}");
    }

    info!(track_id, target = %target.display(), chunks = parts.len(), "combined track");
    Ok(())
}

pub fn run(args: SoundsArgs) -> anyhow::Result<()> {
    let out_dir = args.output.join("soundtrack");
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut combined = 0usize;
    for entry in std::fs::read_dir(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?
    {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "jaga") {
            continue;
        }
        let track_id: u32 = match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => match stem.parse() {
                Ok(id) => id,
                Err(_) => continue,
            },
            None => continue,
        };

        let mut file = File::open(&path)?;
        let index = parse_index(&mut file)
            .with_context(|| format!("parsing {}", path.display()))?;
        combine(track_id, &index, &args, &out_dir)?;
        combined += 1;
    }

    println!("{combined} tracks processed into {}", out_dir.display());
    Ok(())
}
