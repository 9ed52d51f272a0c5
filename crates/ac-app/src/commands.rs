use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use ac_codec::analyze::{analyze, best};
use ac_codec::batch::{Animation, decode_batch};
use ac_codec::stream::StreamDecoder;
use ac_codec::{CodecTag, Decoded, DecoderRegistry, encode_payload, validate_with};
use ac_core::{CodecConfig, Grid};
use anyhow::{Context, Result};
use serde_json::Value;

/// Taille des lectures en mode flux.
const STREAM_CHUNK: usize = 8 * 1024;

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Impossible de lire {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("JSON invalide dans {}", path.display()))
}

fn read_grid(path: &Path) -> Result<Grid> {
    Grid::parse(&read_text(path)?).with_context(|| format!("Art vide ou invalide : {}", path.display()))
}

/// Write to `output`, or stdout when absent.
fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Impossible d'écrire {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Registre standard borné par `config.max_cells`.
fn bounded_registry(config: &CodecConfig) -> DecoderRegistry {
    DecoderRegistry::standard().with_max_cells(config.max_cells)
}

fn render(decoded: &Decoded) -> String {
    decoded.lines().join("\n")
}

/// Encode a text file with `codec`.
///
/// # Errors
/// Returns an error on IO failure or if the encoder rejects the grid.
pub fn encode(
    input: &Path,
    codec: CodecTag,
    output: Option<&Path>,
    config: &CodecConfig,
) -> Result<()> {
    let grid = read_grid(input)?;
    let payload = encode_payload(codec, &grid, None, config)
        .with_context(|| format!("Encodage {codec} impossible"))?;
    log::info!(
        "{} : {}×{} encodé en {codec}",
        input.display(),
        grid.width(),
        grid.height()
    );
    emit(output, &serde_json::to_string(&payload)?)
}

/// Decoded frames of `value`: one payload or image export, an array, or an animation.
fn decode_any(value: &Value, config: &CodecConfig) -> Result<Vec<Decoded>> {
    let registry = bounded_registry(config);
    let results = match value {
        Value::Array(items) => decode_batch(&registry, items, config.batch_parallel),
        Value::Object(obj) if obj.contains_key("frames") => {
            let animation: Animation =
                serde_json::from_value(value.clone()).context("Animation invalide")?;
            animation.decode(&registry, config.batch_parallel)
        }
        single => return Ok(vec![registry.decode_value(single)?]),
    };

    let mut frames = Vec::with_capacity(results.len());
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(decoded) => frames.push(decoded),
            Err(e) => log::warn!("Entrée {i} ignorée : {e}"),
        }
    }
    Ok(frames)
}

/// Decode a JSON file and print its rows, frames separated by a blank line.
///
/// # Errors
/// Returns an error on IO failure, or if a single payload fails to decode.
pub fn decode(input: &Path, output: Option<&Path>, config: &CodecConfig) -> Result<()> {
    let value = read_json(input)?;
    let frames = decode_any(&value, config)?;
    let text = frames.iter().map(render).collect::<Vec<_>>().join("\n\n");
    emit(output, &text)
}

/// Print one `{valid, reason}` line per entry.
///
/// # Errors
/// Returns an error on IO failure or if the file is not JSON.
pub fn validate_file(input: &Path, config: &CodecConfig) -> Result<()> {
    let value = read_json(input)?;
    let entries: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    let mut out = String::new();
    for entry in entries {
        writeln!(out, "{}", serde_json::to_string(&validate_with(entry, config.max_cells))?)?;
    }
    print!("{out}");
    Ok(())
}

/// Print the compression report for a text file.
///
/// # Errors
/// Returns an error on IO failure or if an encoder rejects the grid.
pub fn analyze_file(input: &Path, config: &CodecConfig) -> Result<()> {
    let grid = read_grid(input)?;
    let reports = analyze(&grid, config)?;

    let mut out = String::new();
    writeln!(out, "{:<14}{:>10}{:>10}  sans perte", "codec", "octets", "ratio")?;
    for r in &reports {
        writeln!(
            out,
            "{:<14}{:>10}{:>9.1}%  {}",
            r.codec.name(),
            r.size,
            r.ratio,
            if r.lossless { "oui" } else { "non" }
        )?;
    }
    if let Some(b) = best(&reports) {
        writeln!(out, "meilleur : {}", b.codec)?;
    }
    print!("{out}");
    Ok(())
}

/// Decode NDJSON from `input` (or stdin) as it arrives.
///
/// # Errors
/// Returns an error if the input cannot be opened or read.
pub fn stream(input: Option<&Path>, config: &CodecConfig) -> Result<()> {
    let mut reader: Box<dyn Read> = match input {
        Some(path) => Box::new(
            std::fs::File::open(path)
                .with_context(|| format!("Impossible d'ouvrir {}", path.display()))?,
        ),
        None => Box::new(std::io::stdin().lock()),
    };

    let registry = bounded_registry(config);
    let mut decoder = StreamDecoder::with_max_buffer(&registry, config.stream_max_buffer);
    let mut chunk = vec![0u8; STREAM_CHUNK];
    loop {
        let n = reader.read(&mut chunk).context("Lecture du flux")?;
        if n == 0 {
            break;
        }
        for frame in decoder.feed(&chunk[..n]) {
            println!("{}\n", render(&frame));
        }
    }
    if let Some(frame) = decoder.finish() {
        println!("{}\n", render(&frame));
    }
    if decoder.skipped() > 0 {
        log::warn!("{} ligne(s) du flux ignorée(s)", decoder.skipped());
    }
    Ok(())
}
