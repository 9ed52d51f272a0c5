use std::path::PathBuf;

use ac_codec::CodecTag;
use ac_core::CodecConfig;
use ac_core::charset::PALETTE_AUTO;
use ac_core::config::{RleMode, UnknownGlyph};
use clap::{Parser, Subcommand};

/// artcodec — codecs sans perte pour l'art en caractères.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Action à exécuter.
    #[command(subcommand)]
    pub command: Command,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

/// Sous-commandes.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode un fichier texte en payload JSON.
    Encode {
        /// Art source, une ligne par rangée.
        #[arg(short, long)]
        input: PathBuf,

        /// Codec : ultraMinimal, delta, rle, bitmap, quadTree.
        #[arg(long, default_value = "ultraMinimal")]
        codec: CodecTag,

        /// Variante RLE : "rows" (marqueur de ligne) ou "continuous".
        #[arg(long)]
        rle_mode: Option<String>,

        /// Palette bitmap : preset, "auto", ou glyphes littéraux.
        #[arg(long)]
        palette: Option<String>,

        /// Refuser les glyphes absents de la palette au lieu de les remplacer.
        #[arg(long, default_value_t = false)]
        strict_palette: bool,

        /// Fichier de sortie. Défaut : stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Décode un payload, un tableau de payloads, ou une animation.
    Decode {
        /// Fichier JSON.
        #[arg(short, long)]
        input: PathBuf,

        /// Fichier de sortie. Défaut : stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Valide sans décoder ; affiche `{valid, reason}` par entrée.
    Validate {
        /// Fichier JSON.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compare la taille de chaque codec sur un fichier texte.
    Analyze {
        /// Art source, une ligne par rangée.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Décode un flux NDJSON (fichier ou stdin).
    Stream {
        /// Fichier NDJSON. Défaut : stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

impl Command {
    /// Apply encode flags over the loaded configuration.
    pub fn apply_overrides(&self, config: &mut CodecConfig) {
        let Self::Encode {
            rle_mode,
            palette,
            strict_palette,
            ..
        } = self
        else {
            return;
        };

        if let Some(mode) = rle_mode {
            config.rle_mode = match mode.as_str() {
                "rows" | "row" => RleMode::RowDelimited,
                "continuous" => RleMode::Continuous,
                _ => {
                    log::warn!("Variante RLE inconnue '{mode}', utilisation du défaut.");
                    config.rle_mode
                }
            };
        }
        if let Some(palette) = palette {
            if palette.is_empty() {
                log::warn!("Palette vide ignorée, utilisation de '{PALETTE_AUTO}'.");
                PALETTE_AUTO.clone_into(&mut config.bitmap_palette);
            } else {
                config.bitmap_palette.clone_from(palette);
            }
        }
        if *strict_palette {
            config.bitmap_unknown = UnknownGlyph::Reject;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_flags_parse() {
        let cli = Cli::try_parse_from([
            "artcodec", "encode", "-i", "art.txt", "--codec", "rle", "--rle-mode", "continuous",
        ])
        .unwrap();
        let Command::Encode { codec, rle_mode, .. } = &cli.command else {
            panic!("encode attendu");
        };
        assert_eq!(*codec, CodecTag::Rle);
        assert_eq!(rle_mode.as_deref(), Some("continuous"));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn unknown_codec_is_rejected_by_clap() {
        let err = Cli::try_parse_from(["artcodec", "encode", "-i", "a.txt", "--codec", "pattern"]);
        assert!(err.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "artcodec", "decode", "-i", "p.json", "--log-level", "debug", "--config", "x.toml",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn stream_input_is_optional() {
        let cli = Cli::try_parse_from(["artcodec", "stream"]).unwrap();
        assert!(matches!(cli.command, Command::Stream { input: None }));
    }

    #[test]
    fn overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "artcodec", "encode", "-i", "a.txt", "--codec", "bitmap", "--rle-mode", "continuous",
            "--palette", "blocks", "--strict-palette",
        ])
        .unwrap();
        let mut config = CodecConfig::default();
        cli.command.apply_overrides(&mut config);
        assert_eq!(config.rle_mode, RleMode::Continuous);
        assert_eq!(config.bitmap_palette, "blocks");
        assert_eq!(config.bitmap_unknown, UnknownGlyph::Reject);
    }

    #[test]
    fn unknown_rle_mode_keeps_config() {
        let cli =
            Cli::try_parse_from(["artcodec", "encode", "-i", "a.txt", "--rle-mode", "zigzag"]).unwrap();
        let mut config = CodecConfig {
            rle_mode: RleMode::Continuous,
            ..CodecConfig::default()
        };
        cli.command.apply_overrides(&mut config);
        assert_eq!(config.rle_mode, RleMode::Continuous);
    }
}
