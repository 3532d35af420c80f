use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use tilepick_tile_utils::{Point, TilePosition};

use crate::config::Config;

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, PartialEq)]
#[command(
    about,
    version,
    after_help = "Events are printed to stdout as JSON lines, logs go to stderr. Use RUST_LOG to control the log level, e.g. RUST_LOG=tilepick=debug, and TILEPICK_FORMAT to pick the log format (full, compact, bare, pretty, json).",
    styles = HELP_STYLES
)]
pub struct Args {
    #[command(flatten)]
    pub meta: MetaArgs,
    #[command(flatten)]
    pub view: ViewArgs,
}

// None of these params will be transferred to the config
#[derive(Parser, Debug, Clone, PartialEq, Default)]
pub struct MetaArgs {
    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Save resulting config to a file or use "-" to print to stdout.
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ViewArgs {
    /// Source tile to draw, as z/x/y.
    #[arg(short, long, value_parser = TilePosition::parse_zxy)]
    pub tile: TilePosition,
    /// Map zoom to draw the tile at. Deeper than the tile zoom only when the layer overzooms.
    #[arg(short, long)]
    pub zoom: Option<u8>,
    /// Click at X,Y pixels inside the drawn tile.
    #[arg(long, value_parser = parse_point)]
    pub click: Option<Point>,
    /// Write the drawn tile to this SVG file.
    #[arg(long)]
    pub svg: Option<PathBuf>,
    /// Tile URL template with {z}, {x} and {y} placeholders. Overrides the config file.
    #[arg(short, long)]
    pub url: Option<String>,
    /// Pixel size of a rendered tile. Overrides the config file.
    #[arg(long)]
    pub tile_size: Option<u32>,
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("'{value}' is not an X,Y pixel position"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{v}' is not a number"))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

impl Args {
    /// Applies command line overrides on top of `config`.
    pub fn merge_into_config(&self, config: &mut Config) {
        if self.view.url.is_some() {
            config.source.url.clone_from(&self.view.url);
        }
        if self.view.tile_size.is_some() {
            config.layer.tile_size = self.view.tile_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("tilepick").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_full() {
        let args = parse(&[
            "--config",
            "c.yaml",
            "--tile",
            "5/1/2",
            "--zoom",
            "7",
            "--click",
            "128, 64.5",
            "--svg",
            "out.svg",
            "--save-config",
            "-",
        ])
        .unwrap();
        assert_eq!(
            args,
            Args {
                meta: MetaArgs {
                    config: Some(PathBuf::from("c.yaml")),
                    save_config: Some(PathBuf::from("-")),
                },
                view: ViewArgs {
                    tile: TilePosition::new(1, 2, 5),
                    zoom: Some(7),
                    click: Some(Point::new(128.0, 64.5)),
                    svg: Some(PathBuf::from("out.svg")),
                    url: None,
                    tile_size: None,
                },
            }
        );
    }

    #[test]
    fn test_tile_is_required() {
        assert!(parse(&["--config", "c.yaml"]).is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse(&["--tile", "5/40/2"]).is_err());
        assert!(parse(&["--tile", "1:2:5"]).is_err());
        assert!(parse(&["--tile", "5/1/2", "--click", "12"]).is_err());
        assert!(parse(&["--tile", "5/1/2", "--click", "a,b"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&["-t", "5/1/2", "-u", "/{z}/{x}/{y}", "--tile-size", "512"]).unwrap();
        let mut config = Config::default();
        config.source.url = Some("/old/{z}/{x}/{y}".to_string());
        args.merge_into_config(&mut config);
        assert_eq!(config.source.url.as_deref(), Some("/{z}/{x}/{y}"));
        assert_eq!(config.layer.tile_size, Some(512));
    }
}
