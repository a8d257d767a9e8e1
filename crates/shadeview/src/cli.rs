use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use viewconfig::FileConfig;

#[derive(Parser, Debug)]
#[command(
    name = "shadeview",
    author,
    version,
    about = "Preview a fragment shader over images, reloading on every save",
    disable_version_flag = true
)]
pub struct Cli {
    /// Config file to load instead of the discovered ones.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Foreground image bound to the next shader slot (repeat up to 4 times).
    #[arg(short = 'i', long = "image", value_name = "FILE", action = ArgAction::Append)]
    pub images: Vec<PathBuf>,

    /// Fragment shader to preview.
    #[arg(short = 's', long, value_name = "FILE")]
    pub shader: Option<PathBuf>,

    /// Logical screen size when no image dictates one.
    #[arg(short = 'g', long, value_name = "WIDTHxHEIGHT")]
    pub geometry: Option<String>,

    /// Offset of the shaded rectangle on the logical screen.
    #[arg(short = 'p', long, value_name = "XxY", allow_hyphen_values = true)]
    pub position: Option<String>,

    /// Image drawn behind the shader, stretched over the screen.
    #[arg(short = 'b', long, value_name = "FILE")]
    pub background: Option<PathBuf>,

    /// Update ticks per second.
    #[arg(short = 't', long, value_name = "N")]
    pub tps: Option<u32>,

    /// Shader name of the toggle flag uniform (empty disables it).
    #[arg(long, value_name = "NAME")]
    pub map_flag: Option<String>,

    /// Shader name of the tick counter uniform (empty disables it).
    #[arg(long, value_name = "NAME")]
    pub map_ticks: Option<String>,

    /// Shader name of the elapsed seconds uniform (empty disables it).
    #[arg(long, value_name = "NAME")]
    pub map_time: Option<String>,

    /// Shader name of the cursor position uniform (empty disables it).
    #[arg(long, value_name = "NAME")]
    pub map_mouse: Option<String>,

    /// Shader name of the slider uniform (empty disables it).
    #[arg(long, value_name = "NAME")]
    pub map_slider: Option<String>,

    /// How often watched files are checked for changes (e.g. `250ms`, `1s`).
    #[arg(long, value_name = "DURATION", value_parser = viewconfig::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Emit debug logs, including the uniform values after each input.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    /// The command line as the topmost config layer.
    pub fn into_layer(self) -> FileConfig {
        FileConfig {
            image: (!self.images.is_empty()).then_some(self.images),
            shader: self.shader,
            background: self.background,
            geometry: self.geometry,
            position: self.position,
            tps: self.tps,
            map_flag: self.map_flag,
            map_ticks: self.map_ticks,
            map_time: self.map_time,
            map_mouse: self.map_mouse,
            map_slider: self.map_slider,
            debug: self.debug.then_some(true),
            poll_interval: self.poll_interval,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
