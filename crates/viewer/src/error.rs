use liveasset::AssetError;

/// Fatal problems detected while bringing up a [`crate::Game`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("too many images: {count} given, at most {max} are supported", max = crate::config::MAX_IMAGES)]
    TooManyImages { count: usize },
    #[error("a shader file is required")]
    MissingShader,
    #[error("invalid geometry '{value}': expected WIDTHxHEIGHT with both sides greater than zero")]
    Geometry { value: String },
    #[error("invalid position '{value}': expected XxY")]
    Position { value: String },
    #[error("ticks per second must be greater than zero")]
    TicksPerSecond,
    #[error("failed to load {role}")]
    Asset {
        role: AssetRole,
        #[source]
        source: AssetError,
    },
}

/// What a live asset is used for; only shows up in messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetRole {
    Image(usize),
    Shader,
    Background,
}

impl std::fmt::Display for AssetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetRole::Image(index) => write!(f, "image {index}"),
            AssetRole::Shader => f.write_str("shader"),
            AssetRole::Background => f.write_str("background"),
        }
    }
}
