use std::path::Path;
use std::sync::Arc;

use liveasset::{AssetError, DecodeFn, LiveAsset, WatchOptions};
use tracing::{debug, info, warn};

use crate::config::{Size, ViewerConfig};
use crate::error::{AssetRole, InitError};
use crate::input::{InputAction, InputController, InputSource};
use crate::log::LogSink;
use crate::uniforms::{ImageSize, UniformBinder, UniformFrame};

/// The slider moves in tenths; it is stored as a step count so that ten
/// increments land exactly on 1.0.
pub const SLIDER_STEPS: u8 = 10;

/// Interactive state mutated once per tick on the render thread.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameState {
    cursor: (f64, f64),
    ticks: u64,
    slider_steps: u8,
    flag: i32,
}

impl GameState {
    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    pub fn set_cursor(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn slider(&self) -> f32 {
        f32::from(self.slider_steps) / f32::from(SLIDER_STEPS)
    }

    pub fn slider_up(&mut self) {
        self.slider_steps = (self.slider_steps + 1).min(SLIDER_STEPS);
    }

    pub fn slider_down(&mut self) {
        self.slider_steps = self.slider_steps.saturating_sub(1);
    }

    pub fn flag(&self) -> i32 {
        self.flag
    }

    pub fn toggle_flag(&mut self) {
        self.flag = 1 - self.flag;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Running,
    Terminated,
}

/// What the host loop should do after an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Decoders for the two kinds of assets the viewer loads.
pub struct Codecs<I, S> {
    pub image: DecodeFn<I>,
    pub shader: DecodeFn<S>,
}

impl<I, S> Clone for Codecs<I, S> {
    fn clone(&self) -> Self {
        Self {
            image: Arc::clone(&self.image),
            shader: Arc::clone(&self.shader),
        }
    }
}

/// One rectangle shaded by the user program.
pub struct RectShader<'a, I, S> {
    pub shader: Arc<S>,
    pub uniforms: &'a UniformFrame,
    pub images: &'a [Arc<I>],
}

/// Draw primitive provided by the host.
pub trait Canvas {
    type Image;
    type Shader;

    /// Draws `image` stretched over the whole logical screen.
    fn draw_image(&mut self, image: &Arc<Self::Image>);

    /// Runs the shader over `uniforms.bounds()` shifted by `uniforms.translation()`.
    fn draw_rect_shader(&mut self, draw: RectShader<'_, Self::Image, Self::Shader>);
}

/// Orchestrates assets, input and uniforms across the host's
/// update/draw/layout callbacks.
pub struct Game<I, S> {
    images: Vec<LiveAsset<I>>,
    shader: LiveAsset<S>,
    background: Option<LiveAsset<I>>,
    binder: UniformBinder,
    controller: InputController,
    state: GameState,
    geometry: Size,
    phase: Phase,
    log: LogSink,
}

impl<I, S> Game<I, S>
where
    I: ImageSize + Send + Sync + 'static,
    S: Send + Sync + 'static,
{
    /// Validates `config`, loads every asset and resolves the screen geometry.
    ///
    /// Nothing is read from disk unless the config passes validation.
    pub fn init(config: &ViewerConfig, codecs: Codecs<I, S>, log: LogSink) -> Result<Self, InitError> {
        log.scoped(|| Self::init_scoped(config, codecs, log.clone()))
    }

    fn init_scoped(config: &ViewerConfig, codecs: Codecs<I, S>, log: LogSink) -> Result<Self, InitError> {
        let validated = config.validate()?;

        let mut options = WatchOptions::default().with_poll_interval(config.poll_interval);
        if let Some(dispatch) = log.dispatch() {
            options = options.with_dispatch(dispatch.clone());
        }

        let images = config
            .images
            .iter()
            .enumerate()
            .map(|(index, path)| open(path, &codecs.image, &options, AssetRole::Image(index)))
            .collect::<Result<Vec<_>, _>>()?;
        let shader = open(&config.shader, &codecs.shader, &options, AssetRole::Shader)?;
        let background = config
            .background
            .as_deref()
            .map(|path| open(path, &codecs.image, &options, AssetRole::Background))
            .transpose()?;

        let configured = validated.geometry;
        let geometry = match (images.first(), &background) {
            (Some(first), _) => {
                let size = first.value().size();
                if size.width > configured.width {
                    size
                } else {
                    configured
                }
            }
            (None, Some(background)) => background.value().size(),
            (None, None) => configured,
        };

        info!(
            images = images.len(),
            background = background.is_some(),
            width = geometry.width,
            height = geometry.height,
            tps = config.ticks_per_second,
            "viewer initialised"
        );

        let binder = UniformBinder::new(
            &config.uniforms,
            config.ticks_per_second,
            geometry,
            validated.position,
        );

        Ok(Self {
            images,
            shader,
            background,
            binder,
            controller: InputController::new(),
            state: GameState::default(),
            geometry,
            phase: Phase::Ready,
            log,
        })
    }

    /// Advances the game by one tick.
    pub fn update(&mut self, input: &dyn InputSource) -> Flow {
        if self.phase == Phase::Terminated {
            return Flow::Exit;
        }
        self.phase = Phase::Running;
        let log = self.log.clone();
        log.scoped(|| self.update_scoped(input))
    }

    fn update_scoped(&mut self, input: &dyn InputSource) -> Flow {
        self.report_reload_errors();

        let action = self.controller.poll(input, &mut self.state);
        match action {
            Some(InputAction::Quit) => {
                info!(ticks = self.state.ticks(), "quit requested");
                self.phase = Phase::Terminated;
                return Flow::Exit;
            }
            Some(action) => {
                let frame = self.frame();
                debug!(?action, uniforms = %frame.summary(), "input");
            }
            None => {}
        }

        let (x, y) = input.cursor_position();
        self.state.set_cursor(x, y);
        self.state.tick();
        Flow::Continue
    }

    fn report_reload_errors(&self) {
        let roles = self
            .images
            .iter()
            .enumerate()
            .map(|(index, asset)| (AssetRole::Image(index), asset.error()))
            .chain(std::iter::once((AssetRole::Shader, self.shader.error())))
            .chain(
                self.background
                    .iter()
                    .map(|asset| (AssetRole::Background, asset.error())),
            );
        for (role, error) in roles {
            if let Some(error) = error {
                warn!(asset = %role, %error, "reload failed; using previous version");
            }
        }
    }

    /// Uniforms for the current state and the images as they are right now.
    pub fn frame(&self) -> UniformFrame {
        self.binder.generate_frame(&self.state, &self.image_values())
    }

    fn image_values(&self) -> Vec<Arc<I>> {
        self.images.iter().map(LiveAsset::value).collect()
    }

    /// Issues this frame's draw calls. Does not mutate anything.
    pub fn draw<C>(&self, canvas: &mut C)
    where
        C: Canvas<Image = I, Shader = S>,
    {
        if let Some(background) = &self.background {
            canvas.draw_image(&background.value());
        }
        let images = self.image_values();
        let uniforms = self.binder.generate_frame(&self.state, &images);
        canvas.draw_rect_shader(RectShader {
            shader: self.shader.value(),
            uniforms: &uniforms,
            images: &images,
        });
    }

    /// Logical screen size; independent of the host window.
    pub fn layout(&self, _host_width: u32, _host_height: u32) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }
}

impl<I, S> Game<I, S> {
    pub fn geometry(&self) -> Size {
        self.geometry
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn binder(&self) -> &UniformBinder {
        &self.binder
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }
}

fn open<T>(
    path: &Path,
    decode: &DecodeFn<T>,
    options: &WatchOptions,
    role: AssetRole,
) -> Result<LiveAsset<T>, InitError>
where
    T: Send + Sync + 'static,
{
    let decode = Arc::clone(decode);
    LiveAsset::open_with(path, move |bytes: &[u8]| decode(bytes), options.clone()).map_err(
        |source: AssetError| InitError::Asset { role, source },
    )
}
