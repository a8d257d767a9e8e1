use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, trace, warn};
use viewer::{Flow, Game, Size};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::gpu::{FrameCanvas, GpuState};
use crate::input::InputState;
use crate::runtime::TickClock;
use crate::types::{Bitmap, ShaderProgram};

/// Window settings that do not belong to the game itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    pub ticks_per_second: u32,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "shadeview".into(),
            ticks_per_second: viewer::config::DEFAULT_TICKS_PER_SECOND,
        }
    }
}

/// Opens the preview window and runs `game` until it quits or the window is
/// closed. Blocks the calling thread, which must be the main thread on most
/// platforms.
pub fn run(mut game: Game<Bitmap, ShaderProgram>, options: WindowOptions) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let geometry = game.geometry();
    let window = WindowBuilder::new()
        .with_title(&options.title)
        .with_inner_size(LogicalSize::new(geometry.width, geometry.height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let inner = window.inner_size();
    let (width, height) = game.layout(inner.width, inner.height);
    let mut gpu = GpuState::new(Arc::clone(&window), Size::new(width, height))?;
    let mut input = InputState::new();
    let mut clock = TickClock::new(options.ticks_per_second, Instant::now());

    info!(
        width,
        height,
        tps = options.ticks_per_second,
        "preview window open"
    );

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                debug!("window closed");
                elwt.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => input.handle_key(&event),
            WindowEvent::CursorMoved { position, .. } => {
                input.handle_cursor(position.x, position.y, gpu.viewport(), gpu.logical());
            }
            WindowEvent::MouseInput { state, button, .. } => {
                input.handle_mouse_button(button, state);
            }
            WindowEvent::Resized(new_size) => gpu.resize(new_size),
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                if let Err(err) = inner_size_writer.request_inner_size(gpu.size()) {
                    debug!(error = %err, "window kept its new size after a scale change");
                }
            }
            WindowEvent::RedrawRequested => {
                let mut canvas = FrameCanvas::new();
                game.draw(&mut canvas);
                match gpu.render(&canvas.into_commands()) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu.resize(gpu.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; closing preview");
                        elwt.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        trace!("surface timeout; retrying next frame");
                    }
                    Err(other) => {
                        warn!(error = ?other, "surface error; retrying next frame");
                    }
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let due = clock.due_ticks(Instant::now());
            for _ in 0..due {
                let flow = game.update(&input);
                input.end_tick();
                if flow == Flow::Exit {
                    elwt.exit();
                    return;
                }
            }
            if due > 0 {
                window.request_redraw();
            }
            elwt.set_control_flow(ControlFlow::WaitUntil(clock.next_deadline()));
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
