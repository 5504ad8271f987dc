use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use cgmath::Vector2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::{
    assets::{self, AssetError, ModelData},
    gfx::{camera::OrthoCamera, render_engine::RenderEngine, scene::Scene},
    interaction::InteractionController,
    ui::{TrashCan, UiManager},
};

pub struct ChinchillaApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    controller: InteractionController,
    trash_can: TrashCan,
    model_rx: Option<Receiver<Result<ModelData, AssetError>>>,
    last_tick: Instant,
}

impl ChinchillaApp {
    /// Creates the application: validates the trash style, kicks off the
    /// background asset load, and prepares the scene.
    ///
    /// A malformed trash style is the one fatal setup error — without the
    /// pixel geometry there is nothing to hit-test against.
    pub fn new() -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;

        let trash_can = TrashCan::new()?;
        let controller = InteractionController::new(trash_can.geometry());
        let scene = Scene::new(OrthoCamera::new(1200, 800));
        let model_rx = assets::load_in_background(assets::MODEL_BASE_PATH);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                controller,
                trash_can,
                model_rx: Some(model_rx),
                last_tick: Instant::now(),
            },
        })
    }

    /// Runs the application (consumes self and starts the event loop).
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

impl AppState {
    fn viewport(&self) -> Vector2<f32> {
        match self.window.as_ref() {
            Some(window) => {
                let size = window.inner_size();
                Vector2::new(size.width as f32, size.height as f32)
            }
            None => Vector2::new(1.0, 1.0),
        }
    }

    /// Polls the asset channel; installs the chinchilla once its data
    /// arrives. A load failure leaves the scene inert for good.
    fn poll_model(&mut self) {
        let Some(rx) = self.model_rx.as_ref() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(model)) => {
                let object = self.scene.install_chinchilla(model);
                if let Some(engine) = self.render_engine.as_ref() {
                    engine.prepare_object(object);
                }
                self.controller.mark_ready();
                self.model_rx = None;
                log::info!("chinchilla ready");
            }
            Ok(Err(error)) => {
                log::error!("model load failed, scene stays empty: {error}");
                self.model_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                log::error!("model loader vanished without an answer");
                self.model_rx = None;
            }
        }
    }

    /// One display-refresh tick: advance the controller, write the rig
    /// into the scene, render, overlay the trash can.
    fn advance_frame(&mut self) {
        self.poll_model();

        let now = Instant::now();
        let delta = (now - self.last_tick).as_secs_f32();
        self.last_tick = now;

        self.controller
            .tick(delta, now, self.scene.camera.projection());
        self.scene.apply_rig(self.controller.rig());
        self.scene.update();

        let viewport = self.viewport();
        let visual = self.controller.trash_visual();

        let Some(window) = self.window.as_ref() else {
            return;
        };
        window.set_cursor(self.controller.cursor());
        let window_handle = window.clone();

        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };

        if let Some(object) = self.scene.chinchilla.as_mut() {
            object.update_transform(engine.queue());
        }
        engine.update(self.scene.camera.uniform);

        let trash_can = &self.trash_can;
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            engine.render_frame(
                &self.scene,
                Some(|device: &wgpu::Device,
                      queue: &wgpu::Queue,
                      encoder: &mut wgpu::CommandEncoder,
                      color_attachment: &wgpu::TextureView| {
                    ui_manager.draw(
                        device,
                        queue,
                        encoder,
                        &window_handle,
                        color_attachment,
                        |ui| trash_can.draw(ui, [viewport.x, viewport.y], visual),
                    );
                }),
            );
        } else {
            engine.render_frame(
                &self.scene,
                None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
            );
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("chinchilla")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            self.scene.camera.resize_projection(width, height);

            let window_clone = window_handle.clone();
            let renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height).await
            });

            // The model may have arrived before the GPU was ready.
            if let Some(object) = self.scene.chinchilla.as_mut() {
                renderer.prepare_object(object);
            }

            let ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window_handle,
            );

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(renderer);
            self.last_tick = Instant::now();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            // The overlay has no interactive widgets; imgui only needs to
            // track display and mouse state.
            ui_manager.handle_input(window, &ui_event);
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pointer = Vector2::new(position.x as f32, position.y as f32);
                self.controller.on_pointer_move(
                    pointer,
                    self.viewport(),
                    self.scene.camera.projection(),
                    &self.scene,
                );
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.controller.on_press(&self.scene),
                ElementState::Released => self.controller.on_release(Instant::now()),
            },
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width == 0 || height == 0 {
                    return;
                }
                self.scene.camera.resize_projection(width, height);
                if let Some(engine) = self.render_engine.as_mut() {
                    engine.resize(width, height);
                }
                // Style values are re-derived on every resize; a table that
                // stops parsing here is unrecoverable.
                self.trash_can
                    .refresh_geometry()
                    .expect("trash can styles must use pixels");
                self.controller.set_trash_geometry(self.trash_can.geometry());
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.advance_frame();
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
