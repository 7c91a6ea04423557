use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::window::WindowBuilder;

pub struct GpuContext {
    #[allow(dead_code)]
    pub adapter: wgpu::Adapter,
    pub queue: wgpu::Queue,
    pub device: wgpu::Device,
}

impl GpuContext {
    pub async fn new_for_offscreen() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .context("no suitable GPU adapter found")?;
        Self::with_adapter(adapter).await
    }

    async fn with_adapter(adapter: wgpu::Adapter) -> Result<Self> {
        debug!("using adapter '{}'", adapter.get_info().name);
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await?;
        Ok(GpuContext {
            adapter,
            queue,
            device,
        })
    }
}

/// Onscreen surface state. Only created when the renderer runs with a
/// visible window; the render pipeline itself is identical either way.
pub struct WindowState {
    event_loop: EventLoop<()>,
    #[allow(dead_code)]
    window: Arc<winit::window::Window>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

pub enum WindowTarget {
    Offscreen,
    Windowed(WindowState),
}

impl WindowTarget {
    /// Drains pending window events so the window stays responsive between
    /// frames. Offscreen targets have nothing to pump.
    pub fn pump(&mut self) {
        if let WindowTarget::Windowed(state) = self {
            let _ = state.event_loop.pump_events(Some(Duration::ZERO), |event, elwt| {
                if let Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } = &event
                {
                    elwt.exit();
                }
            });
        }
    }
}

/// Creates the GPU context and, when `visible`, the window and surface it
/// presents to. Driver selection is the instance descriptor here, not
/// process-wide environment state.
pub fn create_context(width: u32, height: u32, visible: bool) -> Result<(Arc<GpuContext>, WindowTarget)> {
    let runtime = tokio::runtime::Runtime::new()?;

    if !visible {
        let gpu = runtime.block_on(GpuContext::new_for_offscreen())?;
        return Ok((Arc::new(gpu), WindowTarget::Offscreen));
    }

    let event_loop = EventLoop::new().context("create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("depthview")
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false)
            .build(&event_loop)
            .context("create window")?,
    );

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let surface = instance.create_surface(window.clone())?;
    let adapter = runtime
        .block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            compatible_surface: Some(&surface),
            ..Default::default()
        }))
        .context("no suitable GPU adapter found")?;
    let config = surface
        .get_default_config(&adapter, width, height)
        .context("surface configuration not supported")?;

    let gpu = runtime.block_on(GpuContext::with_adapter(adapter))?;
    surface.configure(&gpu.device, &config);
    info!(width, height, "opened preview window");

    Ok((
        Arc::new(gpu),
        WindowTarget::Windowed(WindowState {
            event_loop,
            window,
            surface,
            config,
        }),
    ))
}
