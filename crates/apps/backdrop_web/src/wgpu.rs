#[cfg(target_arch = "wasm32")]
mod imp {
    use crate::assets::DecodedTexture;
    use ::wgpu::util::DeviceExt;
    use foundation::viewport::BackingStore;
    use gpu::{
        BackgroundUniforms, Blend, FULLSCREEN_QUAD, Filter, LineVertex, LoadAction, NodeInstance,
        PIPELINE, PassAction, PassKind, PassSet, PreparedFrame, ProjectionUniforms, QuadVertex,
        SamplerRole, ShaderError, Target, TargetSizes, Wrap, descriptor, line_vertices,
        node_instances, source_for, validate, validate_order,
    };
    use scene::{Backdrop, CloudTexture};
    use std::borrow::Cow;
    use wasm_bindgen::prelude::*;

    struct Layouts {
        background: ::wgpu::BindGroupLayout,
        composite: ::wgpu::BindGroupLayout,
        projection: ::wgpu::BindGroupLayout,
    }

    struct Samplers {
        cloud: ::wgpu::Sampler,
        blue_noise: ::wgpu::Sampler,
        upscale: ::wgpu::Sampler,
    }

    #[derive(Default)]
    struct Pipelines {
        background: Option<::wgpu::RenderPipeline>,
        composite: Option<::wgpu::RenderPipeline>,
        grid_lines: Option<::wgpu::RenderPipeline>,
        nodes: Option<::wgpu::RenderPipeline>,
    }

    impl Pipelines {
        fn get(&self, kind: PassKind) -> Option<&::wgpu::RenderPipeline> {
            match kind {
                PassKind::Background => self.background.as_ref(),
                PassKind::Composite => self.composite.as_ref(),
                PassKind::GridLines => self.grid_lines.as_ref(),
                PassKind::Nodes => self.nodes.as_ref(),
                PassKind::Stars => None,
            }
        }

        fn set(&mut self, kind: PassKind, pipeline: ::wgpu::RenderPipeline) {
            match kind {
                PassKind::Background => self.background = Some(pipeline),
                PassKind::Composite => self.composite = Some(pipeline),
                PassKind::GridLines => self.grid_lines = Some(pipeline),
                PassKind::Nodes => self.nodes = Some(pipeline),
                PassKind::Stars => {}
            }
        }
    }

    /// GPU half of the backdrop: sky, composite, grid lines and nodes.
    pub struct GpuBackdrop {
        _instance: &'static ::wgpu::Instance,
        surface: ::wgpu::Surface<'static>,
        device: ::wgpu::Device,
        queue: ::wgpu::Queue,
        config: ::wgpu::SurfaceConfiguration,
        _canvas: web_sys::HtmlCanvasElement,
        sizes: TargetSizes,
        layouts: Layouts,
        samplers: Samplers,
        pipelines: Pipelines,
        disabled: PassSet,
        shader_errors: Vec<ShaderError>,
        quad_buffer: ::wgpu::Buffer,
        line_buffer: Option<::wgpu::Buffer>,
        node_buffer: Option<::wgpu::Buffer>,
        geometry_generation: Option<u64>,
        background_uniforms: ::wgpu::Buffer,
        projection_uniforms: ::wgpu::Buffer,
        cloud_view: ::wgpu::TextureView,
        noise_view: ::wgpu::TextureView,
        offscreen_view: ::wgpu::TextureView,
        background_bind_group: ::wgpu::BindGroup,
        composite_bind_group: ::wgpu::BindGroup,
        projection_bind_group: ::wgpu::BindGroup,
    }

    fn uniform_entry(binding: u32) -> ::wgpu::BindGroupLayoutEntry {
        ::wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: ::wgpu::BindingType::Buffer {
                ty: ::wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn texture_entry(binding: u32) -> ::wgpu::BindGroupLayoutEntry {
        ::wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ::wgpu::ShaderStages::FRAGMENT,
            ty: ::wgpu::BindingType::Texture {
                sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: ::wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }
    }

    fn sampler_entry(binding: u32) -> ::wgpu::BindGroupLayoutEntry {
        ::wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ::wgpu::ShaderStages::FRAGMENT,
            ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
            count: None,
        }
    }

    fn create_layouts(device: &::wgpu::Device) -> Layouts {
        Layouts {
            background: device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("backdrop-background-bgl"),
                entries: &[
                    uniform_entry(0),
                    texture_entry(1),
                    sampler_entry(2),
                    texture_entry(3),
                    sampler_entry(4),
                ],
            }),
            composite: device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("backdrop-composite-bgl"),
                entries: &[
                    texture_entry(0),
                    sampler_entry(1),
                    texture_entry(2),
                    sampler_entry(3),
                ],
            }),
            projection: device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("backdrop-projection-bgl"),
                entries: &[uniform_entry(0)],
            }),
        }
    }

    fn create_sampler(device: &::wgpu::Device, role: SamplerRole) -> ::wgpu::Sampler {
        let filter = match role.filter() {
            Filter::Linear => ::wgpu::FilterMode::Linear,
            Filter::Nearest => ::wgpu::FilterMode::Nearest,
        };
        let address = match role.wrap() {
            Wrap::Repeat => ::wgpu::AddressMode::Repeat,
            Wrap::ClampToEdge => ::wgpu::AddressMode::ClampToEdge,
        };
        device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some(role.label()),
            address_mode_u: address,
            address_mode_v: address,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        })
    }

    fn upload_rgba(
        device: &::wgpu::Device,
        queue: &::wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> ::wgpu::TextureView {
        let size = ::wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Rgba8Unorm,
            usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            ::wgpu::TexelCopyTextureInfo {
                texture: &tex,
                mip_level: 0,
                origin: ::wgpu::Origin3d::ZERO,
                aspect: ::wgpu::TextureAspect::All,
            },
            pixels,
            ::wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    fn create_offscreen(
        device: &::wgpu::Device,
        format: ::wgpu::TextureFormat,
        size: BackingStore,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("backdrop-offscreen"),
            size: ::wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT
                | ::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    fn vertex_buffer<T: bytemuck::Pod>(
        device: &::wgpu::Device,
        label: &str,
        data: &[T],
    ) -> Option<::wgpu::Buffer> {
        if data.is_empty() {
            return None;
        }
        Some(device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: ::wgpu::BufferUsages::VERTEX,
        }))
    }

    fn uniform_buffer(device: &::wgpu::Device, label: &str, size: usize) -> ::wgpu::Buffer {
        device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some(label),
            size: size as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn background_bind_group(
        device: &::wgpu::Device,
        layouts: &Layouts,
        samplers: &Samplers,
        uniforms: &::wgpu::Buffer,
        cloud: &::wgpu::TextureView,
        noise: &::wgpu::TextureView,
    ) -> ::wgpu::BindGroup {
        device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("backdrop-background-bg"),
            layout: &layouts.background,
            entries: &[
                ::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                ::wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ::wgpu::BindingResource::TextureView(cloud),
                },
                ::wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ::wgpu::BindingResource::Sampler(&samplers.cloud),
                },
                ::wgpu::BindGroupEntry {
                    binding: 3,
                    resource: ::wgpu::BindingResource::TextureView(noise),
                },
                ::wgpu::BindGroupEntry {
                    binding: 4,
                    resource: ::wgpu::BindingResource::Sampler(&samplers.blue_noise),
                },
            ],
        })
    }

    fn composite_bind_group(
        device: &::wgpu::Device,
        layouts: &Layouts,
        samplers: &Samplers,
        offscreen: &::wgpu::TextureView,
        noise: &::wgpu::TextureView,
    ) -> ::wgpu::BindGroup {
        device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("backdrop-composite-bg"),
            layout: &layouts.composite,
            entries: &[
                ::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ::wgpu::BindingResource::TextureView(offscreen),
                },
                ::wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ::wgpu::BindingResource::Sampler(&samplers.upscale),
                },
                ::wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ::wgpu::BindingResource::TextureView(noise),
                },
                ::wgpu::BindGroupEntry {
                    binding: 3,
                    resource: ::wgpu::BindingResource::Sampler(&samplers.blue_noise),
                },
            ],
        })
    }

    fn vertex_layout(kind: PassKind) -> ::wgpu::VertexBufferLayout<'static> {
        match kind {
            PassKind::Background | PassKind::Composite => ::wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadVertex>() as ::wgpu::BufferAddress,
                step_mode: ::wgpu::VertexStepMode::Vertex,
                attributes: &[::wgpu::VertexAttribute {
                    format: ::wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            PassKind::GridLines => ::wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineVertex>() as ::wgpu::BufferAddress,
                step_mode: ::wgpu::VertexStepMode::Vertex,
                attributes: &[::wgpu::VertexAttribute {
                    format: ::wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            PassKind::Nodes | PassKind::Stars => ::wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<NodeInstance>() as ::wgpu::BufferAddress,
                step_mode: ::wgpu::VertexStepMode::Instance,
                attributes: &[::wgpu::VertexAttribute {
                    format: ::wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                }],
            },
        }
    }

    const ADDITIVE: ::wgpu::BlendState = ::wgpu::BlendState {
        color: ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::SrcAlpha,
            dst_factor: ::wgpu::BlendFactor::One,
            operation: ::wgpu::BlendOperation::Add,
        },
        alpha: ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::SrcAlpha,
            dst_factor: ::wgpu::BlendFactor::One,
            operation: ::wgpu::BlendOperation::Add,
        },
    };

    fn create_pipeline(
        device: &::wgpu::Device,
        kind: PassKind,
        source: String,
        bind_group_layout: &::wgpu::BindGroupLayout,
        format: ::wgpu::TextureFormat,
    ) -> ::wgpu::RenderPipeline {
        let desc = descriptor(kind);
        let module = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        });
        let layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &[bind_group_layout],
            immediate_size: 0,
        });
        let blend = match desc.blend {
            Blend::Replace => ::wgpu::BlendState::REPLACE,
            Blend::Additive => ADDITIVE,
        };
        let topology = match kind {
            PassKind::GridLines => ::wgpu::PrimitiveTopology::LineList,
            _ => ::wgpu::PrimitiveTopology::TriangleList,
        };

        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&layout),
            vertex: ::wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout(kind)],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn begin_pass<'e>(
        encoder: &'e mut ::wgpu::CommandEncoder,
        label: &str,
        view: &::wgpu::TextureView,
        load: ::wgpu::LoadOp<::wgpu::Color>,
    ) -> ::wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: ::wgpu::Operations {
                    load,
                    store: ::wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        })
    }

    impl GpuBackdrop {
        /// Acquires the GPU for `canvas`, uploads the cloud texture and builds
        /// every pipeline whose shader validates. Passes whose shader fails are
        /// disabled; their errors are kept for [`GpuBackdrop::take_shader_errors`].
        pub async fn init(
            canvas: web_sys::HtmlCanvasElement,
            sizes: TargetSizes,
            cloud: &CloudTexture,
        ) -> Result<Self, JsValue> {
            validate_order(&PIPELINE).map_err(|e| JsValue::from_str(&e.to_string()))?;

            // The surface must not outlive the instance; leak it for the page lifetime.
            let instance: &'static ::wgpu::Instance = Box::leak(Box::new(
                ::wgpu::Instance::new(&::wgpu::InstanceDescriptor {
                    backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                    ..Default::default()
                }),
            ));

            let surface = instance
                .create_surface(::wgpu::SurfaceTarget::Canvas(canvas.clone()))
                .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

            let adapter = instance
                .request_adapter(&::wgpu::RequestAdapterOptions {
                    power_preference: ::wgpu::PowerPreference::LowPower,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

            let (device, queue) = adapter
                .request_device(&::wgpu::DeviceDescriptor {
                    label: Some("backdrop-device"),
                    required_features: ::wgpu::Features::empty(),
                    required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                    ..Default::default()
                })
                .await
                .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

            // Colors are written as computed, so prefer a linear format.
            let caps = surface.get_capabilities(&adapter);
            let format = caps
                .formats
                .iter()
                .copied()
                .find(|f| !f.is_srgb())
                .or_else(|| caps.formats.first().copied())
                .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
            let alpha_mode = caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

            let config = ::wgpu::SurfaceConfiguration {
                usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: sizes.surface.width.max(1),
                height: sizes.surface.height.max(1),
                desired_maximum_frame_latency: 2,
                present_mode: ::wgpu::PresentMode::Fifo,
                alpha_mode,
                view_formats: vec![],
            };
            surface.configure(&device, &config);

            let layouts = create_layouts(&device);
            let samplers = Samplers {
                cloud: create_sampler(&device, SamplerRole::Cloud),
                blue_noise: create_sampler(&device, SamplerRole::BlueNoise),
                upscale: create_sampler(&device, SamplerRole::Upscale),
            };

            let mut pipelines = Pipelines::default();
            let mut disabled = PassSet::default();
            let mut shader_errors = Vec::new();
            for kind in PassKind::ALL {
                let Some(source) = source_for(kind) else {
                    continue;
                };
                if let Err(err) = validate(descriptor(kind).label, &source) {
                    disabled.insert(kind);
                    shader_errors.push(err);
                    continue;
                }
                let bgl = match kind {
                    PassKind::Background => &layouts.background,
                    PassKind::Composite => &layouts.composite,
                    _ => &layouts.projection,
                };
                // Device-side rejections disable the pass like shader errors.
                let scope = device.push_error_scope(::wgpu::ErrorFilter::Validation);
                let pipeline = create_pipeline(&device, kind, source, bgl, format);
                if let Some(err) = scope.pop().await {
                    disabled.insert(kind);
                    shader_errors.push(ShaderError::Pipeline {
                        label: descriptor(kind).label.to_string(),
                        message: err.to_string(),
                    });
                    continue;
                }
                pipelines.set(kind, pipeline);
            }

            let quad_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("backdrop-quad"),
                contents: bytemuck::cast_slice(&FULLSCREEN_QUAD),
                usage: ::wgpu::BufferUsages::VERTEX,
            });

            let background_uniforms = uniform_buffer(
                &device,
                "backdrop-background-uniforms",
                std::mem::size_of::<BackgroundUniforms>(),
            );
            let projection_uniforms = uniform_buffer(
                &device,
                "backdrop-projection-uniforms",
                std::mem::size_of::<ProjectionUniforms>(),
            );

            let cloud_view = upload_rgba(
                &device,
                &queue,
                "backdrop-cloud",
                cloud.size,
                cloud.size,
                &cloud.pixels,
            );
            let placeholder = DecodedTexture::placeholder();
            let noise_view = upload_rgba(
                &device,
                &queue,
                "backdrop-blue-noise",
                placeholder.width,
                placeholder.height,
                &placeholder.pixels,
            );
            let offscreen_view = create_offscreen(&device, format, sizes.offscreen);

            let background_bind_group = background_bind_group(
                &device,
                &layouts,
                &samplers,
                &background_uniforms,
                &cloud_view,
                &noise_view,
            );
            let composite_bind_group =
                composite_bind_group(&device, &layouts, &samplers, &offscreen_view, &noise_view);
            let projection_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("backdrop-projection-bg"),
                layout: &layouts.projection,
                entries: &[::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: projection_uniforms.as_entire_binding(),
                }],
            });

            Ok(Self {
                _instance: instance,
                surface,
                device,
                queue,
                config,
                _canvas: canvas,
                sizes,
                layouts,
                samplers,
                pipelines,
                disabled,
                shader_errors,
                quad_buffer,
                line_buffer: None,
                node_buffer: None,
                geometry_generation: None,
                background_uniforms,
                projection_uniforms,
                cloud_view,
                noise_view,
                offscreen_view,
                background_bind_group,
                composite_bind_group,
                projection_bind_group,
            })
        }

        pub fn disabled(&self) -> PassSet {
            self.disabled
        }

        pub fn take_shader_errors(&mut self) -> Vec<ShaderError> {
            std::mem::take(&mut self.shader_errors)
        }

        /// Reconfigures the surface and recreates the offscreen target.
        pub fn resize(&mut self, sizes: TargetSizes) {
            self.config.width = sizes.surface.width.max(1);
            self.config.height = sizes.surface.height.max(1);
            self.surface.configure(&self.device, &self.config);
            self.offscreen_view = create_offscreen(&self.device, self.config.format, sizes.offscreen);
            self.composite_bind_group = composite_bind_group(
                &self.device,
                &self.layouts,
                &self.samplers,
                &self.offscreen_view,
                &self.noise_view,
            );
            self.sizes = sizes;
        }

        /// Re-uploads grid buffers when the backdrop was rebuilt.
        pub fn sync_geometry(&mut self, backdrop: &Backdrop) {
            if self.geometry_generation == Some(backdrop.generation()) {
                return;
            }
            let geometry = backdrop.geometry();
            self.line_buffer = vertex_buffer(
                &self.device,
                "backdrop-grid-lines",
                &line_vertices(&geometry.lines),
            );
            self.node_buffer = vertex_buffer(
                &self.device,
                "backdrop-nodes",
                &node_instances(&geometry.nodes),
            );
            self.geometry_generation = Some(backdrop.generation());
        }

        pub fn set_blue_noise(&mut self, texture: &DecodedTexture) {
            self.noise_view = upload_rgba(
                &self.device,
                &self.queue,
                "backdrop-blue-noise",
                texture.width,
                texture.height,
                &texture.pixels,
            );
            self.background_bind_group = background_bind_group(
                &self.device,
                &self.layouts,
                &self.samplers,
                &self.background_uniforms,
                &self.cloud_view,
                &self.noise_view,
            );
            self.composite_bind_group = composite_bind_group(
                &self.device,
                &self.layouts,
                &self.samplers,
                &self.offscreen_view,
                &self.noise_view,
            );
        }

        fn draw(&self, pass: &mut ::wgpu::RenderPass<'_>, kind: PassKind, frame: &PreparedFrame) {
            match kind {
                PassKind::Background => {
                    pass.set_bind_group(0, &self.background_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                    pass.draw(0..FULLSCREEN_QUAD.len() as u32, 0..1);
                }
                PassKind::Composite => {
                    pass.set_bind_group(0, &self.composite_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                    pass.draw(0..FULLSCREEN_QUAD.len() as u32, 0..1);
                }
                PassKind::GridLines => {
                    if let Some(lines) = &self.line_buffer {
                        pass.set_bind_group(0, &self.projection_bind_group, &[]);
                        pass.set_vertex_buffer(0, lines.slice(..));
                        pass.draw(0..frame.line_vertex_count, 0..1);
                    }
                }
                PassKind::Nodes => {
                    if let Some(nodes) = &self.node_buffer {
                        pass.set_bind_group(0, &self.projection_bind_group, &[]);
                        pass.set_vertex_buffer(0, nodes.slice(..));
                        pass.draw(0..frame.node_vertex_count, 0..frame.node_instance_count);
                    }
                }
                PassKind::Stars => {}
            }
        }

        /// Encodes the GPU passes of `frame` in plan order and presents.
        pub fn render(&mut self, frame: &PreparedFrame) -> Result<(), JsValue> {
            if self.sizes != frame.sizes {
                self.resize(frame.sizes);
            }

            self.queue.write_buffer(
                &self.background_uniforms,
                0,
                bytemuck::bytes_of(&frame.background),
            );
            self.queue.write_buffer(
                &self.projection_uniforms,
                0,
                bytemuck::bytes_of(&frame.projection),
            );

            let output = self.surface.get_current_texture().map_err(|e| {
                self.surface.configure(&self.device, &self.config);
                JsValue::from_str(&format!("surface acquire failed: {e}"))
            })?;
            let view = output
                .texture
                .create_view(&::wgpu::TextureViewDescriptor::default());

            let [r, g, b, a] = frame.clear_color;
            let clear = ::wgpu::Color { r, g, b, a };

            let mut encoder = self
                .device
                .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                    label: Some("backdrop-encoder"),
                });

            for planned in frame.plan.gpu_passes() {
                let target = match planned.descriptor.target {
                    Target::Offscreen => &self.offscreen_view,
                    Target::Surface | Target::Canvas2d => &view,
                };
                let load = match planned.load {
                    LoadAction::Clear => ::wgpu::LoadOp::Clear(clear),
                    LoadAction::Load => ::wgpu::LoadOp::Load,
                };
                match planned.action {
                    PassAction::Skip(_) => {}
                    PassAction::ClearFallback => {
                        let _pass = begin_pass(
                            &mut encoder,
                            planned.descriptor.label,
                            target,
                            ::wgpu::LoadOp::Clear(clear),
                        );
                    }
                    PassAction::Run => {
                        let Some(pipeline) = self.pipelines.get(planned.kind()) else {
                            continue;
                        };
                        let mut pass =
                            begin_pass(&mut encoder, planned.descriptor.label, target, load);
                        pass.set_pipeline(pipeline);
                        self.draw(&mut pass, planned.kind(), frame);
                    }
                }
            }

            if frame.plan.bare_clear {
                let _pass = begin_pass(
                    &mut encoder,
                    "backdrop-clear",
                    &view,
                    ::wgpu::LoadOp::Clear(clear),
                );
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            output.present();
            Ok(())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use crate::assets::DecodedTexture;
    use gpu::{PassSet, PreparedFrame, ShaderError, TargetSizes};
    use scene::{Backdrop, CloudTexture};
    use wasm_bindgen::prelude::JsValue;

    #[derive(Debug, Default)]
    pub struct GpuBackdrop;

    impl GpuBackdrop {
        pub async fn init(
            _canvas: web_sys::HtmlCanvasElement,
            _sizes: TargetSizes,
            _cloud: &CloudTexture,
        ) -> Result<Self, JsValue> {
            Err(JsValue::from_str(
                "wgpu initialization is only available on wasm32 targets",
            ))
        }

        pub fn disabled(&self) -> PassSet {
            PassSet::default()
        }

        pub fn take_shader_errors(&mut self) -> Vec<ShaderError> {
            Vec::new()
        }

        pub fn resize(&mut self, _sizes: TargetSizes) {}

        pub fn sync_geometry(&mut self, _backdrop: &Backdrop) {}

        pub fn set_blue_noise(&mut self, _texture: &DecodedTexture) {}

        pub fn render(&mut self, _frame: &PreparedFrame) -> Result<(), JsValue> {
            Err(JsValue::from_str(
                "wgpu rendering is only available on wasm32 targets",
            ))
        }
    }
}

pub use imp::GpuBackdrop;
